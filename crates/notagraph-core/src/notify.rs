//! Synchronous change notification
//!
//! Records are delivered in emission order to every subscriber, in
//! subscription order, inside the publishing call. Listeners only ever see
//! `&ChangeRecord`; they hold no handle to the model and so cannot mutate it
//! while a publish is in progress.

use std::fmt;
use std::sync::Arc;

use crate::model::ChangeRecord;

/// Observer of model changes
pub trait ChangeListener: Send + Sync {
    fn on_change(&self, record: &ChangeRecord);
}

impl<F> ChangeListener for F
where
    F: Fn(&ChangeRecord) + Send + Sync,
{
    fn on_change(&self, record: &ChangeRecord) {
        self(record)
    }
}

/// Handle returned by [`ChangeNotifier::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct ChangeNotifier {
    listeners: Vec<(SubscriptionId, Arc<dyn ChangeListener>)>,
    next_id: u64,
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl ChangeListener + 'static) -> SubscriptionId {
        self.subscribe_shared(Arc::new(listener))
    }

    /// Subscribe a listener that is also held elsewhere
    pub fn subscribe_shared(&mut self, listener: Arc<dyn ChangeListener>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Returns false when the subscription was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    pub fn publish(&self, records: &[ChangeRecord]) {
        if records.is_empty() {
            return;
        }
        tracing::trace!(
            records = records.len(),
            listeners = self.listeners.len(),
            "publishing changes"
        );
        for record in records {
            for (_, listener) in &self.listeners {
                listener.on_change(record);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
