//! Singular model state of one editing session
//!
//! [`ModelStateManager`] owns the model together with its history, change
//! notifier, collaborators and saved marker. All mutation goes through it,
//! so holding `&mut ModelStateManager` is the mutation lock.
//!
//! ## Saved marker
//!
//! The saved marker is the history revision whose model was last written.
//! `dirty()` is true whenever the current revision differs from it. Two
//! things make the saved state unreachable, after which the marker becomes
//! `None` until the next successful save:
//!
//! - executing a command after undo when the saved revision lay in the
//!   discarded redo branch
//! - evicting the saved revision through the history limit

use notagraph_core::errors::{ExError, ExErrorKind, NotationError};
use notagraph_core::history::{CommandStack, Edit};
use notagraph_core::model::{ChangeRecord, NotationModel};
use notagraph_core::notify::{ChangeListener, ChangeNotifier, SubscriptionId};
use notagraph_core::persistence::ModelPersistence;
use notagraph_core::render::{GraphRenderer, RenderGraph, RenderSnapshotFactory};
use notagraph_core::snapshot::ModelSnapshot;
use notagraph_core::{log_op_end, log_op_error, log_op_start};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use crate::errors::Result;

/// Save captured under the mutation lock, ready to be written elsewhere
pub struct PendingSave {
    snapshot: ModelSnapshot,
    revision: usize,
    truncations_seen: usize,
    persistence: Arc<dyn ModelPersistence>,
}

impl fmt::Debug for PendingSave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSave")
            .field("revision", &self.revision)
            .field("elements", &self.snapshot.elements.len())
            .finish()
    }
}

impl PendingSave {
    pub fn revision(&self) -> usize {
        self.revision
    }

    pub fn snapshot(&self) -> &ModelSnapshot {
        &self.snapshot
    }

    /// Redo-branch discards that happened before the capture
    pub fn truncations_seen(&self) -> usize {
        self.truncations_seen
    }

    /// Write the captured snapshot through the persistence collaborator
    ///
    /// Does not touch the model, so it may run on a blocking thread while
    /// edits continue.
    pub fn write(self) -> SaveOutcome {
        let result = self.persistence.save(&self.snapshot);
        SaveOutcome {
            revision: self.revision,
            truncations_seen: self.truncations_seen,
            result,
        }
    }
}

/// Result of a [`PendingSave::write`], applied with
/// [`ModelStateManager::complete_save`]
#[derive(Debug)]
pub struct SaveOutcome {
    revision: usize,
    truncations_seen: usize,
    result: std::result::Result<(), ExError>,
}

impl SaveOutcome {
    pub fn revision(&self) -> usize {
        self.revision
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct ModelStateManager {
    model: NotationModel,
    stack: CommandStack,
    notifier: ChangeNotifier,
    persistence: Arc<dyn ModelPersistence>,
    renderer: Arc<dyn RenderSnapshotFactory>,
    saved_revision: Option<usize>,
    pending_save: Option<PendingSave>,
    /// Revision floors of redo-branch discards an outstanding save may
    /// still have to check, oldest first
    truncations: VecDeque<usize>,
    /// Discards trimmed off the front of `truncations`
    truncation_base: usize,
    /// `truncations_seen` of every begun save not yet settled, with counts
    outstanding_saves: BTreeMap<usize, usize>,
}

impl fmt::Debug for ModelStateManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelStateManager")
            .field("elements", &self.model.element_count())
            .field("stack", &self.stack)
            .field("saved_revision", &self.saved_revision)
            .field("pending_save", &self.pending_save)
            .finish()
    }
}

impl ModelStateManager {
    /// Manage `model`, treating it as the stored state (clean)
    pub fn new(model: NotationModel, persistence: Arc<dyn ModelPersistence>) -> Self {
        Self {
            model,
            stack: CommandStack::new(),
            notifier: ChangeNotifier::new(),
            persistence,
            renderer: Arc::new(GraphRenderer::new()),
            saved_revision: Some(0),
            pending_save: None,
            truncations: VecDeque::new(),
            truncation_base: 0,
            outstanding_saves: BTreeMap::new(),
        }
    }

    /// Load the stored model, or start an empty diagram if nothing is stored
    ///
    /// # Errors
    ///
    /// Returns the collaborator's load error (other than `NotFound`), or
    /// the snapshot validation error converted to `ExError`.
    pub fn open(persistence: Arc<dyn ModelPersistence>) -> Result<Self> {
        let model = match persistence.load() {
            Ok(snapshot) => NotationModel::from_snapshot(&snapshot)?,
            Err(err) if err.kind() == ExErrorKind::NotFound => {
                tracing::debug!("no stored model, starting empty diagram");
                NotationModel::new()
            }
            Err(err) => return Err(err),
        };
        Ok(Self::new(model, persistence))
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn RenderSnapshotFactory>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Bound the undo history; replaces the (expected empty) stack
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.stack = CommandStack::with_limit(limit);
        self
    }

    pub fn model(&self) -> &NotationModel {
        &self.model
    }

    pub fn stack(&self) -> &CommandStack {
        &self.stack
    }

    pub fn subscribe(&mut self, listener: impl ChangeListener + 'static) -> SubscriptionId {
        self.notifier.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    pub fn revision(&self) -> usize {
        self.stack.revision()
    }

    pub fn saved_revision(&self) -> Option<usize> {
        self.saved_revision
    }

    pub fn dirty(&self) -> bool {
        self.saved_revision != Some(self.stack.revision())
    }

    /// Execute an edit as a new undoable command and publish its records
    ///
    /// # Errors
    ///
    /// Returns the model error; model, history and saved marker are then
    /// unchanged and nothing is published.
    pub fn execute(&mut self, edit: Edit) -> Result<Vec<ChangeRecord>> {
        let before = self.stack.revision();
        let discards_redo = self.stack.can_redo();

        let records = self.stack.execute_edit(edit, &mut self.model)?;

        if discards_redo {
            self.truncations.push_back(before);
            self.trim_truncations();
            if self.saved_revision.is_some_and(|saved| saved > before) {
                tracing::debug!(
                    saved_revision = ?self.saved_revision,
                    "saved state discarded with redo history"
                );
                self.saved_revision = None;
            }
        }
        self.forget_evicted_save();
        self.notifier.publish(&records);
        Ok(records)
    }

    /// Undo the last command; false when there was nothing to undo or the
    /// command could not be inverted
    pub fn undo(&mut self) -> bool {
        match self.stack.undo(&mut self.model) {
            Ok(records) => {
                self.notifier.publish(&records);
                true
            }
            Err(err) => {
                report_history_error("undo", err);
                false
            }
        }
    }

    /// Redo the next command; false when there was nothing to redo or the
    /// command could not be replayed
    pub fn redo(&mut self) -> bool {
        match self.stack.redo(&mut self.model) {
            Ok(records) => {
                self.notifier.publish(&records);
                true
            }
            Err(err) => {
                report_history_error("redo", err);
                false
            }
        }
    }

    /// Capture the current model and revision for writing
    ///
    /// The save stays outstanding until [`Self::complete_save`] or
    /// [`Self::abandon_save`] settles it.
    pub fn begin_save(&mut self) -> PendingSave {
        let seen = self.truncation_count();
        *self.outstanding_saves.entry(seen).or_default() += 1;
        PendingSave {
            snapshot: self.model.snapshot(),
            revision: self.stack.revision(),
            truncations_seen: seen,
            persistence: Arc::clone(&self.persistence),
        }
    }

    /// Forget a begun save whose outcome will never arrive
    pub fn abandon_save(&mut self, truncations_seen: usize) {
        self.settle_save(truncations_seen);
        self.trim_truncations();
    }

    /// Redo-branch discards still kept for outstanding saves
    pub fn retained_truncations(&self) -> usize {
        self.truncations.len()
    }

    /// Apply the outcome of a write started with [`Self::begin_save`]
    ///
    /// On success the saved marker moves to the captured revision, unless
    /// the history since the capture made that state unreachable.
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error wrapping the collaborator's error; the
    /// saved marker is unchanged.
    pub fn complete_save(&mut self, outcome: SaveOutcome) -> Result<()> {
        self.settle_save(outcome.truncations_seen);
        let result = self.apply_save_outcome(outcome);
        self.trim_truncations();
        result
    }

    fn apply_save_outcome(&mut self, outcome: SaveOutcome) -> Result<()> {
        match outcome.result {
            Ok(()) => {
                let overwritten = self
                    .truncations
                    .iter()
                    .skip(outcome.truncations_seen.saturating_sub(self.truncation_base))
                    .any(|floor| *floor < outcome.revision);
                self.saved_revision = if overwritten {
                    None
                } else {
                    Some(outcome.revision)
                };
                self.forget_evicted_save();
                tracing::debug!(
                    revision = outcome.revision,
                    saved_revision = ?self.saved_revision,
                    dirty = self.dirty(),
                    "save completed"
                );
                Ok(())
            }
            Err(source) => Err(ExError::new(ExErrorKind::Persistence)
                .with_op("save_model")
                .with_message(format!(
                    "failed to save revision {}: {}",
                    outcome.revision,
                    source.message()
                ))
                .with_source(source)),
        }
    }

    /// Save synchronously
    ///
    /// # Errors
    ///
    /// See [`Self::complete_save`].
    pub fn save(&mut self) -> Result<()> {
        log_op_start!("save_model", revision = self.stack.revision());
        let start = std::time::Instant::now();

        let outcome = self.begin_save().write();
        self.complete_save(outcome).map_err(|e| {
            log_op_error!(
                "save_model",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "save_model",
            duration_ms = start.elapsed().as_millis() as u64
        );
        Ok(())
    }

    /// Queue a save for the session loop; a newer request replaces a
    /// queued one
    pub fn request_save(&mut self) {
        let pending = self.begin_save();
        if let Some(replaced) = self.pending_save.replace(pending) {
            tracing::debug!("replacing queued save");
            self.abandon_save(replaced.truncations_seen);
        }
    }

    pub fn take_pending_save(&mut self) -> Option<PendingSave> {
        self.pending_save.take()
    }

    pub fn has_pending_save(&self) -> bool {
        self.pending_save.is_some()
    }

    /// Render snapshot of the current model
    pub fn render(&self) -> RenderGraph {
        self.renderer.create(&self.model, self.dirty())
    }

    fn truncation_count(&self) -> usize {
        self.truncation_base + self.truncations.len()
    }

    fn settle_save(&mut self, truncations_seen: usize) {
        if let Some(count) = self.outstanding_saves.get_mut(&truncations_seen) {
            *count -= 1;
            if *count == 0 {
                self.outstanding_saves.remove(&truncations_seen);
            }
        }
    }

    /// Drop floors no outstanding save can look at any more
    fn trim_truncations(&mut self) {
        let keep_from = self
            .outstanding_saves
            .keys()
            .next()
            .copied()
            .unwrap_or_else(|| self.truncation_count());
        while self.truncation_base < keep_from && self.truncations.pop_front().is_some() {
            self.truncation_base += 1;
        }
    }

    fn forget_evicted_save(&mut self) {
        if self
            .saved_revision
            .is_some_and(|saved| saved < self.stack.oldest_revision())
        {
            tracing::debug!("saved state evicted from history");
            self.saved_revision = None;
        }
    }
}

fn report_history_error(op: &str, err: NotationError) {
    match err {
        NotationError::NothingToUndo | NotationError::NothingToRedo => {
            tracing::debug!(op, "{}", err);
        }
        other => {
            let ex: ExError = other.into();
            tracing::warn!(
                op,
                err_kind = ?ex.kind(),
                err_code = ex.code(),
                "{}",
                ex.message()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notagraph_core::model::{keys, ElementId, FeatureValue, Point};
    use notagraph_store::MemoryStore;
    use std::sync::Mutex;

    fn manager() -> (ModelStateManager, Arc<MemoryStore>, ElementId) {
        let mut model = NotationModel::new();
        let root = model.root().clone();
        let (shape, _) = model.create_shape(&root, (0.0, 0.0), (10.0, 10.0)).unwrap();
        let store = Arc::new(MemoryStore::new());
        (ModelStateManager::new(model, store.clone()), store, shape)
    }

    fn rename(shape: &ElementId, name: &str) -> Edit {
        Edit::SetFeature {
            element: shape.clone(),
            feature: keys::NAME.into(),
            value: Some(FeatureValue::from(name)),
        }
    }

    #[test]
    fn test_fresh_manager_is_clean() {
        let (mut state, _, _) = manager();
        assert!(!state.dirty());
        assert!(!state.undo());
        assert!(!state.redo());
        assert!(!state.dirty());
    }

    #[test]
    fn test_execute_publishes_after_mutation() {
        let (mut state, _, shape) = manager();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        state.subscribe(move |r: &ChangeRecord| sink.lock().unwrap().push(r.clone()));

        let records = state
            .execute(Edit::MoveTo {
                element: shape.clone(),
                position: Point::new(3.0, 4.0),
            })
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), records);
        assert!(state.dirty());
    }

    #[test]
    fn test_failed_execute_publishes_nothing() {
        let (mut state, _, _) = manager();
        let seen = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&seen);
        state.subscribe(move |_: &ChangeRecord| *sink.lock().unwrap() += 1);

        let root = state.model().root().clone();
        let err = state
            .execute(Edit::RemoveElement { element: root })
            .unwrap_err();

        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
        assert_eq!(*seen.lock().unwrap(), 0);
        assert!(!state.dirty());
    }

    #[test]
    fn test_saved_state_in_discarded_branch_is_unreachable() {
        let (mut state, _, shape) = manager();
        state.execute(rename(&shape, "A")).unwrap();
        state.execute(rename(&shape, "B")).unwrap();
        state.save().unwrap();
        assert_eq!(state.saved_revision(), Some(2));

        state.undo();
        state.execute(rename(&shape, "C")).unwrap();

        assert_eq!(state.saved_revision(), None);
        assert!(state.dirty());
    }

    #[test]
    fn test_saved_state_below_branch_point_survives() {
        let (mut state, _, shape) = manager();
        state.execute(rename(&shape, "A")).unwrap();
        state.save().unwrap();
        state.execute(rename(&shape, "B")).unwrap();
        state.undo();
        state.execute(rename(&shape, "C")).unwrap();

        assert_eq!(state.saved_revision(), Some(1));
        state.undo();
        assert!(!state.dirty());
    }

    #[test]
    fn test_save_overtaken_by_branch_is_not_marked() {
        let (mut state, _, shape) = manager();
        state.execute(rename(&shape, "A")).unwrap();
        let pending = state.begin_save();

        state.undo();
        state.execute(rename(&shape, "B")).unwrap();

        state.complete_save(pending.write()).unwrap();
        assert_eq!(state.saved_revision(), None);
        assert!(state.dirty());
    }

    #[test]
    fn test_branch_floors_are_trimmed_once_saves_settle() {
        let (mut state, _, shape) = manager();
        for name in ["A", "B", "C"] {
            state.execute(rename(&shape, name)).unwrap();
            state.undo();
        }
        assert_eq!(state.retained_truncations(), 0);

        state.execute(rename(&shape, "D")).unwrap();
        let pending = state.begin_save();
        for name in ["E", "F"] {
            state.undo();
            state.execute(rename(&shape, name)).unwrap();
        }
        assert_eq!(state.retained_truncations(), 2);

        state.complete_save(pending.write()).unwrap();
        assert_eq!(state.saved_revision(), None);
        assert_eq!(state.retained_truncations(), 0);
    }

    #[test]
    fn test_replaced_and_abandoned_saves_release_floors() {
        let (mut state, _, shape) = manager();
        state.execute(rename(&shape, "A")).unwrap();
        state.request_save();
        state.undo();
        state.execute(rename(&shape, "B")).unwrap();
        state.request_save();
        assert_eq!(state.retained_truncations(), 0);

        let pending = state.take_pending_save().unwrap();
        state.undo();
        state.execute(rename(&shape, "C")).unwrap();
        assert_eq!(state.retained_truncations(), 1);

        state.abandon_save(pending.truncations_seen());
        assert_eq!(state.retained_truncations(), 0);
    }

    #[test]
    fn test_failed_save_keeps_marker() {
        let (mut state, store, shape) = manager();
        state.execute(rename(&shape, "A")).unwrap();
        store.set_failing(true);

        let err = state.save().unwrap_err();

        assert_eq!(err.kind(), ExErrorKind::Persistence);
        assert_eq!(
            err.source_error().map(|e| e.kind()),
            Some(ExErrorKind::Persistence)
        );
        assert_eq!(state.saved_revision(), Some(0));
        assert!(state.dirty());
    }

    #[test]
    fn test_history_limit_evicts_saved_state() {
        let (state, _, shape) = manager();
        let mut state = state.with_history_limit(1);
        state.execute(rename(&shape, "A")).unwrap();
        assert_eq!(state.saved_revision(), Some(0));
        state.execute(rename(&shape, "B")).unwrap();

        assert_eq!(state.saved_revision(), None);
        state.undo();
        assert!(state.dirty());
    }

    #[test]
    fn test_request_save_replaces_queued() {
        let (mut state, _, shape) = manager();
        state.request_save();
        state.execute(rename(&shape, "A")).unwrap();
        state.request_save();

        let pending = state.take_pending_save().unwrap();
        assert_eq!(pending.revision(), 1);
        assert!(state.take_pending_save().is_none());
    }

    #[test]
    fn test_open_empty_store_starts_new_diagram() {
        let state = ModelStateManager::open(Arc::new(MemoryStore::new())).unwrap();
        assert_eq!(state.model().element_count(), 1);
        assert!(!state.dirty());
    }

    #[test]
    fn test_open_loads_stored_model() {
        let (state, _, shape) = manager();
        let store = Arc::new(MemoryStore::seeded(state.model().snapshot()));
        let reopened = ModelStateManager::open(store).unwrap();
        assert_eq!(reopened.model().size_of(&shape), state.model().size_of(&shape));
    }

    #[test]
    fn test_render_carries_dirty_flag() {
        let (mut state, _, shape) = manager();
        assert!(!state.render().dirty);
        state.execute(rename(&shape, "A")).unwrap();
        let graph = state.render();
        assert!(graph.dirty);
        assert!(graph.find(&shape).is_some());
    }
}
