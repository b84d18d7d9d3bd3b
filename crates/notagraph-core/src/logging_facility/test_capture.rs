//! In-memory event capture for diagnostic assertions
//!
//! Installed as the global subscriber by [`init_test_capture`]. Every event
//! is stored together with the fields of the spans it was emitted in, so a
//! test can check both what was logged and under which dispatch (the
//! `dispatch` span carries `request_id` and `action_kind`).

use crate::core_types::schema::{FIELD_COMPONENT, FIELD_EVENT, FIELD_MESSAGE, FIELD_OP};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// One captured log event
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub target: String,
    pub component: Option<String>,
    pub op: Option<String>,
    pub event: Option<String>,
    pub message: Option<String>,
    pub fields: HashMap<String, String>,
    /// Names of the enclosing spans, outermost first
    pub spans: Vec<String>,
    /// Fields of the enclosing spans; inner spans shadow outer ones
    pub span_fields: HashMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Field of the event or, failing that, of an enclosing span
    pub fn context_field(&self, name: &str) -> Option<&str> {
        self.field(name)
            .or_else(|| self.span_fields.get(name).map(String::as_str))
    }

    pub fn in_span(&self, name: &str) -> bool {
        self.spans.iter().any(|s| s == name)
    }
}

#[derive(Default)]
struct FieldMap(HashMap<String, String>);

impl Visit for FieldMap {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{:?}", value));
    }
}

/// Span extension holding the span's recorded fields
struct SpanFields(HashMap<String, String>);

struct CaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut fields = FieldMap::default();
        attrs.record(&mut fields);
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanFields(fields.0));
        }
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let mut fields = FieldMap::default();
        values.record(&mut fields);
        if let Some(span) = ctx.span(id) {
            if let Some(existing) = span.extensions_mut().get_mut::<SpanFields>() {
                existing.0.extend(fields.0);
            }
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut fields = FieldMap::default();
        event.record(&mut fields);
        let fields = fields.0;

        let mut spans = Vec::new();
        let mut span_fields = HashMap::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                spans.push(span.name().to_string());
                if let Some(recorded) = span.extensions().get::<SpanFields>() {
                    span_fields.extend(recorded.0.clone());
                }
            }
        }

        let metadata = event.metadata();
        let captured = CapturedEvent {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            component: fields.get(FIELD_COMPONENT).cloned(),
            op: fields.get(FIELD_OP).cloned(),
            event: fields.get(FIELD_EVENT).cloned(),
            message: fields.get(FIELD_MESSAGE).cloned(),
            fields,
            spans,
            span_fields,
        };
        if let Ok(mut events) = self.events.lock() {
            events.push(captured);
        }
    }
}

/// Shared handle on the captured events
#[derive(Clone)]
pub struct TestCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl TestCapture {
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn find<F>(&self, predicate: F) -> Option<CapturedEvent>
    where
        F: Fn(&CapturedEvent) -> bool,
    {
        self.events().into_iter().find(|e| predicate(e))
    }

    pub fn count_events<F>(&self, predicate: F) -> usize
    where
        F: Fn(&CapturedEvent) -> bool,
    {
        self.events().iter().filter(|e| predicate(e)).count()
    }

    /// # Panics
    ///
    /// Panics if no event with this `op` and `event` field was captured.
    pub fn assert_event_exists(&self, op: &str, event: &str) {
        let found = self.count_events(|e| {
            e.op.as_deref() == Some(op) && e.event.as_deref() == Some(event)
        });
        assert!(
            found > 0,
            "no captured event with op={} event={} ({} events captured)",
            op,
            event,
            self.events().len()
        );
    }

    pub fn contains_message(&self, needle: &str) -> bool {
        self.events()
            .iter()
            .any(|e| e.message.as_deref().is_some_and(|m| m.contains(needle)))
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

static GLOBAL_CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install the capture layer globally (once) and return its handle
///
/// Tests in one binary share the buffer, so assertions should key on
/// unique op names or element ids.
///
/// # Example
///
/// ```
/// use notagraph_core::logging_facility::test_capture::init_test_capture;
/// use notagraph_core::log_op_start;
///
/// let capture = init_test_capture();
/// log_op_start!("doc_example_op");
/// capture.assert_event_exists("doc_example_op", "start");
/// ```
pub fn init_test_capture() -> TestCapture {
    GLOBAL_CAPTURE
        .get_or_init(|| {
            let events = Arc::new(Mutex::new(Vec::new()));
            let layer = CaptureLayer {
                events: Arc::clone(&events),
            };
            tracing_subscriber::registry().with(layer).try_init().ok();
            TestCapture { events }
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_carry_enclosing_span_fields() {
        let capture = init_test_capture();

        let span = tracing::info_span!("dispatch", request_id = "req-capture-1");
        {
            let _guard = span.enter();
            tracing::info!(op = "capture_span_fields", "inside dispatch");
        }

        let event = capture
            .find(|e| e.op.as_deref() == Some("capture_span_fields"))
            .expect("event should be captured");
        assert!(event.in_span("dispatch"));
        assert_eq!(event.context_field("request_id"), Some("req-capture-1"));
        assert_eq!(event.message.as_deref(), Some("inside dispatch"));
    }

    #[test]
    fn test_event_fields_shadow_span_fields() {
        let capture = init_test_capture();

        let span = tracing::info_span!("outer", element_id = "from-span");
        let _guard = span.enter();
        tracing::debug!(op = "capture_shadow_fields", element_id = "from-event");

        let event = capture
            .find(|e| e.op.as_deref() == Some("capture_shadow_fields"))
            .expect("event should be captured");
        assert_eq!(event.context_field("element_id"), Some("from-event"));
        assert_eq!(
            event.span_fields.get("element_id").map(String::as_str),
            Some("from-span")
        );
    }
}
