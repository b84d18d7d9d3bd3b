//! Field keys and event names of the structured log schema
//!
//! `log_op_*!` events carry `component`, `op` and `event`. Events emitted
//! while an action is dispatched additionally sit inside a `dispatch` span
//! carrying the correlation fields.

pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
/// Key tracing uses for the formatted message
pub const FIELD_MESSAGE: &str = "message";

pub const SPAN_DISPATCH: &str = "dispatch";
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_SESSION_ID: &str = "session_id";
pub const FIELD_ACTION_KIND: &str = "action_kind";

pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
