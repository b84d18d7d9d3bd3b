//! Operation logging macros
//!
//! Every operation that can fail logs a `start` event and exactly one of
//! `end` or `end_error`, all keyed by `op`. Extra fields pass through in
//! `tracing` field syntax.

#[doc(hidden)]
#[macro_export]
macro_rules! __log_op {
    ($level:ident, $op:expr, $event:ident $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::$event,
            $($($field)*)?
        )
    };
}

/// Log the start of an operation
///
/// ```
/// # use notagraph_core::log_op_start;
/// log_op_start!("save_model");
/// log_op_start!("set_feature", element_id = "e123");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__log_op!(info, $op, EVENT_START $(, $($field)*)?)
    };
}

/// Log the successful end of an operation; `duration_ms` is required
///
/// ```
/// # use notagraph_core::log_op_end;
/// log_op_end!("save_model", duration_ms = 42);
/// log_op_end!("move_to", duration_ms = 1, revision = 3);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__log_op!(info, $op, EVENT_END, duration_ms = $duration $(, $($field)*)?)
    };
}

/// Log the failure of an operation
///
/// The error is converted into `ExError` to emit `err_kind` and `err_code`.
///
/// ```
/// # use notagraph_core::{log_op_error, errors::NotationError};
/// log_op_error!("undo", NotationError::NothingToUndo, duration_ms = 0);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__log_op!(
            error,
            $op,
            EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code()
            $(, $($field)*)?
        )
    }};
}
