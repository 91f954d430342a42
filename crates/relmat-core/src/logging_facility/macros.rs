//! Operation boundary macros
//!
//! An operation logs one `start` event and then exactly one of `end` or
//! `end_error`. All three carry `component` (the calling module), `op` and
//! `event`; extra `key = value` fields are passed through to `tracing`.

#[doc(hidden)]
#[macro_export]
macro_rules! __log_boundary {
    ($level:ident, $op:expr, $event:ident $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = module_path!(),
            op = $op,
            event = $crate::relmat_core_types::schema::$event,
            $($($field)*)?
        )
    };
}

/// Log the start of an operation
///
/// ```
/// # use relmat_core::log_op_start;
/// log_op_start!("materialize");
/// log_op_start!("insert_and_fetch", table = "customers");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__log_boundary!(info, $op, EVENT_START $(, $($field)*)?)
    };
}

/// Log the successful end of an operation; `duration_ms` is mandatory
///
/// ```
/// # use relmat_core::log_op_end;
/// log_op_end!("materialize", duration_ms = 3, parents = 2);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__log_boundary!(info, $op, EVENT_END, duration_ms = $duration $(, $($field)*)?)
    };
}

/// Log a failed operation at error level
///
/// `$err` is anything convertible into `ExError`; its kind and stable code
/// are logged as `err_kind` and `err_code`.
///
/// ```
/// # use relmat_core::{log_op_error, errors::RelmatError};
/// let err = RelmatError::MissingColumn { column: "oid".to_string() };
/// log_op_error!("materialize", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__log_boundary!(
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
