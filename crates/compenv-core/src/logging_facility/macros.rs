//! Lifecycle event macros
//!
//! `Environment` and `ProjectHandle` wrap each public operation in one
//! `start` event and exactly one of `end` / `end_error`. Every event carries
//! `component`, `op` and `event`; extra fields use the names in
//! [`schema`](crate::schema) (`node_id`, `project_id`, `active_projects`, ...).
//! Code below the facade logs with plain `tracing::debug!` instead.

/// `start` event for `op`
///
/// ```
/// # use compenv_core::log_op_start;
/// // a scope id is the only thing known before the project exists
/// log_op_start!("create_shared", node_id = 3u64);
/// log_op_start!("dispose_application");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_START,
            $($field)*
        );
    };
}

/// `end` event for `op`; `duration_ms` is required
///
/// ```
/// # use compenv_core::log_op_end;
/// log_op_end!("line_count", duration_ms = 1, project_id = "p-1", line_count = 120usize);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// `end_error` event for `op` with the stable `err.code` and `err.kind`
///
/// `$err` is anything that converts into [`ExError`](crate::errors::ExError).
///
/// ```
/// # use compenv_core::{log_op_error, errors::EnvError};
/// // a lease handed back after the counter already reached zero
/// let err = EnvError::ReleaseWithoutAcquire {
///     application_id: "app-7".to_string(),
/// };
/// log_op_error!("dispose_scope", err, duration_ms = 0, node_id = 12u64);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            $($field)*
        );
    }};
}
