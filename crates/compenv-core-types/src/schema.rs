//! Canonical schema constants for structured logging and events
//!
//! These constants ensure consistency across all logging and error reporting.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Entity identifiers
pub const FIELD_APPLICATION_ID: &str = "application_id";
pub const FIELD_PROJECT_ID: &str = "project_id";
pub const FIELD_NODE_ID: &str = "node_id";
pub const FIELD_EXTENSION_POINT: &str = "extension_point";

// Counters
pub const FIELD_ACTIVE_PROJECTS: &str = "active_projects";
pub const FIELD_SOURCE_UNITS: &str = "source_units";
pub const FIELD_LINE_COUNT: &str = "line_count";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
