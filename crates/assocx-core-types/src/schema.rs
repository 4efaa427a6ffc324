//! Canonical schema constants for structured logging and events
//!
//! These constants ensure consistency across all logging and error reporting.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Record and association identifiers
pub const FIELD_RECORD_TYPE: &str = "record_type";
pub const FIELD_RECORD_ID: &str = "record_id";
pub const FIELD_ASSOCIATION: &str = "association";
pub const FIELD_FOREIGN_KEY: &str = "foreign_key";
pub const FIELD_CASCADE: &str = "cascade";

// Resolution outcome
pub const FIELD_CACHE_HIT: &str = "cache_hit";
pub const FIELD_RESOLVED: &str = "resolved";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
