//! Structured logging schema for docflow.
//!
//! Every event carries `subsystem` and `component` set from the constants
//! below, so log aggregation can filter on the same values across crates.
//! The remaining fields use these names:
//!
//! | Field          | Meaning                                         |
//! |----------------|-------------------------------------------------|
//! | `op`           | Logical operation: `create`, `forward`, ...     |
//! | `document_id`  | Document being operated on                      |
//! | `user_id`      | Owner or actor                                  |
//! | `department`   | Department involved                             |
//! | `from_status`  | Status before a transition                      |
//! | `to_status`    | Status after a transition                       |
//! | `actor`        | Admin performing the action                     |
//! | `result_count` | Rows returned                                   |
//! | `duration_ms`  | Wall-clock duration                             |
//! | `pool_size`    | Open connections                                |
//! | `pool_idle`    | Idle connections                                |
//! | `error`        | Failure message                                 |
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Rejected transition, failed login, recoverable fallback |
//! | INFO  | Lifecycle events (startup, shutdown), workflow writes |
//! | DEBUG | Decision points, filters, config choices |
//! | TRACE | Per-row iteration |

// ─── subsystem ─────────────────────────────────────────────────────────────

pub const SUBSYSTEM_API: &str = "api";
pub const SUBSYSTEM_WORKFLOW: &str = "workflow";
pub const SUBSYSTEM_DATABASE: &str = "database";

// ─── component ─────────────────────────────────────────────────────────────

/// Document state machine
pub const COMPONENT_ENGINE: &str = "engine";
/// Departments, divisions, user administration
pub const COMPONENT_DIRECTORY: &str = "directory";
pub const COMPONENT_AUTH: &str = "auth";
pub const COMPONENT_POOL: &str = "pool";
pub const COMPONENT_RATE_LIMIT: &str = "rate_limit";
