//! # Innate Primitives
//!
//! Fixed constants shared by the builders, the classifier and the merge engine.
//!
//! These values are middleware conventions, not configuration. Anything a
//! user may reasonably want to change (exclusion lists, conflict direction)
//! lives in [`crate::filters`] or [`crate::merge`] instead.
//!
//! ## Groups
//!
//! 1. **Sentinels**: substituted when a single lookup fails.
//! 2. **Classification**: bond heartbeat type, nodelet management triad, action vocabulary.
//! 3. **Provenance**: source tags written by each pass.
//! 4. **Formats**: binary snapshot header and size limits.

// =============================================================================
// SENTINELS
// =============================================================================

/// Type assigned to a topic whose declared type could not be resolved.
pub const UNKNOWN_TYPE: &str = "Error: Unknown";

/// Value recorded for a parameter whose value could not be fetched.
pub const UNKNOWN_PARAMETER_VALUE: &str = "UNKNOWN VALUE";

/// Machine name used when a node URI cannot be parsed into a host.
pub const UNKNOWN_MACHINE: &str = "UNKNOWN MACHINE";

/// Hostname used when a machine cannot be resolved.
pub const UNKNOWN_HOSTNAME: &str = "UNKNOWN HOSTNAME";

/// IP address used when a machine cannot be resolved.
pub const UNKNOWN_IP_ADDRESS: &str = "UNKNOWN IP ADDRESS";

/// Node URI placeholder.
#[must_use]
pub fn unknown_node_uri(node_name: &str) -> String {
    format!("UNKNOWN URI FOR {}", node_name)
}

/// Service URI placeholder.
#[must_use]
pub fn unknown_service_uri(service_name: &str) -> String {
    format!("Service URI {} is unavailable", service_name)
}

/// Final path segment that marks a name as unresolved by static analysis.
pub const INCOMPLETE_NAME_TOKEN: &str = "?";

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Heartbeat topic type shared by a nodelet and its manager.
pub const BOND_TOPIC_TYPE: &str = "bond/Status";

/// Service types a nodelet manager must provide, all three of them.
pub const NODELET_MANAGER_SERVICE_TYPES: [&str; 3] = [
    "nodelet/NodeletList",
    "nodelet/NodeletLoad",
    "nodelet/NodeletUnload",
];

/// Action topic suffixes published by the client side.
pub const ACTION_CLIENT_SUFFIXES: [&str; 2] = ["/cancel", "/goal"];

/// Action topic suffixes published by the server side.
pub const ACTION_SERVER_SUFFIXES: [&str; 3] = ["/feedback", "/result", "/status"];

/// Suffixes whose types must share one prefix, paired with the expected type ending.
pub const ACTION_CORE_SUFFIXES: [(&str, &str); 3] = [
    ("/goal", "ActionGoal"),
    ("/feedback", "ActionFeedback"),
    ("/result", "ActionResult"),
];

/// A topic cluster needs at least this many distinct known suffixes to be an action.
pub const ACTION_MIN_SUFFIXES: usize = 3;

/// A node joins an action role only when it touches every suffix in the right direction.
pub const ACTION_ROLE_COUNT: usize = 5;

/// Interpreter executables whose script is the real node file (`cmdline[1]`).
pub const INTERPRETER_PREFIX: &str = "python";

// =============================================================================
// PROVENANCE
// =============================================================================

/// Tag written by the live snapshot pass.
pub const SNAPSHOT_SOURCE: &str = "ros_snapshot";

/// Tag written by the reconciliation engine.
pub const MERGER_SOURCE: &str = "haros_chris_model_merger";

/// Delimiter for provenance stored as a single string.
pub const PROVENANCE_DELIMITER: char = ',';

// =============================================================================
// FORMATS
// =============================================================================

/// Magic bytes for the rosmodel binary snapshot header.
///
/// - File Header = Magic Bytes ("RMDL") + Version (u8) + Model kind (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"RMDL";

/// Current serialization format version.
///
/// Increment this when making breaking changes to the snapshot payload.
pub const FORMAT_VERSION: u8 = 1;

/// Maximum accepted snapshot payload, checked before decoding.
pub const MAX_SNAPSHOT_SIZE: usize = 256 * 1024 * 1024;
