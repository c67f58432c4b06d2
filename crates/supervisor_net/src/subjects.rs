//! NATS subject hierarchy.
//!
//! All supervisor subjects live under a configurable prefix so several
//! simulations can share one NATS cluster:
//!
//! ```text
//! <prefix>.cmd.spawn_urdf_robot        request/reply
//! <prefix>.cmd.spawn_node_from_string  request/reply
//! <prefix>.cmd.remove_node             publish, no reply
//! <prefix>.clock                       published every tick
//! ```
//!
//! Commands share one subtree so a single wildcard subscription receives
//! them in the order they were published.

/// Default subject prefix.
pub const DEFAULT_PREFIX: &str = "supervisor";

// ── Command operations ──────────────────────────────────────────────────────

/// Spawn a robot from its description. Client → Supervisor.
pub const OP_SPAWN_URDF_ROBOT: &str = "spawn_urdf_robot";

/// Spawn a node from a raw fragment. Client → Supervisor.
pub const OP_SPAWN_NODE_FROM_STRING: &str = "spawn_node_from_string";

/// Remove a spawned node by name. Client → Supervisor.
pub const OP_REMOVE_NODE: &str = "remove_node";

// ── Subject builders ────────────────────────────────────────────────────────

/// `<prefix>.cmd.<op>`
#[must_use]
pub fn command(prefix: &str, op: &str) -> String {
    format!("{prefix}.cmd.{op}")
}

/// Wildcard matching every command subject: `<prefix>.cmd.>`
#[must_use]
pub fn command_wildcard(prefix: &str) -> String {
    format!("{prefix}.cmd.>")
}

/// `<prefix>.clock`
#[must_use]
pub fn clock(prefix: &str) -> String {
    format!("{prefix}.clock")
}

/// Extract the operation from a command subject, e.g.
/// `supervisor.cmd.remove_node` → `remove_node`.
#[must_use]
pub fn command_op<'a>(prefix: &str, subject: &'a str) -> Option<&'a str> {
    subject
        .strip_prefix(prefix)
        .and_then(|s| s.strip_prefix(".cmd."))
        .filter(|op| !op.is_empty())
}
