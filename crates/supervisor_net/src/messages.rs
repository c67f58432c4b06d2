//! Message types exchanged between clients and the supervisor.
//!
//! Every field of a request is optional on the wire: absent fields decode
//! to their default, and an empty string means "not provided".

use serde::{Deserialize, Serialize};
use supervisor_core::converter::{DEFAULT_ROTATION, DEFAULT_TRANSLATION};
use supervisor_core::{ConversionOptions, RobotSource, SimTime, SpawnRequest};

// ── Spawn requests ──────────────────────────────────────────────────────────

/// A robot to convert from its description and insert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrdfRobot {
    /// Unique entity name.
    pub name: String,
    /// Path to a description file. Takes precedence over `robot_description`.
    pub urdf_path: String,
    /// Inline description content.
    pub robot_description: String,
    /// Prefix for relative resource paths in `robot_description`.
    pub relative_path_prefix: String,
    /// Initial translation, defaults to `"0 0 0"`.
    pub translation: String,
    /// Initial axis-angle rotation, defaults to `"0 0 1 0"`.
    pub rotation: String,
    pub normal: bool,
    pub box_collision: bool,
    /// Initial joint positions.
    pub init_pos: String,
}

/// Request on [`OP_SPAWN_URDF_ROBOT`](crate::subjects::OP_SPAWN_URDF_ROBOT).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnUrdfRobot {
    pub robot: UrdfRobot,
}

/// Request on [`OP_SPAWN_NODE_FROM_STRING`](crate::subjects::OP_SPAWN_NODE_FROM_STRING).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnNodeFromString {
    /// The fragment text.
    pub data: String,
}

/// Reply to both spawn requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnResponse {
    pub success: bool,
}

// ── Removal ─────────────────────────────────────────────────────────────────

/// Notification on [`OP_REMOVE_NODE`](crate::subjects::OP_REMOVE_NODE). No reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoveNode {
    /// Name of the node to remove.
    pub data: String,
}

// ── Clock ───────────────────────────────────────────────────────────────────

/// Published on the clock subject every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Clock {
    pub clock: SimTime,
}

// ── Conversions ─────────────────────────────────────────────────────────────

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn or_default(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

impl From<UrdfRobot> for SpawnRequest {
    fn from(robot: UrdfRobot) -> Self {
        let source = if !robot.urdf_path.is_empty() {
            Some(RobotSource::File(robot.urdf_path.into()))
        } else if !robot.robot_description.is_empty() {
            Some(RobotSource::Content {
                content: robot.robot_description,
                relative_path_prefix: non_empty(robot.relative_path_prefix),
            })
        } else {
            None
        };

        SpawnRequest {
            name: robot.name,
            source,
            options: ConversionOptions {
                translation: or_default(robot.translation, DEFAULT_TRANSLATION),
                rotation: or_default(robot.rotation, DEFAULT_ROTATION),
                normal: robot.normal,
                box_collision: robot.box_collision,
                init_pos: non_empty(robot.init_pos),
            },
        }
    }
}
