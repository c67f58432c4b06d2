//! In-process scene host.
//!
//! [`MemoryScene`] keeps the insertion point as a plain list of parsed
//! nodes and advances a simulated clock on every step. It behaves like the
//! simulator where the supervisor can observe it: fragments that do not
//! parse are dropped without an error reaching the caller, and the clock
//! stops with a termination signal once an optional end time is reached.

use tracing::{debug, warn};

use crate::fragment::split_nodes;
use crate::scene::{NodeId, NodeIdAllocator, SceneStore};

/// A node living under the insertion point.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub id: NodeId,
    pub name: Option<String>,
}

#[derive(Debug)]
pub struct MemoryScene {
    nodes: Vec<SceneNode>,
    allocator: NodeIdAllocator,
    /// Basic time step, in milliseconds.
    basic_timestep: u32,
    /// Simulated time elapsed so far, in milliseconds.
    elapsed_ms: u64,
    /// Simulated time, in seconds, at which stepping reports termination.
    stop_after: Option<f64>,
}

impl MemoryScene {
    /// Create an empty scene with the given basic time step (milliseconds).
    #[must_use]
    pub fn new(basic_timestep: u32) -> Self {
        Self {
            nodes: Vec::new(),
            allocator: NodeIdAllocator::new(),
            basic_timestep,
            elapsed_ms: 0,
            stop_after: None,
        }
    }

    /// Terminate the simulation once `seconds` of simulated time elapsed.
    #[must_use]
    pub fn with_stop_after(mut self, seconds: f64) -> Self {
        self.stop_after = Some(seconds);
        self
    }

    /// Returns the nodes under the insertion point, in order.
    #[must_use]
    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }
}

impl SceneStore for MemoryScene {
    fn import_node(&mut self, fragment: &str) {
        let parsed = match split_nodes(fragment) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(%e, "scene rejected fragment");
                return;
            }
        };

        for node in parsed {
            let id = self.allocator.allocate();
            debug!(%id, type_name = node.type_name, name = ?node.name, "node imported");
            self.nodes.push(SceneNode {
                id,
                name: node.name,
            });
        }
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node_at(&self, index: usize) -> Option<NodeId> {
        self.nodes.get(index).map(|node| node.id)
    }

    fn name_field(&self, node: NodeId) -> Option<String> {
        self.nodes
            .iter()
            .find(|n| n.id == node)
            .and_then(|n| n.name.clone())
    }

    fn remove_node(&mut self, node: NodeId) {
        if let Some(pos) = self.nodes.iter().position(|n| n.id == node) {
            let removed = self.nodes.remove(pos);
            debug!(id = %removed.id, "node removed");
        }
    }

    fn step(&mut self, timestep_ms: u32) -> i32 {
        if let Some(stop_after) = self.stop_after
            && self.time() >= stop_after
        {
            return -1;
        }
        self.elapsed_ms += u64::from(timestep_ms);
        0
    }

    fn time(&self) -> f64 {
        self.elapsed_ms as f64 / 1000.0
    }

    fn basic_timestep(&self) -> u32 {
        self.basic_timestep
    }
}
