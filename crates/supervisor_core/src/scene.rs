//! Scene store contract.
//!
//! A [`SceneStore`] is the live scene graph of the running simulation, seen
//! through its entity insertion point: the list of top-level nodes new
//! entities are appended to. All calls are synchronous. A call returns only
//! once the simulator has applied the mutation or answered the query.

/// An opaque handle to a node in the scene.
///
/// Handles are only meaningful to the store that issued them and are not
/// cached across operations: every lookup re-scans the insertion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

/// Allocates monotonically increasing node handles. IDs start at 1.
#[derive(Debug)]
pub struct NodeIdAllocator {
    next_id: u64,
}

impl NodeIdAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    pub fn allocate(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        NodeId(id)
    }
}

impl Default for NodeIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// The simulator's scene graph, as far as the supervisor touches it.
pub trait SceneStore {
    /// Append the nodes described by `fragment` at the end of the insertion
    /// point. The simulator may reject the fragment without reporting it.
    fn import_node(&mut self, fragment: &str);

    /// Number of nodes currently under the insertion point.
    fn node_count(&self) -> usize;

    /// Handle of the node at `index` under the insertion point.
    fn node_at(&self, index: usize) -> Option<NodeId>;

    /// Value of the node's `name` field, or `None` if it has no such field.
    fn name_field(&self, node: NodeId) -> Option<String>;

    /// Remove a node from the scene.
    fn remove_node(&mut self, node: NodeId);

    /// Advance the simulation by `timestep_ms`. A negative return value
    /// means the simulator is terminating.
    fn step(&mut self, timestep_ms: u32) -> i32;

    /// Elapsed simulated time, in seconds.
    fn time(&self) -> f64;

    /// The world's basic time step, in milliseconds.
    fn basic_timestep(&self) -> u32;
}

/// Scan the insertion point for the first node whose `name` field equals
/// `name`. Nodes without a `name` field are skipped.
pub fn find_node<S: SceneStore + ?Sized>(scene: &S, name: &str) -> Option<NodeId> {
    (0..scene.node_count())
        .filter_map(|index| scene.node_at(index))
        .find(|&node| scene.name_field(node).as_deref() == Some(name))
}
