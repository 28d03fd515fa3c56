//! Node and edge storage with O(1) identity lookup
//!
//! The store is the only owner of the node and edge collections and the
//! adjacency lists. Every insertion also updates an id-to-slot index, so
//! lookups by id never scan.

use crate::core::error::GraphError;
use crate::core::types::{EdgeId, EdgeKind, NodeId, Position, StateToken};
use crate::graph::edge::Edge;
use crate::graph::grid::SpatialGrid;
use crate::graph::node::Node;
use ahash::{AHashMap, AHashSet};
use serde::Serialize;
use tracing::{trace, warn};

/// Owner of all nodes, edges and adjacency
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: AHashMap<NodeId, usize>,
    pairs: AHashSet<(NodeId, NodeId)>,
    grid: Option<SpatialGrid>,
    dropped_references: usize,
}

/// Summary counts of a store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    /// All nodes including the central one
    pub nodes: usize,
    /// All edges
    pub edges: usize,
    /// Edges from the payload
    pub data_edges: usize,
    /// Central spokes
    pub spoke_edges: usize,
    /// Proximity edges
    pub synthetic_edges: usize,
    /// Edge insertions skipped for unknown endpoints
    pub dropped_references: usize,
    /// Occupied spatial grid cells
    pub grid_cells: usize,
}

/// Entities whose look changed during a reset
#[derive(Debug, Clone, Default)]
pub struct RestoredEntities {
    /// Nodes put back to their base token
    pub nodes: Vec<NodeId>,
    /// Edges put back to their base token
    pub edges: Vec<EdgeId>,
}

fn pair_key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b { (a, b) } else { (b, a) }
}

impl GraphStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node.
    ///
    /// Fails if the id is already present; this covers the central id too,
    /// which can therefore be assigned exactly once per store.
    pub fn add_node(
        &mut self,
        id: NodeId,
        layer: i64,
        position: Position,
        base_state: StateToken,
    ) -> Result<&Node, GraphError> {
        if self.index.contains_key(&id) {
            return Err(GraphError::DuplicateId { id });
        }

        let slot = self.nodes.len();
        self.nodes.push(Node::new(id, layer, position, base_state));
        self.index.insert(id, slot);
        Ok(&self.nodes[slot])
    }

    /// Insert an edge between two existing nodes.
    ///
    /// Returns `None` without inserting when an endpoint is unknown (logged)
    /// or, for synthetic edges, when the pair is already connected in either
    /// direction by an edge of any kind.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId, kind: EdgeKind) -> Option<EdgeId> {
        let (Some(&s), Some(&t)) = (self.index.get(&source), self.index.get(&target)) else {
            warn!(%source, %target, %kind, "Dropping edge with unresolved endpoint");
            self.dropped_references += 1;
            return None;
        };

        let key = pair_key(source, target);
        if kind == EdgeKind::Synthetic && self.pairs.contains(&key) {
            trace!(%source, %target, "Synthetic edge already present");
            return None;
        }

        let base_state = match kind {
            EdgeKind::Data => StateToken::blend(self.nodes[s].base_state(), self.nodes[t].base_state()),
            EdgeKind::CentralSpoke => StateToken::Spoke,
            EdgeKind::Synthetic => StateToken::Synthetic,
        };

        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Edge::new(id, source, target, kind, base_state));
        self.pairs.insert(key);
        self.nodes[s].push_edge(id);
        if t != s {
            self.nodes[t].push_edge(id);
        }
        Some(id)
    }

    /// Count an edge whose endpoint is not a node index at all
    pub fn drop_unresolved(&mut self, kind: EdgeKind) {
        warn!(%kind, "Dropping edge with an endpoint that is not a node index");
        self.dropped_references += 1;
    }

    /// Look up a node by id
    pub fn find_node(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|&slot| &self.nodes[slot])
    }

    pub(crate) fn find_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        match self.index.get(&id) {
            Some(&slot) => Some(&mut self.nodes[slot]),
            None => None,
        }
    }

    /// Look up an edge by id
    pub fn find_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.as_usize())
    }

    /// The central node, if it has been added
    pub fn central(&self) -> Option<&Node> {
        self.find_node(NodeId::Central)
    }

    /// Nodes across each incident edge of `id`.
    ///
    /// The iterator is lazy and can be cloned to walk the neighbors again.
    /// An unknown id has no neighbors.
    pub fn neighbors_of(&self, id: NodeId) -> impl Iterator<Item = &Node> + Clone + '_ {
        self.incident_edges(id).iter().filter_map(move |edge_id| {
            self.edges[edge_id.as_usize()]
                .other_end(id)
                .and_then(|other| self.find_node(other))
        })
    }

    /// Edge ids incident to a node (empty for an unknown id)
    pub fn incident_edges(&self, id: NodeId) -> &[EdgeId] {
        self.find_node(id).map(Node::adjacent_edges).unwrap_or(&[])
    }

    /// Whether any edge joins `a` and `b`
    pub fn has_edge_between(&self, a: NodeId, b: NodeId) -> bool {
        self.pairs.contains(&pair_key(a, b))
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter()
    }

    /// All edges in insertion order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of edges of one kind
    pub fn edge_count_by_kind(&self, kind: EdgeKind) -> usize {
        self.edges.iter().filter(|e| e.kind == kind).count()
    }

    /// Attach the spatial grid built for this layout
    pub fn set_grid(&mut self, grid: SpatialGrid) {
        self.grid = Some(grid);
    }

    /// Spatial grid of node positions, if one was attached
    pub fn grid(&self) -> Option<&SpatialGrid> {
        self.grid.as_ref()
    }

    /// Summary counts
    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            dropped_references: self.dropped_references,
            grid_cells: self.grid.as_ref().map(SpatialGrid::cell_count).unwrap_or(0),
            ..GraphStats::default()
        };
        for edge in &self.edges {
            match edge.kind {
                EdgeKind::Data => stats.data_edges += 1,
                EdgeKind::CentralSpoke => stats.spoke_edges += 1,
                EdgeKind::Synthetic => stats.synthetic_edges += 1,
            }
        }
        stats
    }

    /// Mark a node infected and corrupted. Returns whether it was clean before.
    pub fn infect_node(&mut self, id: NodeId) -> Result<bool, GraphError> {
        let node = self.find_node_mut(id).ok_or(GraphError::NodeNotFound { id })?;
        let newly = !node.infected;
        node.infected = true;
        node.state = StateToken::Corrupted;
        Ok(newly)
    }

    /// Mark an edge infected and corrupted. Returns whether it was clean before.
    pub fn infect_edge(&mut self, id: EdgeId) -> Result<bool, GraphError> {
        let edge = self
            .edges
            .get_mut(id.as_usize())
            .ok_or(GraphError::EdgeNotFound { id: id.0 })?;
        let newly = !edge.infected;
        edge.infected = true;
        edge.state = StateToken::Corrupted;
        Ok(newly)
    }

    /// Put every node and edge back to its base token and clear infection
    pub fn restore_all(&mut self) -> RestoredEntities {
        let mut restored = RestoredEntities::default();
        for node in self.nodes.iter_mut().filter(|n| n.is_dirty()) {
            node.restore();
            restored.nodes.push(node.id);
        }
        for edge in self.edges.iter_mut().filter(|e| e.is_dirty()) {
            edge.restore();
            restored.edges.push(edge.id);
        }
        restored
    }

    /// Number of infected nodes
    pub fn infected_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.infected).count()
    }
}
