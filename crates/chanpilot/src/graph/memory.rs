//! In-memory channel graph.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::RwLock;

use crate::primitives::{Amount, ChannelId, NodeId};

use super::{ChannelEdge, ChannelGraph, GraphError, GraphNode, Visit};

/// An in-memory [`ChannelGraph`].
///
/// Useful for tests and for embedders that assemble the graph from their
/// own gossip layer. Shared as `Arc<MemoryGraph>`, the graph may be mutated
/// concurrently with agent reads; iteration sees whichever state the lock
/// grants.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    nodes: HashMap<NodeId, GraphNode>,
    channels: HashMap<NodeId, Vec<ChannelEdge>>,
}

impl MemoryGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node, replacing any previous address list for it.
    pub fn add_node(&self, node_id: NodeId, addrs: Vec<SocketAddr>) {
        let mut inner = self.write();
        inner.nodes.insert(node_id, GraphNode { node_id, addrs });
        inner.channels.entry(node_id).or_default();
    }

    /// Adds a channel between `a` and `b`, recording an edge on both sides.
    ///
    /// Endpoints not yet known are created with empty address lists.
    pub fn add_channel(&self, chan_id: ChannelId, a: NodeId, b: NodeId, capacity: Amount) {
        let mut inner = self.write();
        for node_id in [a, b] {
            inner.nodes.entry(node_id).or_insert_with(|| GraphNode {
                node_id,
                addrs: Vec::new(),
            });
        }
        inner.channels.entry(a).or_default().push(ChannelEdge {
            chan_id,
            capacity,
            peer: b,
        });
        inner.channels.entry(b).or_default().push(ChannelEdge {
            chan_id,
            capacity,
            peer: a,
        });
    }

    /// Number of known nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.read().nodes.len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        // Poisoning means a writer panicked; the data itself is plain
        // bookkeeping, so keep serving it.
        self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ChannelGraph for MemoryGraph {
    fn for_each_node(
        &self,
        visit: &mut dyn FnMut(&GraphNode) -> Visit,
    ) -> Result<(), GraphError> {
        let inner = self.read();
        for node in inner.nodes.values() {
            if visit(node) == Visit::Stop {
                break;
            }
        }
        Ok(())
    }

    fn for_each_channel(
        &self,
        node: &NodeId,
        visit: &mut dyn FnMut(&ChannelEdge) -> Visit,
    ) -> Result<(), GraphError> {
        let inner = self.read();
        let Some(edges) = inner.channels.get(node) else {
            return Ok(());
        };
        for edge in edges {
            if visit(edge) == Visit::Stop {
                break;
            }
        }
        Ok(())
    }
}
