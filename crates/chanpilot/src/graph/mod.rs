//! Read-only view of the global channel graph.
//!
//! The agent never mutates the graph; it only hands the view to the
//! attachment heuristic. Backends are not required to present a consistent
//! snapshot across calls — consumers must tolerate churn between
//! invocations.

mod memory;

pub use memory::MemoryGraph;

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::primitives::{Amount, ChannelId, NodeId};

/// Verdict a visitor returns for each element during graph iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Keep iterating.
    Continue,
    /// Terminate iteration early.
    Stop,
}

/// A node in the global channel graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// The node's identity key.
    pub node_id: NodeId,

    /// Known network addresses for the node, in advertised order.
    pub addrs: Vec<SocketAddr>,
}

/// One channel incident on a node, as seen from that node's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEdge {
    /// Identifier of the channel.
    pub chan_id: ChannelId,

    /// Total capacity of the channel.
    pub capacity: Amount,

    /// The node on the other end.
    pub peer: NodeId,
}

/// Errors surfaced by graph backends.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GraphError {
    /// The backing storage could not be read.
    #[error("graph storage unavailable: {0}")]
    Unavailable(String),
}

/// Read-only access to the node's view of the network.
///
/// Iteration visits each element exactly once, in unspecified order.
/// Visitors terminate early by returning [`Visit::Stop`].
pub trait ChannelGraph: Send + Sync {
    /// Visits every known node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Unavailable`] if the backing storage cannot be
    /// read.
    fn for_each_node(
        &self,
        visit: &mut dyn FnMut(&GraphNode) -> Visit,
    ) -> Result<(), GraphError>;

    /// Visits each channel incident on `node`.
    ///
    /// A node the backend does not know visits nothing; callers must
    /// tolerate graph churn between invocations.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Unavailable`] if the backing storage cannot be
    /// read.
    fn for_each_channel(
        &self,
        node: &NodeId,
        visit: &mut dyn FnMut(&ChannelEdge) -> Visit,
    ) -> Result<(), GraphError>;
}
