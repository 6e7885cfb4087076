//! Pluggable attachment policy.
//!
//! A heuristic answers two questions: "does the node need more channels,
//! and with what budget?" and "given a budget and the graph, which peers
//! should it attach to?". The agent is policy-agnostic; implementations are
//! chosen at construction time.

use std::collections::HashSet;
use std::net::SocketAddr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::{ChannelGraph, GraphError};
use crate::primitives::{Amount, Channel, NodeId};

/// A heuristic's recommendation to open one channel to one peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentDirective {
    /// The peer to attach to.
    pub peer_key: NodeId,

    /// Funding amount for the channel.
    pub chan_amt: Amount,

    /// Addresses the peer can be reached at, in preference order.
    pub addrs: Vec<SocketAddr>,
}

/// Answer to "does the node need more channels right now?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelDemand {
    /// No additional channels are needed.
    Satisfied,

    /// More channels should be opened, spending at most `budget` across
    /// the whole decision round.
    WantMore {
        /// Maximum amount the agent may commit this round.
        budget: Amount,
    },
}

impl ChannelDemand {
    /// Returns `true` if the heuristic asked for more channels.
    #[must_use]
    pub const fn wants_more(&self) -> bool {
        matches!(self, Self::WantMore { .. })
    }
}

/// Failures raised during peer selection.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HeuristicError {
    /// The graph backend failed mid-iteration.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Selection failed for a policy-specific reason.
    #[error("peer selection failed: {0}")]
    Selection(String),
}

/// Policy that decides when and where to open channels.
///
/// Determinism is not required: consecutive calls may return different
/// results for identical inputs.
#[async_trait]
pub trait AttachmentHeuristic: Send + Sync {
    /// Decides whether more channels are needed given the confirmed channel
    /// set and the free on-chain balance.
    ///
    /// Pending (unconfirmed) opens are never part of `channels`.
    async fn need_more_chans(&self, channels: &[Channel], balance: Amount) -> ChannelDemand;

    /// Selects peers to attach to, spending at most `budget` in total and
    /// never targeting a member of `skip`.
    ///
    /// The agent re-checks both constraints and clamps violating
    /// directives rather than trusting them blindly.
    ///
    /// # Errors
    ///
    /// Returns a [`HeuristicError`] if selection fails; the agent abandons
    /// the round and retries on the next state change.
    async fn select(
        &self,
        self_id: NodeId,
        graph: &dyn ChannelGraph,
        budget: Amount,
        skip: &HashSet<NodeId>,
    ) -> Result<Vec<AttachmentDirective>, HeuristicError>;
}
