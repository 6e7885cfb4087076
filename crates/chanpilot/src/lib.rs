//! # chanpilot
//!
//! Autopilot agent for a payment-channel network node.
//!
//! The agent is a library, not a process. A host node hands it four
//! capabilities at construction — an attachment heuristic, a channel
//! controller, a read-only channel graph, and a wallet-balance callback —
//! then feeds it fire-and-forget signals as channels open and close and as
//! the on-chain balance moves. A single controller task merges those
//! signals into one consistent view, asks the heuristic whether more
//! channels are needed, and dispatches channel opens without ever
//! exceeding the heuristic's budget for a round.
//!
//! ## Features
//!
//! - **Heuristic-agnostic**: the attachment policy is a trait chosen at
//!   construction time
//! - **Single-owner state**: one task mutates everything; producers only
//!   enqueue messages, so there are no locks around channel state
//! - **Coalesced decisions**: a burst of signals costs one heuristic
//!   consultation, not one per signal
//! - **Budget-safe dispatch**: failed opens refund the round budget and
//!   pending opens are never re-suggested to the heuristic
//!
//! ## Example
//!
//! ```rust,no_run
//! use chanpilot::{Agent, Amount, ChannelId, Config};
//!
//! # async fn demo(cfg: Config) -> Result<(), chanpilot::AgentError> {
//! let agent = Agent::new(cfg, Vec::new())?;
//! agent.start().await?;
//!
//! // Producers feed the agent without blocking.
//! agent.on_balance_change(Amount::COIN);
//! agent.on_channel_close([ChannelId::new(42)]);
//!
//! agent.stop().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod agent;
pub mod controller;
pub mod graph;
pub mod heuristic;
pub mod primitives;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::agent::{Agent, Config};
    pub use crate::controller::ChannelController;
    pub use crate::graph::{ChannelGraph, MemoryGraph};
    pub use crate::heuristic::{AttachmentDirective, AttachmentHeuristic, ChannelDemand};
    pub use crate::primitives::{Amount, Channel, ChannelId, NodeId};
}

/// Re-export commonly used types at the crate root.
pub use agent::{Agent, AgentError, Config, ConfigError, WalletBalanceFn};
pub use controller::{ChannelController, ControllerError};
pub use graph::{ChannelEdge, ChannelGraph, GraphError, GraphNode, MemoryGraph, Visit};
pub use heuristic::{AttachmentDirective, AttachmentHeuristic, ChannelDemand, HeuristicError};
pub use primitives::{Amount, Channel, ChannelId, NodeId, ParseNodeIdError};
