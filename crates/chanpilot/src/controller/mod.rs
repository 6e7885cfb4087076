//! Side-effecting bridge to the node's channel-management subsystem.

use std::net::SocketAddr;

use async_trait::async_trait;
use thiserror::Error;

use crate::primitives::{Amount, Channel, ChannelId, NodeId};

/// Failures reported by the channel-management subsystem.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ControllerError {
    /// The target peer could not be reached.
    #[error("peer {peer} is unreachable")]
    Unreachable {
        /// The peer that could not be reached.
        peer: NodeId,
    },

    /// Not enough confirmed on-chain funds to fund the channel.
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        /// Amount the open requested.
        requested: Amount,
        /// Amount actually spendable.
        available: Amount,
    },

    /// The peer declined the channel.
    #[error("peer {peer} rejected the request: {reason}")]
    PeerRejected {
        /// The rejecting peer.
        peer: NodeId,
        /// Reason the peer gave, if any.
        reason: String,
    },

    /// No channel with the given id exists.
    #[error("unknown channel {0}")]
    ChannelNotFound(ChannelId),
}

/// Operations that act on the node's channel set.
///
/// Implementations serialize or safely interleave their own operations; the
/// agent issues at most one call at a time but holds no lock around them.
#[async_trait]
pub trait ChannelController: Send + Sync {
    /// Initiates funding of a new channel of `amount` toward `target`.
    ///
    /// Success means the open was *accepted for processing*, not that it
    /// confirmed; confirmation arrives later as a channel-open signal.
    ///
    /// # Errors
    ///
    /// Returns a [`ControllerError`] if the open could not be accepted.
    async fn open_channel(
        &self,
        target: NodeId,
        amount: Amount,
        addrs: &[SocketAddr],
    ) -> Result<(), ControllerError>;

    /// Initiates a cooperative close of a channel.
    ///
    /// # Errors
    ///
    /// Returns a [`ControllerError`] if the close could not be initiated.
    async fn close_channel(&self, chan_id: ChannelId) -> Result<(), ControllerError>;

    /// Adds `amount` of capacity to an existing channel.
    ///
    /// Reserved for future capacity adjustments; the agent does not
    /// currently invoke it.
    ///
    /// # Errors
    ///
    /// Returns a [`ControllerError`] if the splice could not be initiated.
    async fn splice_in(
        &self,
        chan_id: ChannelId,
        amount: Amount,
    ) -> Result<Channel, ControllerError>;

    /// Withdraws `amount` of capacity from an existing channel.
    ///
    /// Reserved for future capacity adjustments; the agent does not
    /// currently invoke it.
    ///
    /// # Errors
    ///
    /// Returns a [`ControllerError`] if the splice could not be initiated.
    async fn splice_out(
        &self,
        chan_id: ChannelId,
        amount: Amount,
    ) -> Result<Channel, ControllerError>;
}
