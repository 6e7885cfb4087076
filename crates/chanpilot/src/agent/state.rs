//! In-memory state owned by the controller loop.
//!
//! Only the controller task touches this; producers communicate by message.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::primitives::{Amount, Channel, ChannelId, NodeId};

/// A signal that would corrupt the channel map.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum StateError {
    /// Two live channels reported the same id. The agent's view of the
    /// backing node is no longer trustworthy.
    #[error("channel id {0} is already tracked")]
    DuplicateChannel(ChannelId),
}

/// Channel set, balance, and in-flight opens, as last reported.
#[derive(Debug)]
pub(crate) struct AgentState {
    channels: HashMap<ChannelId, Channel>,
    total_balance: Amount,
    pending_opens: HashSet<NodeId>,
}

impl AgentState {
    pub(crate) fn new(
        total_balance: Amount,
        initial_chans: impl IntoIterator<Item = Channel>,
    ) -> Result<Self, StateError> {
        let mut state = Self {
            channels: HashMap::new(),
            total_balance: total_balance.max(Amount::ZERO),
            pending_opens: HashSet::new(),
        };
        for channel in initial_chans {
            state.register_open(channel)?;
        }
        Ok(state)
    }

    /// Records a confirmed open. Clears any pending open toward the same
    /// peer.
    pub(crate) fn register_open(&mut self, channel: Channel) -> Result<(), StateError> {
        if self.channels.contains_key(&channel.chan_id) {
            return Err(StateError::DuplicateChannel(channel.chan_id));
        }
        self.pending_opens.remove(&channel.node);
        self.channels.insert(channel.chan_id, channel);
        Ok(())
    }

    /// Records a close, returning the channel if it was tracked.
    pub(crate) fn register_close(&mut self, chan_id: ChannelId) -> Option<Channel> {
        self.channels.remove(&chan_id)
    }

    /// Applies a signed balance delta, flooring the total at zero.
    pub(crate) fn apply_balance_delta(&mut self, delta: Amount) {
        self.total_balance = self.total_balance.saturating_add(delta).max(Amount::ZERO);
    }

    pub(crate) fn mark_pending_open(&mut self, peer: NodeId) {
        self.pending_opens.insert(peer);
    }

    pub(crate) fn clear_pending_open(&mut self, peer: &NodeId) {
        self.pending_opens.remove(peer);
    }

    pub(crate) fn is_pending_open(&self, peer: &NodeId) -> bool {
        self.pending_opens.contains(peer)
    }

    pub(crate) fn total_balance(&self) -> Amount {
        self.total_balance
    }

    pub(crate) fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    pub(crate) fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Peers the next selection must not target: every peer with a
    /// confirmed channel, every peer with an unconfirmed open, and the
    /// local node itself.
    pub(crate) fn skip_set(&self, self_id: NodeId) -> HashSet<NodeId> {
        let mut skip: HashSet<NodeId> = self.channels.values().map(|c| c.node).collect();
        skip.extend(self.pending_opens.iter().copied());
        skip.insert(self_id);
        skip
    }
}
