//! The autopilot agent.
//!
//! One controller task owns every piece of agent state. External producers
//! (RPC handlers, chain subscribers, wallet watchers) enqueue signals and
//! never block; the task drains them in FIFO order, mutates its view,
//! consults the attachment heuristic at quiet points, and drives channel
//! opens through the channel controller. Funnelling all mutation and every
//! heuristic call through one task keeps the heuristic contract race-free
//! and serializes budget accounting, so the agent cannot over-commit funds.

mod state;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::controller::ChannelController;
use crate::graph::ChannelGraph;
use crate::heuristic::{AttachmentDirective, AttachmentHeuristic, ChannelDemand};
use crate::primitives::{Amount, Channel, ChannelId, NodeId};

use self::state::{AgentState, StateError};

/// Callback queried once at construction for the spendable on-chain
/// balance. Later changes arrive as balance-change signals.
pub type WalletBalanceFn = Arc<dyn Fn() -> anyhow::Result<Amount> + Send + Sync>;

/// Dependencies handed to [`Agent::new`]. All fields are required.
#[derive(Clone)]
pub struct Config {
    /// Identity key of the local node; never a valid attachment target.
    pub self_id: NodeId,

    /// Policy consulted after every state change.
    pub heuristic: Arc<dyn AttachmentHeuristic>,

    /// Bridge used to act on the heuristic's directives.
    pub chan_controller: Arc<dyn ChannelController>,

    /// Source of the initial wallet balance.
    pub wallet_balance: WalletBalanceFn,

    /// Read-only view of the global channel graph.
    pub graph: Arc<dyn ChannelGraph>,
}

/// Construction input that failed validation.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// Two initial channels share an id.
    #[error("duplicate channel id {0} in initial channel set")]
    DuplicateChannelId(ChannelId),

    /// An initial channel reported a negative capacity.
    #[error("channel {chan_id} has negative capacity {capacity}")]
    NegativeCapacity {
        /// The offending channel.
        chan_id: ChannelId,
        /// The reported capacity.
        capacity: Amount,
    },
}

/// Errors surfaced by the agent's lifecycle API.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AgentError {
    /// Construction input failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The wallet balance callback failed at construction.
    #[error("wallet balance lookup failed: {0}")]
    Wallet(#[source] anyhow::Error),

    /// The controller task ended abnormally.
    #[error("controller task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

/// A state-mutating signal delivered to the controller loop.
#[derive(Debug, Clone)]
enum AgentSignal {
    ChannelOpened(Channel),
    ChannelsClosed(Vec<ChannelId>),
    BalanceChanged(Amount),
}

/// The autopilot agent.
///
/// Constructed with [`Agent::new`], brought to life with [`Agent::start`],
/// and fed through the `on_*` signal methods, which never block. [`Agent::stop`]
/// shuts the controller task down and waits for it to exit; any pending
/// opens are abandoned.
pub struct Agent {
    signal_tx: mpsc::UnboundedSender<AgentSignal>,
    stop_tx: watch::Sender<bool>,
    started: AtomicBool,
    runtime: Mutex<AgentRuntime>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent").finish_non_exhaustive()
    }
}

struct AgentRuntime {
    /// The not-yet-spawned controller loop; consumed by `start`.
    seed: Option<ControllerLoop>,
    /// Join handle of the running controller task.
    task: Option<JoinHandle<()>>,
}

impl Agent {
    /// Builds an agent from its dependencies and the initial channel
    /// snapshot, seeding the balance from the wallet callback.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] if the initial channel set is
    /// inconsistent, or [`AgentError::Wallet`] if the balance lookup fails.
    pub fn new(cfg: Config, initial_chans: Vec<Channel>) -> Result<Self, AgentError> {
        for channel in &initial_chans {
            if channel.capacity.is_negative() {
                return Err(ConfigError::NegativeCapacity {
                    chan_id: channel.chan_id,
                    capacity: channel.capacity,
                }
                .into());
            }
        }

        let balance = (cfg.wallet_balance)().map_err(AgentError::Wallet)?;
        let state = AgentState::new(balance, initial_chans).map_err(|err| match err {
            StateError::DuplicateChannel(id) => {
                AgentError::Config(ConfigError::DuplicateChannelId(id))
            },
        })?;

        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);

        let seed = ControllerLoop {
            cfg,
            state,
            signal_rx,
            stop_rx,
        };

        Ok(Self {
            signal_tx,
            stop_tx,
            started: AtomicBool::new(false),
            runtime: Mutex::new(AgentRuntime {
                seed: Some(seed),
                task: None,
            }),
        })
    }

    /// Spawns the controller task. The first decision round runs
    /// immediately, before any signal is processed.
    ///
    /// Calling `start` more than once is a no-op.
    ///
    /// # Errors
    ///
    /// Currently infallible; the `Result` reserves room for spawn-time
    /// validation.
    pub async fn start(&self) -> Result<(), AgentError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let mut runtime = self.lock_runtime();
        if let Some(seed) = runtime.seed.take() {
            runtime.task = Some(tokio::spawn(seed.run()));
            info!("autopilot agent started");
        }
        Ok(())
    }

    /// Signals shutdown and waits for the controller task to exit.
    ///
    /// Idempotent; stopping an agent that never started is a no-op. Any
    /// in-flight channel open runs to completion and its result is
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::TaskFailed`] if the controller task panicked.
    pub async fn stop(&self) -> Result<(), AgentError> {
        let _ = self.stop_tx.send(true);

        // The guard is dropped before the join below; the runtime lock is
        // never held across an await.
        let task = self.lock_runtime().task.take();
        if let Some(task) = task {
            task.await?;
            info!("autopilot agent stopped");
        }
        Ok(())
    }

    /// Reports a newly confirmed channel.
    pub fn on_channel_open(&self, channel: Channel) {
        self.send(AgentSignal::ChannelOpened(channel));
    }

    /// Reports one or more closed channels.
    pub fn on_channel_close(&self, chan_ids: impl IntoIterator<Item = ChannelId>) {
        self.send(AgentSignal::ChannelsClosed(chan_ids.into_iter().collect()));
    }

    /// Reports a signed change in the spendable on-chain balance.
    pub fn on_balance_change(&self, delta: Amount) {
        self.send(AgentSignal::BalanceChanged(delta));
    }

    fn send(&self, signal: AgentSignal) {
        // Producers are fire-and-forget; once the loop has exited the
        // signal has nowhere to go.
        if self.signal_tx.send(signal).is_err() {
            debug!("signal dropped, controller loop is not running");
        }
    }

    fn lock_runtime(&self) -> std::sync::MutexGuard<'_, AgentRuntime> {
        // Poisoning means a thread panicked while holding the guard; the
        // bookkeeping inside is still sound.
        self.runtime
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// =============================================================================
// Controller loop
// =============================================================================

/// The single task that owns all agent state.
struct ControllerLoop {
    cfg: Config,
    state: AgentState,
    signal_rx: mpsc::UnboundedReceiver<AgentSignal>,
    stop_rx: watch::Receiver<bool>,
}

impl ControllerLoop {
    async fn run(mut self) {
        debug!(
            "controller loop running with {} channels, balance {}",
            self.state.channel_count(),
            self.state.total_balance()
        );

        // The decision trigger starts armed: the initial check runs before
        // any signal arrives.
        let mut decide = true;
        loop {
            if self.stopping() {
                break;
            }
            if decide {
                self.decision_round().await;
                decide = false;
            }

            tokio::select! {
                changed = self.stop_rx.changed() => {
                    if changed.is_err() || *self.stop_rx.borrow() {
                        break;
                    }
                }
                signal = self.signal_rx.recv() => {
                    let Some(signal) = signal else { break };
                    if self.apply(signal).is_err() {
                        return;
                    }
                    // Quiet point: fold in everything already queued so a
                    // burst of signals costs a single heuristic
                    // consultation.
                    while let Ok(queued) = self.signal_rx.try_recv() {
                        if self.apply(queued).is_err() {
                            return;
                        }
                    }
                    decide = true;
                }
            }
        }
        debug!("controller loop exiting");
    }

    /// Whether a stop has been signalled. Checked at every suspension
    /// point so shutdown never waits on more than the call already in
    /// flight.
    fn stopping(&self) -> bool {
        *self.stop_rx.borrow()
    }

    /// Applies one signal's mutation. An `Err` means the agent's view is
    /// corrupt and the loop must shut down.
    fn apply(&mut self, signal: AgentSignal) -> Result<(), StateError> {
        match signal {
            AgentSignal::ChannelOpened(channel) => {
                debug!(
                    "channel {} open: {} toward {}",
                    channel.chan_id, channel.capacity, channel.node
                );
                if let Err(err) = self.state.register_open(channel) {
                    error!("shutting down: {err}");
                    return Err(err);
                }
            },
            AgentSignal::ChannelsClosed(chan_ids) => {
                for chan_id in chan_ids {
                    if self.state.register_close(chan_id).is_none() {
                        debug!("close signal for untracked channel {chan_id}");
                    }
                }
            },
            AgentSignal::BalanceChanged(delta) => {
                self.state.apply_balance_delta(delta);
                debug!(
                    "balance changed by {delta}, now {}",
                    self.state.total_balance()
                );
            },
        }
        Ok(())
    }

    /// One pass of Deciding -> Selecting -> Dispatching.
    async fn decision_round(&mut self) {
        let channels: Vec<Channel> = self.state.channels().copied().collect();
        let balance = self.state.total_balance();

        let budget = match self.cfg.heuristic.need_more_chans(&channels, balance).await {
            ChannelDemand::Satisfied => return,
            ChannelDemand::WantMore { budget } => budget,
        };
        if self.stopping() {
            return;
        }

        let skip = self.state.skip_set(self.cfg.self_id);
        debug!(
            "heuristic wants more channels, budget {budget}, skipping {} peers",
            skip.len()
        );

        let directives = match self
            .cfg
            .heuristic
            .select(self.cfg.self_id, self.cfg.graph.as_ref(), budget, &skip)
            .await
        {
            Ok(directives) => directives,
            Err(err) => {
                warn!("peer selection failed: {err}");
                return;
            },
        };
        if directives.is_empty() {
            debug!("heuristic returned no directives");
            return;
        }

        self.dispatch(budget, &skip, directives).await;
    }

    /// Issues channel opens for the round's directives, in order, never
    /// exceeding `budget` in total.
    async fn dispatch(
        &mut self,
        budget: Amount,
        skip: &HashSet<NodeId>,
        directives: Vec<AttachmentDirective>,
    ) {
        let mut remaining = budget;
        for directive in directives {
            // Stop takes effect between opens: only the call already in
            // flight runs to completion, not the rest of the list.
            if self.stopping() {
                debug!("stop observed, abandoning remaining directives");
                return;
            }
            let peer = directive.peer_key;

            if !directive.chan_amt.is_positive() {
                debug!(
                    "dropping directive for {peer}: non-positive amount {}",
                    directive.chan_amt
                );
                continue;
            }
            if peer == self.cfg.self_id
                || skip.contains(&peer)
                || self.state.is_pending_open(&peer)
            {
                warn!("dropping directive for {peer}: peer is excluded from attachment");
                continue;
            }
            if remaining < directive.chan_amt {
                debug!(
                    "dropping directive for {peer}: {} exceeds remaining budget {remaining}",
                    directive.chan_amt
                );
                continue;
            }

            self.state.mark_pending_open(peer);
            remaining = remaining.saturating_sub(directive.chan_amt);

            info!("opening {} channel to {peer}", directive.chan_amt);
            if let Err(err) = self
                .cfg
                .chan_controller
                .open_channel(peer, directive.chan_amt, &directive.addrs)
                .await
            {
                warn!(
                    "open to {peer} failed, refunding {}: {err}",
                    directive.chan_amt
                );
                self.state.clear_pending_open(&peer);
                remaining = remaining.saturating_add(directive.chan_amt);
            }
        }
    }
}
