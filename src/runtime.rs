//! Explicit task construction and the join/shutdown sequence
//!
//! Three loops (pilot, input resolver, score resolver) plus the match
//! supervisor are spawned here and joined here; nothing registers itself
//! in an ambient table. Shutdown flips `game_active`, flushes a final
//! land command, waits out the grace period and joins every task.

use std::sync::Arc;

use tokio::sync::mpsc::unbounded_channel;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::GameConfig;
use crate::control::command::CommandSink;
use crate::control::pilot::run_pilot;
use crate::game::events::MatchOutcome;
use crate::game::state::SharedState;
use crate::input::controller::ControllerLink;
use crate::input::resolver::run_input_resolver;
use crate::lifecycle::{run_supervisor, start_match};
use crate::score::resolver::run_score_resolver;

/// Handle over the running game core
pub struct GameRuntime {
    shared: Arc<SharedState>,
    cfg: GameConfig,
    sink: Arc<dyn CommandSink>,
    outcome_rx: watch::Receiver<Option<MatchOutcome>>,
    pilot: JoinHandle<()>,
    score: JoinHandle<()>,
    input: JoinHandle<()>,
    supervisor: JoinHandle<()>,
}

impl GameRuntime {
    /// Spawn every task of the coordination engine
    pub fn spawn<L>(cfg: GameConfig, link: L, sink: Arc<dyn CommandSink>) -> Self
    where
        L: ControllerLink + 'static,
    {
        let shared = Arc::new(SharedState::new(cfg.starting_life));
        let (events_tx, events_rx) = unbounded_channel();
        let (outcome_tx, outcome_rx) = watch::channel(None);

        let pilot = tokio::spawn(run_pilot(
            shared.clone(),
            cfg.clone(),
            sink.clone(),
            events_tx.clone(),
        ));
        let score = tokio::spawn(run_score_resolver(
            shared.clone(),
            cfg.clone(),
            events_tx.clone(),
        ));
        let input = {
            let shared = shared.clone();
            let cfg = cfg.clone();
            // The link poll is a bounded blocking wait
            tokio::task::spawn_blocking(move || run_input_resolver(shared, cfg, link, events_tx))
        };
        let supervisor = tokio::spawn(run_supervisor(
            shared.clone(),
            sink.clone(),
            events_rx,
            outcome_tx,
        ));

        Self {
            shared,
            cfg,
            sink,
            outcome_rx,
            pilot,
            score,
            input,
            supervisor,
        }
    }

    /// Shared state handle, the entry point for the perception adapter
    #[allow(dead_code)]
    pub fn shared(&self) -> Arc<SharedState> {
        self.shared.clone()
    }

    /// Begin a round
    pub fn start_match(&self) {
        start_match(&self.shared, &self.cfg, self.sink.as_ref());
    }

    /// Watcher over the terminal outcome of the current match
    pub fn outcome(&self) -> watch::Receiver<Option<MatchOutcome>> {
        self.outcome_rx.clone()
    }

    /// Whether shutdown has been requested (by abort or by us)
    #[allow(dead_code)]
    pub fn is_active(&self) -> bool {
        self.shared.game_active()
    }

    /// Signal shutdown, flush a final land command, join all tasks
    pub async fn shutdown(self) {
        info!("Runtime shutdown requested");
        self.shared.set_match_active(false);
        self.shared.request_shutdown();
        self.sink.land();
        // Grace period for the transport to execute the land
        tokio::time::sleep(self.cfg.shutdown_grace).await;

        let _ = self.pilot.await;
        let _ = self.score.await;
        let _ = self.input.await;
        let _ = self.supervisor.await;
        info!("Runtime stopped");
    }
}
