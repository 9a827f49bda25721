//! Match lifecycle: start/end transitions and terminal-event handling
//!
//! The supervisor is the sole writer of `match_active`. Terminal events
//! from the three loops funnel through one channel; the first one ends
//! the match, later stragglers for the same match are ignored.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;
use tracing::info;

use crate::config::GameConfig;
use crate::control::command::CommandSink;
use crate::game::events::{EndReason, MatchEvent, MatchOutcome};
use crate::game::state::{SharedState, Side};

/// Reset all match-scoped state and begin a round
pub fn start_match(shared: &SharedState, cfg: &GameConfig, sink: &dyn CommandSink) {
    shared.reset_for_match(cfg.starting_life);
    sink.take_off();
    shared.set_match_active(true);
    info!(
        "Match started: life {}, win at {} hill captures",
        cfg.starting_life, cfg.hill_win_threshold
    );
}

fn end_reason(event: MatchEvent) -> EndReason {
    match event {
        MatchEvent::SideEliminated(Side::Drone) => EndReason::EnemyWins,
        MatchEvent::SideEliminated(Side::Enemy) => EndReason::DroneWins,
        MatchEvent::DroneWins => EndReason::DroneWins,
        MatchEvent::TargetLost => EndReason::TargetLost,
        MatchEvent::Aborted => EndReason::Aborted,
    }
}

fn end_match(
    shared: &SharedState,
    sink: &dyn CommandSink,
    outcome_tx: &watch::Sender<Option<MatchOutcome>>,
    reason: EndReason,
) {
    shared.set_match_active(false);
    sink.land();
    let outcome = MatchOutcome {
        reason,
        drone_life: shared.life(Side::Drone),
        enemy_life: shared.life(Side::Enemy),
    };
    info!("Match over: {:?}", outcome);
    let _ = outcome_tx.send(Some(outcome));
}

/// Supervisor task: consume match events until every producer is gone
pub async fn run_supervisor(
    shared: Arc<SharedState>,
    sink: Arc<dyn CommandSink>,
    mut events: UnboundedReceiver<MatchEvent>,
    outcome_tx: watch::Sender<Option<MatchOutcome>>,
) {
    info!("Match supervisor started");
    while let Some(event) = events.recv().await {
        let reason = end_reason(event);
        // Only the first terminal event of a match ends it; an abort is
        // honored regardless because it also stops the whole process
        if shared.match_active() || reason == EndReason::Aborted {
            end_match(&shared, sink.as_ref(), &outcome_tx, reason);
        }
    }
    info!("Match supervisor stopped");
}
