//! Score resolution: drains hit and hill-capture intents into life
//! counters and terminal match events
//!
//! All mutation of a side's combat fields happens inside SharedState's
//! per-side critical sections; this task only decides what the claimed
//! intents mean. The hill-capture counter lives here, task-local, so no
//! other loop can touch it.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::game::events::MatchEvent;
use crate::game::state::{SharedState, Side};

/// Intent drain logic, separated from the task loop for testing
pub struct ScoreResolver {
    shared: Arc<SharedState>,
    cfg: GameConfig,
    events: UnboundedSender<MatchEvent>,
    hill_count: u32,
    win_announced: bool,
}

impl ScoreResolver {
    pub fn new(
        shared: Arc<SharedState>,
        cfg: GameConfig,
        events: UnboundedSender<MatchEvent>,
    ) -> Self {
        Self {
            shared,
            cfg,
            events,
            hill_count: 0,
            win_announced: false,
        }
    }

    #[allow(dead_code)]
    pub fn hill_count(&self) -> u32 {
        self.hill_count
    }

    /// Start a fresh match tally
    pub fn reset(&mut self) {
        self.hill_count = 0;
        self.win_announced = false;
    }

    /// One drain cycle over both sides' pending intents
    pub fn drain(&mut self) {
        for side in [Side::Drone, Side::Enemy] {
            if let Some(remaining) = self.shared.resolve_lose_score(side) {
                debug!("{} took a hit, life now {}", side, remaining);
                if remaining == 0 {
                    // The life > 0 guard in resolve_lose_score makes this
                    // transition fire exactly once per match
                    info!("{} eliminated", side);
                    let _ = self.events.send(MatchEvent::SideEliminated(side));
                }
            }
        }

        if self.shared.resolve_add_score(Side::Drone) {
            self.hill_count += 1;
            info!(
                "Drone captured the hill ({}/{})",
                self.hill_count, self.cfg.hill_win_threshold
            );
            if !self.win_announced && self.hill_count >= self.cfg.hill_win_threshold {
                self.win_announced = true;
                let _ = self.events.send(MatchEvent::DroneWins);
            }
        }
    }
}

/// Cyclic score task: drain intents at a fixed cadence while the game
/// is active
pub async fn run_score_resolver(
    shared: Arc<SharedState>,
    cfg: GameConfig,
    events: UnboundedSender<MatchEvent>,
) {
    let mut resolver = ScoreResolver::new(shared.clone(), cfg.clone(), events);
    let mut ticker = interval(cfg.score_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        "Score resolver started at {} ms cadence",
        cfg.score_interval.as_millis()
    );

    let mut epoch = shared.match_epoch();
    while shared.game_active() {
        ticker.tick().await;

        // Fresh tally for each match reset
        let now = shared.match_epoch();
        if now != epoch {
            resolver.reset();
            epoch = now;
        }

        if shared.match_active() {
            resolver.drain();
        }
    }

    info!("Score resolver stopped");
}
