//! Controller input resolution: shots, recharges and the abort path
//!
//! Runs as a blocking loop (the link poll is a bounded blocking wait),
//! so the runtime hosts it on a blocking task. Ammunition is owned
//! exclusively here; no other task touches it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::game::events::MatchEvent;
use crate::game::state::SharedState;
use crate::input::controller::{ControllerBatch, ControllerLink, ControllerPoll};

/// Magazine state, bounded to `[0, capacity]`
#[derive(Debug, Clone, Copy)]
pub struct AmmoState {
    bullets_remaining: u32,
    capacity: u32,
}

impl AmmoState {
    pub fn new(capacity: u32) -> Self {
        Self {
            bullets_remaining: capacity,
            capacity,
        }
    }

    pub fn bullets_remaining(&self) -> u32 {
        self.bullets_remaining
    }

    pub fn is_empty(&self) -> bool {
        self.bullets_remaining == 0
    }

    /// Spend one bullet. False when the magazine is already empty.
    pub fn try_fire(&mut self) -> bool {
        if self.bullets_remaining > 0 {
            self.bullets_remaining -= 1;
            true
        } else {
            false
        }
    }

    /// Refill to capacity. Callers gate this on an empty magazine.
    pub fn recharge(&mut self) {
        self.bullets_remaining = self.capacity;
    }
}

/// Delay the loop must apply after handling a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverDelay {
    /// Minimum inter-shot interval after a resolved shot
    ShotCooldown,
    /// Bounded delay before the magazine refills
    Recharge,
}

/// Per-batch resolution logic, separated from the blocking loop so it
/// can be tested without sleeping
pub struct InputResolver {
    shared: Arc<SharedState>,
    cfg: GameConfig,
    events: UnboundedSender<MatchEvent>,
    ammo: AmmoState,
}

impl InputResolver {
    pub fn new(
        shared: Arc<SharedState>,
        cfg: GameConfig,
        events: UnboundedSender<MatchEvent>,
    ) -> Self {
        let ammo = AmmoState::new(cfg.magazine_capacity);
        Self {
            shared,
            cfg,
            events,
            ammo,
        }
    }

    #[allow(dead_code)]
    pub fn ammo(&self) -> &AmmoState {
        &self.ammo
    }

    /// Reset the magazine at match start
    pub fn reset(&mut self) {
        self.ammo = AmmoState::new(self.cfg.magazine_capacity);
    }

    /// Resolve one event batch. Returns the delay the loop must apply
    /// before polling again, if any.
    pub fn handle_batch(&mut self, batch: &ControllerBatch) -> Option<ResolverDelay> {
        if batch.abort {
            // The only input-side shutdown path
            info!("Abort button pressed, requesting shutdown");
            self.shared.request_shutdown();
            let _ = self.events.send(MatchEvent::Aborted);
            return None;
        }

        if !self.shared.match_active() {
            return None;
        }

        if batch.trigger && self.ammo.try_fire() {
            if batch.marker_count > 0 {
                debug!(
                    "Shot hit ({} markers), {} bullets left",
                    batch.marker_count,
                    self.ammo.bullets_remaining()
                );
                self.shared.raise_lose_score(self.cfg.player_hit_side);
            } else {
                debug!("Shot missed, {} bullets left", self.ammo.bullets_remaining());
            }
            return Some(ResolverDelay::ShotCooldown);
        }

        if self.ammo.is_empty() && batch.recharge {
            debug!("Recharge accepted");
            return Some(ResolverDelay::Recharge);
        }

        None
    }

    /// Apply a completed recharge after its bounded delay
    pub fn complete_recharge(&mut self) {
        self.ammo.recharge();
        info!("Magazine recharged to {}", self.ammo.bullets_remaining());
    }
}

/// Drop batches that queued up during a delay window. Presses made
/// during a cooldown or recharge are ignored, but an abort in the
/// backlog must still be honored.
fn discard_pending<L: ControllerLink>(link: &mut L, resolver: &mut InputResolver) {
    loop {
        match link.poll(Duration::ZERO) {
            ControllerPoll::Batch(batch) => {
                if batch.abort {
                    resolver.handle_batch(&batch);
                }
            }
            ControllerPoll::Timeout | ControllerPoll::Disconnected => break,
        }
    }
}

/// Blocking input loop: poll, resolve, apply delays, retry on disconnect
pub fn run_input_resolver<L: ControllerLink>(
    shared: Arc<SharedState>,
    cfg: GameConfig,
    mut link: L,
    events: UnboundedSender<MatchEvent>,
) {
    let mut resolver = InputResolver::new(shared.clone(), cfg.clone(), events);
    let mut connected = true;
    let mut epoch = shared.match_epoch();

    info!(
        "Input resolver started, magazine capacity {}",
        cfg.magazine_capacity
    );

    while shared.game_active() {
        match link.poll(cfg.input_poll_timeout) {
            ControllerPoll::Batch(batch) => {
                if !connected {
                    info!("Controller reconnected");
                    connected = true;
                }
                // Fresh magazine for each match reset
                let now = shared.match_epoch();
                if now != epoch {
                    resolver.reset();
                    epoch = now;
                }
                match resolver.handle_batch(&batch) {
                    Some(ResolverDelay::ShotCooldown) => {
                        std::thread::sleep(cfg.shot_cooldown);
                        discard_pending(&mut link, &mut resolver);
                    }
                    Some(ResolverDelay::Recharge) => {
                        std::thread::sleep(cfg.recharge_delay);
                        resolver.complete_recharge();
                        discard_pending(&mut link, &mut resolver);
                    }
                    None => {}
                }
            }
            ControllerPoll::Timeout => {}
            ControllerPoll::Disconnected => {
                // Fail-safe: no events can be produced while disconnected.
                // Bounded retry keeps the shutdown check reachable.
                if connected {
                    warn!("Controller disconnected, retrying every {:?}", cfg.reconnect_interval);
                    connected = false;
                }
                std::thread::sleep(cfg.reconnect_interval);
            }
        }
    }

    info!("Input resolver stopped");
}
