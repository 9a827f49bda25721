//! Target prioritization and flight command generation
//!
//! The decision core is a pure step function re-evaluated every control
//! cycle from the latest sighting snapshot; the only state carried
//! between cycles is the mode (for edge-triggered intents) and the
//! search-timeout counter. `run_pilot` wraps the step in the cyclic
//! control task.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::control::command::{CommandSink, FlightCommand};
use crate::game::events::MatchEvent;
use crate::game::state::{SharedState, Side, Sighting, Sightings};

/// Behavior the pilot settled on this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PilotMode {
    /// No match running
    Idle,
    /// Closing in on the hill
    Approaching,
    /// Stationary over the hill
    HoldingHill,
    /// Enemy inside the safety distance, backing off
    Retreating,
    /// Enemy inside the engagement band
    Engaging,
    /// Enemy in sight beyond shooting range, tracking only
    Standoff,
    /// Nothing in sight, scanning
    Searching,
    /// Search exhausted, holding on the ground
    Landed,
}

/// Effects a step wants published besides the flight command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PilotIntent {
    /// The drone arrived over the hill (raised once per arrival)
    HillReached,
    /// The enemy is centered inside the engagement band (once per acquisition)
    EnemyEngaged,
    /// The search ran out of cycles
    TargetLost,
}

/// Output of one decision cycle
#[derive(Debug, Clone, Copy)]
pub struct StepOutput {
    pub command: FlightCommand,
    pub intent: Option<PilotIntent>,
}

/// Carry-over state between decision cycles
#[derive(Debug)]
pub struct PilotState {
    mode: PilotMode,
    /// Consecutive cycles with nothing actionable in sight
    empty_cycles: u32,
    /// Engagement intent latch, cleared when the enemy leaves center
    engaged: bool,
}

impl PilotState {
    pub fn new() -> Self {
        Self {
            mode: PilotMode::Idle,
            empty_cycles: 0,
            engaged: false,
        }
    }

    #[allow(dead_code)]
    pub fn mode(&self) -> PilotMode {
        self.mode
    }

    /// Forget all carried state, used when a match ends
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Yaw correction that re-centers a target, proportional to its
    /// horizontal offset
    fn yaw_correction(sighting: &Sighting, cfg: &GameConfig) -> f32 {
        (sighting.offset_px as f32 * cfg.yaw_gain).clamp(-1.0, 1.0)
    }

    /// One decision cycle. Hill takes priority over enemy; a target
    /// beyond its maximum distance is treated as not in sight.
    pub fn step(&mut self, sightings: &Sightings, cfg: &GameConfig) -> StepOutput {
        let hill = &sightings.hill;
        if hill.in_sight && hill.distance_cm < cfg.hill_max_distance {
            self.empty_cycles = 0;
            self.engaged = false;
            if hill.distance_cm <= cfg.hill_min_distance {
                // Edge-triggered: score once per arrival, not once per cycle
                let intent =
                    (self.mode != PilotMode::HoldingHill).then_some(PilotIntent::HillReached);
                self.mode = PilotMode::HoldingHill;
                return StepOutput {
                    command: FlightCommand::hover(),
                    intent,
                };
            }
            self.mode = PilotMode::Approaching;
            // Forward speed grows as the hill gets closer within the band
            let band = (cfg.hill_max_distance - cfg.hill_min_distance) as f32;
            let closeness = (cfg.hill_max_distance - hill.distance_cm) as f32 / band;
            let theta = (-cfg.approach_speed_gain * closeness).clamp(-1.0, 0.0);
            return StepOutput {
                command: FlightCommand::new(false, 0.0, theta, 0.0, Self::yaw_correction(hill, cfg)),
                intent: None,
            };
        }

        let enemy = &sightings.enemy;
        if enemy.in_sight && enemy.distance_cm < cfg.enemy_max_distance {
            self.empty_cycles = 0;
            if enemy.distance_cm < cfg.enemy_min_distance {
                // Safety interlock: always full retreat, never engage
                self.mode = PilotMode::Retreating;
                self.engaged = false;
                return StepOutput {
                    command: FlightCommand::full_retreat(),
                    intent: None,
                };
            }
            let yaw = Self::yaw_correction(enemy, cfg);
            if enemy.distance_cm < cfg.enemy_shooting_distance {
                self.mode = PilotMode::Engaging;
                let centered = enemy.offset_px.abs() <= cfg.error_from_center_tolerance;
                let intent = (centered && !self.engaged).then_some(PilotIntent::EnemyEngaged);
                self.engaged = centered;
                return StepOutput {
                    command: FlightCommand::yaw_only(yaw),
                    intent,
                };
            }
            // Maintain stand-off: track the target, no translation
            self.mode = PilotMode::Standoff;
            self.engaged = false;
            return StepOutput {
                command: FlightCommand::yaw_only(yaw),
                intent: None,
            };
        }

        // Nothing actionable in sight: scan, give up after the cycle budget
        self.engaged = false;
        self.empty_cycles = self.empty_cycles.saturating_add(1);
        if self.empty_cycles >= cfg.search_timeout_cycles {
            let intent = (self.mode != PilotMode::Landed).then_some(PilotIntent::TargetLost);
            self.mode = PilotMode::Landed;
            return StepOutput {
                command: FlightCommand::hover(),
                intent,
            };
        }
        self.mode = PilotMode::Searching;
        StepOutput {
            command: FlightCommand::yaw_only(cfg.search_yaw_rate),
            intent: None,
        }
    }
}

impl Default for PilotState {
    fn default() -> Self {
        Self::new()
    }
}

/// Cyclic control task: decide, command, publish intents
///
/// Runs while the game is active. Between matches it emits one land and
/// hover and idles at a low poll rate; during a match it ticks at the
/// control interval, claims the drone's wounded flag (exactly once per
/// wound) and feeds each decision to the command sink.
pub async fn run_pilot(
    shared: Arc<SharedState>,
    cfg: GameConfig,
    sink: Arc<dyn CommandSink>,
    events: UnboundedSender<MatchEvent>,
) {
    let mut pilot = PilotState::new();
    let mut ticker = interval(cfg.control_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        "Pilot loop started at {} ms cadence",
        cfg.control_interval.as_millis()
    );

    let mut idle_announced = false;
    let mut epoch = shared.match_epoch();
    while shared.game_active() {
        if !shared.match_active() {
            if !idle_announced {
                sink.send_command(&FlightCommand::hover());
                sink.land();
                pilot.reset();
                idle_announced = true;
                debug!("Pilot idle, waiting for match start");
            }
            tokio::time::sleep(cfg.idle_interval).await;
            continue;
        }
        idle_announced = false;
        ticker.tick().await;

        // Fresh decision state for each match reset, even when the
        // restart lands between two ticks and the idle branch never runs
        let now = shared.match_epoch();
        if now != epoch {
            pilot.reset();
            epoch = now;
        }

        // Wound acknowledgment happens every cycle regardless of branch
        if shared.claim_wounded(Side::Drone) {
            sink.play_hit_animation();
        }

        let snapshot = shared.sightings();
        let output = pilot.step(&snapshot, &cfg);
        sink.send_command(&output.command);

        match output.intent {
            Some(PilotIntent::HillReached) => {
                debug!("Hill reached, raising add-score intent");
                shared.raise_add_score(Side::Drone);
            }
            Some(PilotIntent::EnemyEngaged) => {
                debug!("Enemy centered in engagement band, raising hit intent");
                shared.raise_lose_score(Side::Enemy);
            }
            Some(PilotIntent::TargetLost) => {
                info!("Search exhausted after {} cycles", cfg.search_timeout_cycles);
                sink.land();
                let _ = events.send(MatchEvent::TargetLost);
            }
            None => {}
        }
    }

    info!("Pilot loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> GameConfig {
        GameConfig::default()
    }

    fn sightings(hill: Option<(i32, i32)>, enemy: Option<(i32, i32)>) -> Sightings {
        let to_sighting = |fields: Option<(i32, i32)>| match fields {
            Some((distance_cm, offset_px)) => Sighting {
                in_sight: true,
                distance_cm,
                offset_px,
            },
            None => Sighting::default(),
        };
        Sightings {
            hill: to_sighting(hill),
            enemy: to_sighting(enemy),
        }
    }

    #[test]
    fn test_hill_approach_moves_forward() {
        let mut pilot = PilotState::new();
        let out = pilot.step(&sightings(Some((30, 0)), None), &cfg());
        assert_eq!(pilot.mode(), PilotMode::Approaching);
        assert!(!out.command.hover);
        assert!(out.command.theta < 0.0);
        assert_eq!(out.command.yaw, 0.0);
        assert!(out.intent.is_none());
    }

    #[test]
    fn test_hill_approach_speeds_up_when_closer() {
        let mut pilot = PilotState::new();
        let far = pilot.step(&sightings(Some((45, 0)), None), &cfg());
        let near = pilot.step(&sightings(Some((15, 0)), None), &cfg());
        assert!(near.command.theta < far.command.theta);
    }

    #[test]
    fn test_hill_approach_yaw_follows_offset() {
        let mut pilot = PilotState::new();
        let right = pilot.step(&sightings(Some((30, 100)), None), &cfg());
        assert!(right.command.yaw > 0.0);
        let left = pilot.step(&sightings(Some((30, -100)), None), &cfg());
        assert!(left.command.yaw < 0.0);
        // Huge offsets stay clamped
        let extreme = pilot.step(&sightings(Some((30, 10_000)), None), &cfg());
        assert_eq!(extreme.command.yaw, 1.0);
    }

    #[test]
    fn test_hill_arrival_scores_exactly_once() {
        let mut pilot = PilotState::new();
        let first = pilot.step(&sightings(Some((5, 0)), None), &cfg());
        assert_eq!(pilot.mode(), PilotMode::HoldingHill);
        assert!(first.command.hover);
        assert_eq!(first.command.theta, 0.0);
        assert_eq!(first.intent, Some(PilotIntent::HillReached));

        // Hovering over the hill must not re-raise the intent
        for _ in 0..10 {
            let again = pilot.step(&sightings(Some((5, 0)), None), &cfg());
            assert!(again.intent.is_none());
        }
    }

    #[test]
    fn test_hill_rearrival_scores_again() {
        let mut pilot = PilotState::new();
        assert!(pilot.step(&sightings(Some((5, 0)), None), &cfg()).intent.is_some());
        // Drift away, then come back
        pilot.step(&sightings(Some((30, 0)), None), &cfg());
        let back = pilot.step(&sightings(Some((5, 0)), None), &cfg());
        assert_eq!(back.intent, Some(PilotIntent::HillReached));
    }

    #[test]
    fn test_hill_priority_over_enemy() {
        let mut pilot = PilotState::new();
        // Enemy dangerously close, but a hill in range wins the branch
        let out = pilot.step(&sightings(Some((30, 0)), Some((5, 0))), &cfg());
        assert_eq!(pilot.mode(), PilotMode::Approaching);
        assert!(out.command.theta < 0.0);
    }

    #[test]
    fn test_hill_beyond_max_falls_through() {
        let mut pilot = PilotState::new();
        let out = pilot.step(&sightings(Some((80, 0)), Some((40, 0))), &cfg());
        assert_eq!(pilot.mode(), PilotMode::Standoff);
        assert_eq!(out.command.theta, 0.0);
    }

    #[test]
    fn test_retreat_interlock_dominates_engagement() {
        let mut pilot = PilotState::new();
        // Centered and inside the safety distance: retreat, never engage
        let out = pilot.step(&sightings(None, Some((10, 0))), &cfg());
        assert_eq!(pilot.mode(), PilotMode::Retreating);
        assert_eq!(out.command.theta, 1.0);
        assert_eq!(out.command.yaw, 0.0);
        assert!(out.intent.is_none());
    }

    #[test]
    fn test_engagement_requires_centering() {
        let mut pilot = PilotState::new();
        let off_center = pilot.step(&sightings(None, Some((25, 40))), &cfg());
        assert_eq!(pilot.mode(), PilotMode::Engaging);
        assert!(off_center.command.yaw > 0.0);
        assert!(off_center.intent.is_none());

        let centered = pilot.step(&sightings(None, Some((25, 0))), &cfg());
        assert_eq!(centered.intent, Some(PilotIntent::EnemyEngaged));
    }

    #[test]
    fn test_engagement_intent_is_edge_triggered() {
        let mut pilot = PilotState::new();
        assert!(pilot.step(&sightings(None, Some((25, 0))), &cfg()).intent.is_some());
        // Staying centered does not re-raise
        assert!(pilot.step(&sightings(None, Some((25, 2))), &cfg()).intent.is_none());
        // Losing and regaining center re-arms the latch
        pilot.step(&sightings(None, Some((25, 60))), &cfg());
        assert!(pilot.step(&sightings(None, Some((25, 0))), &cfg()).intent.is_some());
    }

    #[test]
    fn test_standoff_tracks_without_translation() {
        let mut pilot = PilotState::new();
        let out = pilot.step(&sightings(None, Some((40, 30))), &cfg());
        assert_eq!(pilot.mode(), PilotMode::Standoff);
        assert_eq!(out.command.theta, 0.0);
        assert_eq!(out.command.gaz, 0.0);
        assert!(out.command.yaw > 0.0);
    }

    #[test]
    fn test_nothing_in_sight_searches() {
        let mut pilot = PilotState::new();
        let out = pilot.step(&sightings(None, None), &cfg());
        assert_eq!(pilot.mode(), PilotMode::Searching);
        assert_eq!(out.command.yaw, cfg().search_yaw_rate);
    }

    #[test]
    fn test_search_timeout_lands_once() {
        let mut custom = cfg();
        custom.search_timeout_cycles = 3;
        let mut pilot = PilotState::new();
        assert!(pilot.step(&sightings(None, None), &custom).intent.is_none());
        assert!(pilot.step(&sightings(None, None), &custom).intent.is_none());
        let third = pilot.step(&sightings(None, None), &custom);
        assert_eq!(third.intent, Some(PilotIntent::TargetLost));
        assert!(third.command.hover);
        assert_eq!(pilot.mode(), PilotMode::Landed);
        // Further empty cycles stay landed without repeating the event
        assert!(pilot.step(&sightings(None, None), &custom).intent.is_none());
    }

    #[test]
    fn test_sighting_resets_search_counter() {
        let mut custom = cfg();
        custom.search_timeout_cycles = 3;
        let mut pilot = PilotState::new();
        pilot.step(&sightings(None, None), &custom);
        pilot.step(&sightings(None, None), &custom);
        pilot.step(&sightings(Some((30, 0)), None), &custom);
        // Counter restarted, so two more empty cycles do not time out
        assert!(pilot.step(&sightings(None, None), &custom).intent.is_none());
        assert!(pilot.step(&sightings(None, None), &custom).intent.is_none());
    }

    async fn wait_for_add_score(shared: &SharedState) {
        for _ in 0..200 {
            if shared.resolve_add_score(Side::Drone) {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("hill arrival was never scored");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_restart_between_ticks_rescores_hill_arrival() {
        use crate::control::command::LoggingSink;
        use crate::game::state::Target;
        use std::time::Duration;
        use tokio::sync::mpsc::unbounded_channel;

        let cfg = GameConfig {
            control_interval: Duration::from_millis(5),
            idle_interval: Duration::from_millis(5),
            ..GameConfig::default()
        };
        let shared = Arc::new(SharedState::new(cfg.starting_life));
        let (tx, _rx) = unbounded_channel();
        shared.reset_for_match(cfg.starting_life);
        shared.set_match_active(true);
        shared.report_sighting(Target::Hill, true, Some(5), Some(0));

        let task = tokio::spawn(run_pilot(
            shared.clone(),
            cfg.clone(),
            Arc::new(LoggingSink),
            tx,
        ));

        wait_for_add_score(&shared).await;

        // End and restart the match faster than one control tick, so the
        // loop never sees the idle gap between the two matches
        shared.set_match_active(false);
        shared.reset_for_match(cfg.starting_life);
        shared.set_match_active(true);
        shared.report_sighting(Target::Hill, true, Some(5), Some(0));

        // The new match's first arrival over the hill must score again
        wait_for_add_score(&shared).await;

        shared.request_shutdown();
        let _ = task.await;
    }

    #[test]
    fn test_stale_fields_ignored_when_not_in_sight() {
        let mut pilot = PilotState::new();
        // distance/offset hold stale values but in_sight is false
        let snapshot = Sightings {
            hill: Sighting {
                in_sight: false,
                distance_cm: 5,
                offset_px: 0,
            },
            enemy: Sighting {
                in_sight: false,
                distance_cm: 10,
                offset_px: 0,
            },
        };
        let out = pilot.step(&snapshot, &cfg());
        assert_eq!(pilot.mode(), PilotMode::Searching);
        assert!(out.intent.is_none());
    }
}
