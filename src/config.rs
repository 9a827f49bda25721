use std::time::Duration;

use crate::game::constants::{control, enemy, hill, score, timing, weapon};
use crate::game::state::Side;

/// Game configuration
///
/// Distances are centimeters as estimated by the perception layer,
/// offsets are pixels from image center.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Below this hill distance the drone is on the hill
    pub hill_min_distance: i32,
    /// Beyond this hill distance the sighting is ignored
    pub hill_max_distance: i32,
    /// Safety interlock distance for the enemy
    pub enemy_min_distance: i32,
    /// Upper bound (exclusive) of the engagement band
    pub enemy_shooting_distance: i32,
    /// Beyond this enemy distance the sighting is ignored
    pub enemy_max_distance: i32,
    /// Horizontal offset tolerance for "centered"
    pub error_from_center_tolerance: i32,
    /// Yaw correction per pixel of offset
    pub yaw_gain: f32,
    /// Forward speed scaling during hill approach
    pub approach_speed_gain: f32,
    /// Scan rotation rate while searching
    pub search_yaw_rate: f32,
    /// Empty control cycles before the search gives up
    pub search_timeout_cycles: u32,
    /// Shots per magazine
    pub magazine_capacity: u32,
    /// Life each side starts with
    pub starting_life: u32,
    /// Hill captures needed for the drone to win
    pub hill_win_threshold: u32,
    /// Which side a registered player hit counts against
    pub player_hit_side: Side,
    /// Control loop period while a match runs
    pub control_interval: Duration,
    /// Control loop period while idle between matches
    pub idle_interval: Duration,
    /// Score resolver drain period
    pub score_interval: Duration,
    /// Bounded wait for the next controller batch
    pub input_poll_timeout: Duration,
    /// Minimum interval between resolved shots
    pub shot_cooldown: Duration,
    /// Delay before a recharge refills the magazine
    pub recharge_delay: Duration,
    /// Retry interval while the controller is disconnected
    pub reconnect_interval: Duration,
    /// Grace period for the final land command on shutdown
    pub shutdown_grace: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            hill_min_distance: hill::MIN_DISTANCE_CM,
            hill_max_distance: hill::MAX_DISTANCE_CM,
            enemy_min_distance: enemy::MIN_DISTANCE_CM,
            enemy_shooting_distance: enemy::SHOOTING_DISTANCE_CM,
            enemy_max_distance: enemy::MAX_DISTANCE_CM,
            error_from_center_tolerance: control::ERROR_FROM_CENTER_PX,
            yaw_gain: control::YAW_GAIN,
            approach_speed_gain: control::APPROACH_SPEED_GAIN,
            search_yaw_rate: control::SEARCH_YAW_RATE,
            search_timeout_cycles: control::SEARCH_TIMEOUT_CYCLES,
            magazine_capacity: weapon::MAGAZINE_CAPACITY,
            starting_life: score::STARTING_LIFE,
            hill_win_threshold: score::HILL_WIN_THRESHOLD,
            player_hit_side: Side::Drone,
            control_interval: Duration::from_millis(control::TICK_MS),
            idle_interval: Duration::from_millis(control::IDLE_TICK_MS),
            score_interval: Duration::from_millis(score::TICK_MS),
            input_poll_timeout: Duration::from_millis(timing::INPUT_POLL_TIMEOUT_MS),
            shot_cooldown: Duration::from_millis(weapon::SHOT_COOLDOWN_MS),
            recharge_delay: Duration::from_millis(weapon::RECHARGE_DELAY_MS),
            reconnect_interval: Duration::from_millis(timing::RECONNECT_INTERVAL_MS),
            shutdown_grace: Duration::from_millis(timing::SHUTDOWN_GRACE_MS),
        }
    }
}

fn env_i32(name: &str, slot: &mut i32) {
    if let Ok(raw) = std::env::var(name) {
        if let Ok(parsed) = raw.parse::<i32>() {
            *slot = parsed;
        } else {
            tracing::warn!("Invalid {} '{}', using default", name, raw);
        }
    }
}

fn env_u32(name: &str, slot: &mut u32) {
    if let Ok(raw) = std::env::var(name) {
        if let Ok(parsed) = raw.parse::<u32>() {
            *slot = parsed;
        } else {
            tracing::warn!("Invalid {} '{}', using default", name, raw);
        }
    }
}

fn env_f32(name: &str, slot: &mut f32) {
    if let Ok(raw) = std::env::var(name) {
        if let Ok(parsed) = raw.parse::<f32>() {
            *slot = parsed;
        } else {
            tracing::warn!("Invalid {} '{}', using default", name, raw);
        }
    }
}

fn env_millis(name: &str, slot: &mut Duration) {
    if let Ok(raw) = std::env::var(name) {
        if let Ok(parsed) = raw.parse::<u64>() {
            *slot = Duration::from_millis(parsed);
        } else {
            tracing::warn!("Invalid {} '{}', using default", name, raw);
        }
    }
}

impl GameConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        env_i32("HILL_MIN_DISTANCE", &mut config.hill_min_distance);
        env_i32("HILL_MAX_DISTANCE", &mut config.hill_max_distance);
        env_i32("ENEMY_MIN_DISTANCE", &mut config.enemy_min_distance);
        env_i32("ENEMY_SHOOTING_DISTANCE", &mut config.enemy_shooting_distance);
        env_i32("ENEMY_MAX_DISTANCE", &mut config.enemy_max_distance);
        env_i32(
            "ERROR_FROM_CENTER_TOLERANCE",
            &mut config.error_from_center_tolerance,
        );
        env_u32("MAGAZINE_CAPACITY", &mut config.magazine_capacity);
        env_u32("STARTING_LIFE", &mut config.starting_life);
        env_u32("HILL_WIN_THRESHOLD", &mut config.hill_win_threshold);
        env_u32("SEARCH_TIMEOUT_CYCLES", &mut config.search_timeout_cycles);
        env_f32("YAW_GAIN", &mut config.yaw_gain);
        env_f32("APPROACH_SPEED_GAIN", &mut config.approach_speed_gain);
        env_f32("SEARCH_YAW_RATE", &mut config.search_yaw_rate);
        env_millis("CONTROL_INTERVAL_MS", &mut config.control_interval);
        env_millis("IDLE_INTERVAL_MS", &mut config.idle_interval);
        env_millis("SCORE_INTERVAL_MS", &mut config.score_interval);
        env_millis("INPUT_POLL_TIMEOUT_MS", &mut config.input_poll_timeout);
        env_millis("SHOT_COOLDOWN_MS", &mut config.shot_cooldown);
        env_millis("RECHARGE_DELAY_MS", &mut config.recharge_delay);
        env_millis("RECONNECT_INTERVAL_MS", &mut config.reconnect_interval);
        env_millis("SHUTDOWN_GRACE_MS", &mut config.shutdown_grace);

        if let Ok(raw) = std::env::var("PLAYER_HIT_SIDE") {
            match raw.to_ascii_lowercase().as_str() {
                "drone" => config.player_hit_side = Side::Drone,
                "enemy" => config.player_hit_side = Side::Enemy,
                _ => tracing::warn!("Invalid PLAYER_HIT_SIDE '{}', using default", raw),
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hill_min_distance <= 0 || self.hill_max_distance <= self.hill_min_distance {
            return Err(ConfigError::Distances(
                "hill distances must satisfy 0 < min < max",
            ));
        }
        if self.enemy_min_distance <= 0
            || self.enemy_shooting_distance <= self.enemy_min_distance
            || self.enemy_max_distance <= self.enemy_shooting_distance
        {
            return Err(ConfigError::Distances(
                "enemy distances must satisfy 0 < min < shooting < max",
            ));
        }
        if self.error_from_center_tolerance < 0 {
            return Err(ConfigError::Distances("center tolerance cannot be negative"));
        }
        if self.magazine_capacity == 0 {
            return Err(ConfigError::Counters("magazine_capacity must be at least 1"));
        }
        if self.starting_life == 0 {
            return Err(ConfigError::Counters("starting_life must be at least 1"));
        }
        if self.hill_win_threshold == 0 {
            return Err(ConfigError::Counters("hill_win_threshold must be at least 1"));
        }
        if self.search_timeout_cycles == 0 {
            return Err(ConfigError::Counters(
                "search_timeout_cycles must be at least 1",
            ));
        }
        if self.control_interval.is_zero() || self.score_interval.is_zero() {
            return Err(ConfigError::Timing("loop intervals must be non-zero"));
        }
        if self.input_poll_timeout.is_zero() {
            return Err(ConfigError::Timing(
                "input_poll_timeout must be non-zero so shutdown can be observed",
            ));
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid distance configuration: {0}")]
    Distances(&'static str),
    #[error("invalid counter configuration: {0}")]
    Counters(&'static str),
    #[error("invalid timing configuration: {0}")]
    Timing(&'static str),
}
