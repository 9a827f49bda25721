/// Hill targeting constants - distances come from the perception layer in cm
pub mod hill {
    /// Closer than this the drone is considered on top of the hill
    pub const MIN_DISTANCE_CM: i32 = 10;
    /// Beyond this a hill sighting is too far to act on
    pub const MAX_DISTANCE_CM: i32 = 50;
}

/// Enemy targeting constants
pub mod enemy {
    /// Safety interlock distance - closer than this always triggers full retreat
    pub const MIN_DISTANCE_CM: i32 = 20;
    /// Inside [MIN, SHOOTING) the drone may engage
    pub const SHOOTING_DISTANCE_CM: i32 = 30;
    /// Beyond this an enemy sighting is ignored
    pub const MAX_DISTANCE_CM: i32 = 50;
}

/// Flight control gains and tolerances
pub mod control {
    /// Horizontal offset (pixels) below which a target counts as centered
    pub const ERROR_FROM_CENTER_PX: i32 = 5;
    /// Yaw correction per pixel of horizontal offset
    pub const YAW_GAIN: f32 = 0.007;
    /// Forward speed scaling for hill approach
    pub const APPROACH_SPEED_GAIN: f32 = 0.5;
    /// Scan rotation rate while nothing is in sight
    pub const SEARCH_YAW_RATE: f32 = 0.3;
    /// Consecutive empty control cycles before the search gives up
    pub const SEARCH_TIMEOUT_CYCLES: u32 = 200;
    /// Control loop period while a match runs
    pub const TICK_MS: u64 = 50;
    /// Control loop period while waiting for a match to start
    pub const IDLE_TICK_MS: u64 = 200;
}

/// Weapon constants for the handheld controller
pub mod weapon {
    /// Shots per magazine
    pub const MAGAZINE_CAPACITY: u32 = 5;
    /// Minimum interval between resolved shots
    pub const SHOT_COOLDOWN_MS: u64 = 500;
    /// Delay imposed on a recharge before the magazine refills
    pub const RECHARGE_DELAY_MS: u64 = 2000;
}

/// Match scoring constants
pub mod score {
    /// Life each side starts a match with
    pub const STARTING_LIFE: u32 = 10;
    /// Hill captures needed for the drone to win
    pub const HILL_WIN_THRESHOLD: u32 = 3;
    /// Score resolver drain period
    pub const TICK_MS: u64 = 50;
}

/// Input and shutdown timing
pub mod timing {
    /// Bounded wait for the next controller event batch
    pub const INPUT_POLL_TIMEOUT_MS: u64 = 250;
    /// Retry interval while the controller is disconnected
    pub const RECONNECT_INTERVAL_MS: u64 = 1000;
    /// Grace period after shutdown is signaled, for the final land command
    pub const SHUTDOWN_GRACE_MS: u64 = 500;
}
