//! Shared game state - the single source of truth for all loops
//!
//! Lifecycle flags are atomics, the sighting snapshot sits behind a
//! single-writer RwLock, and each side's combat fields share one mutex
//! because they are always read-modify-written together. Locks never
//! nest across sides.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

/// One of the two competitors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The quadrotor
    Drone,
    /// The human-controlled player
    Enemy,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Drone => write!(f, "drone"),
            Side::Enemy => write!(f, "enemy"),
        }
    }
}

/// A target the perception layer can report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Hill,
    Enemy,
}

/// Latest perception result for one target
///
/// `distance_cm` and `offset_px` are meaningless while `in_sight` is
/// false and must not influence any decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sighting {
    pub in_sight: bool,
    pub distance_cm: i32,
    pub offset_px: i32,
}

/// Per-frame sighting snapshot for both targets
#[derive(Debug, Clone, Copy, Default)]
pub struct Sightings {
    pub hill: Sighting,
    pub enemy: Sighting,
}

/// Combat fields for one side, mutated only under that side's lock
#[derive(Debug, Clone, Copy)]
pub struct SideState {
    /// Remaining life, only ever decreases within a match
    pub life: u32,
    /// Pending hit not yet acknowledged by the drone logic
    pub wounded: bool,
    /// Hill reached this cycle, not yet counted
    pub pending_add_score: bool,
    /// Hit registered against this side, not yet applied to life
    pub pending_lose_score: bool,
}

impl SideState {
    fn new(life: u32) -> Self {
        Self {
            life,
            wounded: false,
            pending_add_score: false,
            pending_lose_score: false,
        }
    }
}

/// Shared state handle injected into every task
pub struct SharedState {
    game_active: AtomicBool,
    match_active: AtomicBool,
    /// Bumped on every match reset, so tasks with match-scoped private
    /// state (ammo, tallies) can detect a new match without extra wiring
    match_epoch: AtomicU64,
    sightings: RwLock<Sightings>,
    drone: Mutex<SideState>,
    enemy: Mutex<SideState>,
}

impl SharedState {
    pub fn new(starting_life: u32) -> Self {
        Self {
            game_active: AtomicBool::new(true),
            match_active: AtomicBool::new(false),
            match_epoch: AtomicU64::new(0),
            sightings: RwLock::new(Sightings::default()),
            drone: Mutex::new(SideState::new(starting_life)),
            enemy: Mutex::new(SideState::new(starting_life)),
        }
    }

    fn side(&self, side: Side) -> &Mutex<SideState> {
        match side {
            Side::Drone => &self.drone,
            Side::Enemy => &self.enemy,
        }
    }

    // --- lifecycle flags ---

    pub fn game_active(&self) -> bool {
        self.game_active.load(Ordering::Acquire)
    }

    /// Begin process-wide shutdown. Monotonic: never re-asserted.
    pub fn request_shutdown(&self) {
        self.game_active.store(false, Ordering::Release);
    }

    pub fn match_active(&self) -> bool {
        self.match_active.load(Ordering::Acquire)
    }

    pub(crate) fn set_match_active(&self, active: bool) {
        self.match_active.store(active, Ordering::Release);
    }

    /// Counter identifying the current match reset generation
    pub fn match_epoch(&self) -> u64 {
        self.match_epoch.load(Ordering::Acquire)
    }

    // --- sighting snapshot ---

    /// Perception adapter entry point, called once per processed frame.
    ///
    /// A sighting with a missing distance or offset is recorded as not
    /// in sight: the control loop never acts on partial data.
    pub fn report_sighting(
        &self,
        target: Target,
        in_sight: bool,
        distance_cm: Option<i32>,
        offset_px: Option<i32>,
    ) {
        let sighting = match (in_sight, distance_cm, offset_px) {
            (true, Some(distance_cm), Some(offset_px)) => Sighting {
                in_sight: true,
                distance_cm,
                offset_px,
            },
            (true, _, _) => {
                tracing::warn!("Sighting for {:?} missing distance or offset, dropped", target);
                Sighting::default()
            }
            (false, _, _) => Sighting::default(),
        };

        let mut snapshot = self.sightings.write();
        match target {
            Target::Hill => snapshot.hill = sighting,
            Target::Enemy => snapshot.enemy = sighting,
        }
    }

    /// Copy of the latest snapshot. A decision cycle works on this copy,
    /// never on live fields, so it cannot mix two frames.
    pub fn sightings(&self) -> Sightings {
        *self.sightings.read()
    }

    // --- combat state ---

    pub fn life(&self, side: Side) -> u32 {
        self.side(side).lock().life
    }

    /// Raise a "hill reached" intent for a side.
    pub fn raise_add_score(&self, side: Side) {
        self.side(side).lock().pending_add_score = true;
    }

    /// Raise a "hit registered" intent against a side.
    pub fn raise_lose_score(&self, side: Side) {
        self.side(side).lock().pending_lose_score = true;
    }

    /// Claim a pending hit intent: decrement life, mark the side wounded,
    /// clear the intent. Returns the new life when an intent was applied.
    ///
    /// The `life > 0` guard makes elimination unrepeatable: once a side
    /// is at zero no further intent can change it.
    pub fn resolve_lose_score(&self, side: Side) -> Option<u32> {
        let mut state = self.side(side).lock();
        if state.pending_lose_score && state.life > 0 {
            state.pending_lose_score = false;
            state.life -= 1;
            state.wounded = true;
            Some(state.life)
        } else {
            state.pending_lose_score = false;
            None
        }
    }

    /// Claim a pending hill-capture intent. True at most once per raise.
    pub fn resolve_add_score(&self, side: Side) -> bool {
        let mut state = self.side(side).lock();
        std::mem::take(&mut state.pending_add_score)
    }

    /// Claim this side's wounded flag. True at most once per wound.
    pub fn claim_wounded(&self, side: Side) -> bool {
        let mut state = self.side(side).lock();
        std::mem::take(&mut state.wounded)
    }

    /// Reset sightings and combat state for a fresh match.
    pub fn reset_for_match(&self, starting_life: u32) {
        *self.sightings.write() = Sightings::default();
        *self.drone.lock() = SideState::new(starting_life);
        *self.enemy.lock() = SideState::new(starting_life);
        self.match_epoch.fetch_add(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_sighting_drops_partial_data() {
        let state = SharedState::new(10);
        state.report_sighting(Target::Hill, true, Some(30), None);
        assert!(!state.sightings().hill.in_sight);

        state.report_sighting(Target::Hill, true, None, Some(3));
        assert!(!state.sightings().hill.in_sight);

        state.report_sighting(Target::Hill, true, Some(30), Some(3));
        let snapshot = state.sightings();
        assert!(snapshot.hill.in_sight);
        assert_eq!(snapshot.hill.distance_cm, 30);
        assert_eq!(snapshot.hill.offset_px, 3);
    }

    #[test]
    fn test_report_sighting_last_write_wins() {
        let state = SharedState::new(10);
        state.report_sighting(Target::Enemy, true, Some(40), Some(-2));
        state.report_sighting(Target::Enemy, false, None, None);
        assert!(!state.sightings().enemy.in_sight);
    }

    #[test]
    fn test_resolve_lose_score_applies_once() {
        let state = SharedState::new(3);
        state.raise_lose_score(Side::Drone);
        assert_eq!(state.resolve_lose_score(Side::Drone), Some(2));
        // Intent is consumed, a second resolve is a no-op
        assert_eq!(state.resolve_lose_score(Side::Drone), None);
        assert_eq!(state.life(Side::Drone), 2);
    }

    #[test]
    fn test_life_never_goes_below_zero() {
        let state = SharedState::new(1);
        state.raise_lose_score(Side::Enemy);
        assert_eq!(state.resolve_lose_score(Side::Enemy), Some(0));
        state.raise_lose_score(Side::Enemy);
        assert_eq!(state.resolve_lose_score(Side::Enemy), None);
        assert_eq!(state.life(Side::Enemy), 0);
    }

    #[test]
    fn test_wounded_claimed_exactly_once() {
        let state = SharedState::new(3);
        state.raise_lose_score(Side::Drone);
        state.resolve_lose_score(Side::Drone);
        assert!(state.claim_wounded(Side::Drone));
        assert!(!state.claim_wounded(Side::Drone));
    }

    #[test]
    fn test_add_score_claimed_exactly_once() {
        let state = SharedState::new(3);
        state.raise_add_score(Side::Drone);
        assert!(state.resolve_add_score(Side::Drone));
        assert!(!state.resolve_add_score(Side::Drone));
    }

    #[test]
    fn test_reset_for_match_restores_life_and_clears_sightings() {
        let state = SharedState::new(3);
        state.report_sighting(Target::Hill, true, Some(20), Some(0));
        state.raise_lose_score(Side::Drone);
        state.resolve_lose_score(Side::Drone);

        state.reset_for_match(3);
        assert_eq!(state.life(Side::Drone), 3);
        assert!(!state.sightings().hill.in_sight);
        assert!(!state.claim_wounded(Side::Drone));
    }

    #[test]
    fn test_match_epoch_bumps_on_reset() {
        let state = SharedState::new(3);
        let before = state.match_epoch();
        state.reset_for_match(3);
        state.reset_for_match(3);
        assert_eq!(state.match_epoch(), before + 2);
    }

    #[test]
    fn test_shutdown_is_monotonic() {
        let state = SharedState::new(3);
        assert!(state.game_active());
        state.request_shutdown();
        assert!(!state.game_active());
    }
}
