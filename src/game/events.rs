//! Match events raised by the loops and consumed by the supervisor

use crate::game::state::Side;

/// Events the three loops report upward to the match supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEvent {
    /// A side's life reached zero
    SideEliminated(Side),
    /// The drone's hill-capture count reached the win threshold
    DroneWins,
    /// The search behavior exhausted its cycle budget
    TargetLost,
    /// The controller's abort button was pressed
    Aborted,
}

/// Why a match ended
///
/// Elimination of a side maps to the opponent winning: the drone wins by
/// hill captures or by eliminating the enemy, the enemy wins by
/// eliminating the drone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    DroneWins,
    EnemyWins,
    TargetLost,
    Aborted,
}

/// Final outcome published once a match ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    pub reason: EndReason,
    pub drone_life: u32,
    pub enemy_life: u32,
}
