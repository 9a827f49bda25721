//! Flight command vector and the sink boundary to the flight transport

/// A single flight command for the vehicle
///
/// Axis convention follows the flight transport: `phi` roll, `theta`
/// pitch (negative = forward), `gaz` vertical, `yaw` rotation. All four
/// axes are always within `[-1.0, 1.0]`; constructors enforce the clamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightCommand {
    pub hover: bool,
    pub phi: f32,
    pub theta: f32,
    pub gaz: f32,
    pub yaw: f32,
}

fn clamp_axis(value: f32) -> f32 {
    // Out-of-range axes are a programming error upstream, not a runtime
    // condition: assert in development, clamp in release.
    debug_assert!(
        (-1.0..=1.0).contains(&value),
        "flight axis out of range: {value}"
    );
    value.clamp(-1.0, 1.0)
}

impl FlightCommand {
    pub fn new(hover: bool, phi: f32, theta: f32, gaz: f32, yaw: f32) -> Self {
        Self {
            hover,
            phi: clamp_axis(phi),
            theta: clamp_axis(theta),
            gaz: clamp_axis(gaz),
            yaw: clamp_axis(yaw),
        }
    }

    /// Hold position: all axes zero
    pub fn hover() -> Self {
        Self::new(true, 0.0, 0.0, 0.0, 0.0)
    }

    /// Rotate in place
    pub fn yaw_only(yaw: f32) -> Self {
        Self::new(false, 0.0, 0.0, 0.0, yaw)
    }

    /// Maximum backward pitch, the safety interlock command
    pub fn full_retreat() -> Self {
        Self::new(false, 0.0, 1.0, 0.0, 0.0)
    }
}

/// Boundary to the flight transport that executes commands on the vehicle
///
/// Implementations must not block: they are called from the control loop
/// on every cycle.
pub trait CommandSink: Send + Sync {
    fn send_command(&self, command: &FlightCommand);
    fn take_off(&self);
    fn land(&self);
    /// Visible/haptic acknowledgment that the drone took a hit
    fn play_hit_animation(&self);
}

/// Sink that logs commands instead of flying, the default when no
/// transport is wired in
#[derive(Debug, Default)]
pub struct LoggingSink;

impl CommandSink for LoggingSink {
    fn send_command(&self, command: &FlightCommand) {
        tracing::debug!(
            "cmd hover={} phi={:.3} theta={:.3} gaz={:.3} yaw={:.3}",
            command.hover,
            command.phi,
            command.theta,
            command.gaz,
            command.yaw
        );
    }

    fn take_off(&self) {
        tracing::info!("take off");
    }

    fn land(&self) {
        tracing::info!("land");
    }

    fn play_hit_animation(&self) {
        tracing::info!("hit acknowledgment");
    }
}
