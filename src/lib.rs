//! King-of-the-hill drone game control core
//!
//! Coordinates three independently-scheduled loops - perception-driven
//! target prioritization, controller-input resolution and score
//! resolution - over a small set of shared safety-critical flags, and
//! produces a deterministic flight-command stream.
//!
//! Vision, controller protocol decoding and the flight transport are
//! external collaborators behind the [`game::state::SharedState`]
//! sighting API, the [`input::controller::ControllerLink`] trait and the
//! [`control::command::CommandSink`] trait.

pub mod config;
pub mod control;
pub mod game;
pub mod input;
pub mod lifecycle;
pub mod runtime;
pub mod score;
