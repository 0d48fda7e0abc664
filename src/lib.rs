//! frankengamepad: merge physical input devices into synthesized
//! virtual gamepads.
//!
//! Physical "source" devices are watched concurrently; their events are
//! translated through per-source routing tables (with axis rescaling)
//! into shared virtual "sink" devices created over uinput, so games see
//! one combined gamepad regardless of how many pieces of hardware feed
//! it.

pub mod config;
pub mod error;
pub mod profiles;
pub mod rescale;
pub mod resolver;
pub mod routing;
pub mod sink;
pub mod translate;
pub mod watch;

pub use error::Error;
