//! Reactor Core - Core types and utilities for the reactor engine
//!
//! This crate provides the foundational types used throughout the engine:
//! - Entity identifiers and simple geometry (re-exported from glam)
//! - Frame-counted simulation time
//! - The configuration/invariant error taxonomy

pub mod error;
pub mod time;
pub mod types;

pub use error::{ConfigurationError, InvariantViolation};
pub use glam::Vec3;
pub use time::{
    frames_to_seconds, seconds_to_frames, Frame, FrameClock, FRAMES_PER_SECOND, SECONDS_PER_FRAME,
};
pub use types::{Circle, EntityId};
