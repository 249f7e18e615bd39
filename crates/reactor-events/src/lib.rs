//! Reactor Events - typed publish/subscribe dispatch
//!
//! Every subsystem of a simulation (damage resolution, reactions, shields,
//! logging) talks to the others through an [`EventEngine`]. Dispatch is
//! synchronous and single-threaded: a `publish` call returns only after every
//! handler, including any events those handlers published, has run.

mod engine;
mod event;

pub use engine::EventEngine;
pub use event::{Delivery, Event, SubscriptionId};
