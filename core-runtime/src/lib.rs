//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the player crates:
//! - Dual-lane event channels and the normalized event vocabulary
//! - Configuration (`configure()` options and injected host capabilities)
//! - Logging and tracing infrastructure
//!
//! ## Overview
//!
//! Backends publish onto the [`events::EventEmitter`], the player store folds
//! main-lane events into its snapshot, and every crate logs through `tracing`
//! using the subscriber installed by [`logging::init_logging`].

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{ConfigureOptions, CoreConfig, CoreConfigBuilder};
pub use error::{Error, Result};
pub use events::{
    AmbientEvent, AudioProEvent, AudioProEventKind, ChannelName, EventChannel, EventEmitter,
    EventTrack, Subscription,
};
