//! Runtime-agnostic timers for the Audio Pro core.
//!
//! The playback core only needs one kind of background work: a repeating,
//! cancellable task (progress polling). This crate implements the
//! [`TaskScheduler`](bridge_traits::TaskScheduler) contract for each runtime:
//!
//! - Native platforms: [`IntervalScheduler`] spawns a Tokio interval loop and
//!   stops it through a `tokio_util` cancellation token.
//! - WebAssembly: [`IntervalScheduler`] wraps `gloo_timers::callback::Interval`
//!   (the browser's `setInterval`).
//! - Tests: [`ManualScheduler`] only runs tasks when time is advanced by hand.
//!
//! # Examples
//!
//! ```rust
//! use bridge_traits::TaskScheduler;
//! use core_async::ManualScheduler;
//! use std::time::Duration;
//!
//! let scheduler = ManualScheduler::new();
//! let handle = scheduler.schedule_repeating(Duration::from_secs(1), Box::new(|| {}));
//! assert_eq!(scheduler.active_tasks(), 1);
//! drop(handle);
//! assert_eq!(scheduler.active_tasks(), 0);
//! ```

pub mod time;
pub mod timer;

pub use time::Duration;
pub use timer::{IntervalScheduler, ManualScheduler};
