//! Platform-specific helper abstractions used to keep trait bounds aligned with
//! the threading guarantees of each target.
//!
//! Native targets require `Send + Sync` so backends, stores and schedulers can
//! be shared across the host's threads (a tokio timer firing on a worker, a
//! mobile bridge delivering events from its own queue). WebAssembly builds run
//! entirely on the browser event loop and cannot satisfy those bounds because
//! `web_sys` objects are not thread-safe. The helpers below make the required
//! bounds conditional without duplicating every trait definition.

use crate::error::BridgeError;
use crate::media::MediaElementEvent;

/// Marker trait that applies `Send + Sync` on native targets while becoming a
/// no-op on `wasm32`.
#[cfg(not(target_arch = "wasm32"))]
pub trait PlatformSendSync: Send + Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<T> PlatformSendSync for T where T: Send + Sync {}

#[cfg(target_arch = "wasm32")]
pub trait PlatformSendSync {}

#[cfg(target_arch = "wasm32")]
impl<T> PlatformSendSync for T {}

/// Marker trait equivalent to `Send` on native targets.
#[cfg(not(target_arch = "wasm32"))]
pub trait PlatformSend: Send {}

#[cfg(not(target_arch = "wasm32"))]
impl<T> PlatformSend for T where T: Send {}

#[cfg(target_arch = "wasm32")]
pub trait PlatformSend {}

#[cfg(target_arch = "wasm32")]
impl<T> PlatformSend for T {}

/// Repeating task body handed to a [`TaskScheduler`](crate::scheduler::TaskScheduler).
#[cfg(not(target_arch = "wasm32"))]
pub type BoxedTask = Box<dyn FnMut() + Send + 'static>;

#[cfg(target_arch = "wasm32")]
pub type BoxedTask = Box<dyn FnMut() + 'static>;

/// Cancellation hook stored inside a [`ScheduledTask`](crate::scheduler::ScheduledTask).
#[cfg(not(target_arch = "wasm32"))]
pub type CancelFn = Box<dyn FnOnce() + Send + 'static>;

#[cfg(target_arch = "wasm32")]
pub type CancelFn = Box<dyn FnOnce() + 'static>;

/// Continuation receiving the deferred outcome of `MediaElement::play`.
#[cfg(not(target_arch = "wasm32"))]
pub type PlayCallback = Box<dyn FnOnce(Result<(), BridgeError>) + Send + 'static>;

#[cfg(target_arch = "wasm32")]
pub type PlayCallback = Box<dyn FnOnce(Result<(), BridgeError>) + 'static>;

/// Handler invoked for every notification raised by a media element.
#[cfg(not(target_arch = "wasm32"))]
pub type MediaEventHandler = std::sync::Arc<dyn Fn(MediaElementEvent) + Send + Sync + 'static>;

#[cfg(target_arch = "wasm32")]
pub type MediaEventHandler = std::sync::Arc<dyn Fn(MediaElementEvent) + 'static>;
