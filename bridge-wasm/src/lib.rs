//! WebAssembly Bridge Implementations
//!
//! Browser implementations of the media contracts defined in
//! `bridge-traits`, built on `web-sys` and `wasm-bindgen`.
//!
//! # Platform Support
//!
//! This crate is designed exclusively for the `wasm32-unknown-unknown` target.
//! It compiles to an empty crate elsewhere.
//!
//! # Implementations
//!
//! - [`HtmlMediaElement`]: `MediaElement` over a DOM `<audio>` element
//! - [`build_media_bridges`]: main + ambient elements and a timer scheduler
//!
//! # Examples
//!
//! ```ignore
//! use bridge_wasm::build_media_bridges;
//! use core_runtime::CoreConfig;
//! use bridge_traits::RuntimeTarget;
//!
//! let bridges = build_media_bridges()?;
//! let config = CoreConfig::builder()
//!     .target(RuntimeTarget::Browser)
//!     .media_element(bridges.element)
//!     .ambient_media_element(bridges.ambient_element)
//!     .scheduler(bridges.scheduler)
//!     .build()?;
//! ```

#![cfg(target_arch = "wasm32")]
#![warn(missing_docs)]

pub mod bootstrap;
pub mod error;
pub mod media;

// Re-export commonly used types
pub use bootstrap::{build_media_bridges, WasmMediaBridges};
pub use error::{WasmError, WasmResult};
pub use media::HtmlMediaElement;
