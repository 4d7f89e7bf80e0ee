//! Convenience helpers for wiring the browser bridges together.
//!
//! Host shells can use [`build_media_bridges`] to get the two media elements
//! and the timer scheduler the browser backend needs, without writing
//! repetitive glue code.

use std::sync::Arc;

use bridge_traits::{error::Result as BridgeResult, MediaElement, TaskScheduler};
use core_async::IntervalScheduler;

use crate::media::HtmlMediaElement;

/// Fully constructed browser bridge objects ready for injection into the core.
pub struct WasmMediaBridges {
    /// Element for the main track.
    pub element: Arc<dyn MediaElement>,
    /// Element for the ambient lane.
    pub ambient_element: Arc<dyn MediaElement>,
    /// `setInterval`-backed scheduler used for progress polling.
    pub scheduler: Arc<dyn TaskScheduler>,
}

impl std::fmt::Debug for WasmMediaBridges {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WasmMediaBridges").finish_non_exhaustive()
    }
}

/// Create two detached `<audio>` elements and a browser timer scheduler.
///
/// Also installs the console panic hook so panics in listeners show up in the
/// developer console with a stack trace.
pub fn build_media_bridges() -> BridgeResult<WasmMediaBridges> {
    console_error_panic_hook::set_once();

    let element = HtmlMediaElement::create_audio()?;
    let ambient_element = HtmlMediaElement::create_audio()?;

    Ok(WasmMediaBridges {
        element: Arc::new(element),
        ambient_element: Arc::new(ambient_element),
        scheduler: Arc::new(IntervalScheduler::new()),
    })
}
