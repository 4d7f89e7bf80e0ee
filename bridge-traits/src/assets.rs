//! Resolution of bundled resources to URIs.

use crate::error::Result;
use crate::platform::PlatformSendSync;
use crate::playback::AssetHandle;

/// Host hook turning an [`AssetHandle`] into a URI the backend can open.
pub trait AssetResolver: PlatformSendSync {
    fn resolve(&self, handle: AssetHandle) -> Result<String>;
}
