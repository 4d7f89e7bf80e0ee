//! # Player Configuration
//!
//! Two layers of configuration live here:
//!
//! - [`ConfigureOptions`]: the serialisable options a caller applies through
//!   `configure()` (content type, debug flags, progress interval, ...).
//!   Unrecognised keys are preserved in [`ConfigureOptions::extra`] and handed
//!   to the backend untouched.
//! - [`CoreConfig`]: the injected host capabilities (native module, media
//!   elements, scheduler, asset resolver) plus the initial options. It is
//!   built with [`CoreConfigBuilder`], which fails fast when the selected
//!   [`RuntimeTarget`] is missing a capability it needs.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_traits::RuntimeTarget;
//! use core_runtime::config::{ConfigureOptions, CoreConfig};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .target(RuntimeTarget::Native)
//!     .native_module(Arc::new(MyNativeModule))
//!     .configure_options(ConfigureOptions::default().with_debug(true))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::playback::{
    DEFAULT_PROGRESS_INTERVAL_MS, MAX_PROGRESS_INTERVAL_MS, MIN_PROGRESS_INTERVAL_MS,
};
use bridge_traits::{
    AssetResolver, ContentType, MediaElement, NativeAudioModule, RuntimeTarget, TaskScheduler,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

// ============================================================================
// ConfigureOptions
// ============================================================================

/// Options applied through `configure()`.
///
/// Replaced wholesale on every call; missing keys fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigureOptions {
    pub content_type: ContentType,
    pub debug: bool,
    #[serde(rename = "debugIncludesProgress", alias = "debugIncludeProgress")]
    pub debug_include_progress: bool,
    pub progress_interval_ms: u64,
    pub show_next_prev_controls: bool,
    /// Backend-specific keys, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ConfigureOptions {
    fn default() -> Self {
        Self {
            content_type: ContentType::Music,
            debug: false,
            debug_include_progress: false,
            progress_interval_ms: DEFAULT_PROGRESS_INTERVAL_MS,
            show_next_prev_controls: true,
            extra: Map::new(),
        }
    }
}

impl ConfigureOptions {
    /// Merge a JSON object over the defaults.
    ///
    /// Only the shape is checked; range problems are clamped by the facade.
    pub fn from_json(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::Config(format!(
                "configure options must be an object, got {}",
                json_kind(&value)
            )));
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_debug_include_progress(mut self, include: bool) -> Self {
        self.debug_include_progress = include;
        self
    }

    pub fn with_progress_interval_ms(mut self, interval_ms: u64) -> Self {
        self.progress_interval_ms = interval_ms;
        self
    }

    pub fn with_show_next_prev_controls(mut self, show: bool) -> Self {
        self.show_next_prev_controls = show;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Strict check used where out-of-range values must be rejected rather
    /// than clamped, e.g. when loading options at startup.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_PROGRESS_INTERVAL_MS..=MAX_PROGRESS_INTERVAL_MS)
            .contains(&self.progress_interval_ms)
        {
            return Err(Error::Config(format!(
                "progressIntervalMs must be between {} and {} ms, got {}",
                MIN_PROGRESS_INTERVAL_MS, MAX_PROGRESS_INTERVAL_MS, self.progress_interval_ms
            )));
        }
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// CoreConfig
// ============================================================================

/// Host capabilities and initial options for one player instance.
#[derive(Clone)]
pub struct CoreConfig {
    /// Backend family to drive.
    pub target: RuntimeTarget,

    /// Native engine command sink (required for [`RuntimeTarget::Native`]).
    pub native_module: Option<Arc<dyn NativeAudioModule>>,

    /// Main-lane media element (required for [`RuntimeTarget::Browser`]).
    pub media_element: Option<Arc<dyn MediaElement>>,

    /// Ambient-lane media element (required for [`RuntimeTarget::Browser`]).
    pub ambient_media_element: Option<Arc<dyn MediaElement>>,

    /// Timer source for progress polling on the browser backend.
    pub scheduler: Option<Arc<dyn TaskScheduler>>,

    /// Resolves opaque asset handles into URIs (optional).
    pub asset_resolver: Option<Arc<dyn AssetResolver>>,

    /// Options in effect before the first `configure()` call.
    pub configure_options: ConfigureOptions,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("target", &self.target)
            .field(
                "native_module",
                &self.native_module.as_ref().map(|_| "NativeAudioModule { ... }"),
            )
            .field(
                "media_element",
                &self.media_element.as_ref().map(|_| "MediaElement { ... }"),
            )
            .field(
                "ambient_media_element",
                &self
                    .ambient_media_element
                    .as_ref()
                    .map(|_| "MediaElement { ... }"),
            )
            .field(
                "scheduler",
                &self.scheduler.as_ref().map(|_| "TaskScheduler { ... }"),
            )
            .field(
                "asset_resolver",
                &self.asset_resolver.as_ref().map(|_| "AssetResolver { ... }"),
            )
            .field("configure_options", &self.configure_options)
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Checks that every capability the selected target needs is present.
    pub fn validate(&self) -> Result<()> {
        match self.target {
            RuntimeTarget::Native => {
                if self.native_module.is_none() {
                    return Err(capability_missing(
                        "NativeAudioModule",
                        "The native target forwards every command to the host audio engine. \
                         Inject the platform module with .native_module().",
                    ));
                }
            }
            RuntimeTarget::Browser => {
                if self.media_element.is_none() {
                    return Err(capability_missing(
                        "MediaElement",
                        "The browser target plays through a media element. \
                         Inject one with .media_element().",
                    ));
                }
                if self.ambient_media_element.is_none() {
                    return Err(capability_missing(
                        "AmbientMediaElement",
                        "The browser target needs a second media element for ambient audio. \
                         Inject one with .ambient_media_element().",
                    ));
                }
                if self.scheduler.is_none() {
                    return Err(capability_missing(
                        "TaskScheduler",
                        "The browser target polls progress on a timer. \
                         Inject a scheduler with .scheduler() or build inside a Tokio runtime.",
                    ));
                }
            }
        }
        Ok(())
    }
}

fn capability_missing(capability: &str, message: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: message.to_string(),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn provide_default_scheduler() -> Option<Arc<dyn TaskScheduler>> {
    core_async::IntervalScheduler::current().map(|scheduler| {
        let scheduler: Arc<dyn TaskScheduler> = Arc::new(scheduler);
        scheduler
    })
}

#[cfg(target_arch = "wasm32")]
fn provide_default_scheduler() -> Option<Arc<dyn TaskScheduler>> {
    Some(Arc::new(core_async::IntervalScheduler::new()))
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    target: Option<RuntimeTarget>,
    native_module: Option<Arc<dyn NativeAudioModule>>,
    media_element: Option<Arc<dyn MediaElement>>,
    ambient_media_element: Option<Arc<dyn MediaElement>>,
    scheduler: Option<Arc<dyn TaskScheduler>>,
    asset_resolver: Option<Arc<dyn AssetResolver>>,
    configure_options: Option<ConfigureOptions>,
}

impl CoreConfigBuilder {
    /// Selects the backend family. Defaults to [`RuntimeTarget::Native`].
    pub fn target(mut self, target: RuntimeTarget) -> Self {
        self.target = Some(target);
        self
    }

    pub fn native_module(mut self, module: Arc<dyn NativeAudioModule>) -> Self {
        self.native_module = Some(module);
        self
    }

    pub fn media_element(mut self, element: Arc<dyn MediaElement>) -> Self {
        self.media_element = Some(element);
        self
    }

    pub fn ambient_media_element(mut self, element: Arc<dyn MediaElement>) -> Self {
        self.ambient_media_element = Some(element);
        self
    }

    /// Sets the timer source. When omitted on the browser target, a
    /// runtime-backed `IntervalScheduler` is used if one is available.
    pub fn scheduler(mut self, scheduler: Arc<dyn TaskScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn asset_resolver(mut self, resolver: Arc<dyn AssetResolver>) -> Self {
        self.asset_resolver = Some(resolver);
        self
    }

    pub fn configure_options(mut self, options: ConfigureOptions) -> Self {
        self.configure_options = Some(options);
        self
    }

    /// Builds the configuration, returning `CapabilityMissing` with an
    /// actionable message when the target cannot be served.
    pub fn build(self) -> Result<CoreConfig> {
        let target = self.target.unwrap_or_default();

        let scheduler = match (target, self.scheduler) {
            (_, Some(scheduler)) => Some(scheduler),
            (RuntimeTarget::Browser, None) => provide_default_scheduler(),
            (RuntimeTarget::Native, None) => None,
        };

        let config = CoreConfig {
            target,
            native_module: self.native_module,
            media_element: self.media_element,
            ambient_media_element: self.ambient_media_element,
            scheduler,
            asset_resolver: self.asset_resolver,
            configure_options: self.configure_options.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}
