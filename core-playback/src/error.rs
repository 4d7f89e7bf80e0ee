//! # Playback Error Types
//!
//! Errors raised while validating commands. None of them cross the public
//! command surface: the facade turns each one into a `PLAYBACK_ERROR` (or
//! `AMBIENT_ERROR`) event.

use thiserror::Error;

/// Errors that can occur while preparing a playback command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// Track failed shape validation; the reason names the offending field.
    #[error("Invalid track: {0}")]
    InvalidTrack(String),

    /// Ambient URL is blank or could not be resolved to a URI.
    #[error("Invalid ambient URL: {0}")]
    InvalidAmbientUrl(String),

    /// Transport command issued while no track is loaded.
    #[error("Cannot {operation}: no track is loaded")]
    NoTrackLoaded { operation: &'static str },

    /// The active backend cannot play this kind of source.
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    /// Error from the runtime layer (configuration, capabilities).
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl PlaybackError {
    /// Errors detected before anything reached a backend.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::InvalidTrack(_) | PlaybackError::InvalidAmbientUrl(_)
        )
    }
}

impl From<core_runtime::Error> for PlaybackError {
    fn from(error: core_runtime::Error) -> Self {
        PlaybackError::Runtime(error.to_string())
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
