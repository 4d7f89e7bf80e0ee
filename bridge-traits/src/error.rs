use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Media playback rejected: {0}")]
    PlaybackRejected(String),

    #[error("Asset resolution failed: {0}")]
    AssetResolution(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
