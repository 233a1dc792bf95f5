//! Error types for snippet capture and export

use thiserror::Error;

/// Result type alias for snippet operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while pasting, capturing, or exporting a snippet
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Pasted rich markup could not be understood
    #[error("Invalid paste content: {0}")]
    InvalidPaste(String),

    /// The rasterizer rejected the request or produced no image
    #[error("Screenshot capture failed: {0}")]
    RasterizationFailure(String),

    /// No system clipboard able to hold images
    #[error("Clipboard unavailable: {0}")]
    ClipboardUnavailable(String),

    /// Capture did not finish before the watchdog fired
    #[error("Screenshot capture timed out after {0}ms")]
    Timeout(u64),

    /// Host-side write or dialog failure
    #[error("Failed to save snippet: {0}")]
    PersistenceFailure(String),

    /// A transport payload could not be encoded or decoded
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// The other side of the host/surface channel went away
    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::RasterizationFailure(err.to_string())
    }
}
