//! Crate error types
//!
//! Error types for camera and sink registry operations.

/// Error type for camera server operations
#[derive(Debug, Clone)]
pub enum Error {
    /// No source has been registered as the primary feed
    NoPrimarySource,
    /// Named source not found in the registry
    SourceNotFound(String),
    /// Named sink not found in the registry
    SinkNotFound(String),
    /// The source backing a sink has been dropped
    SourceClosed(String),
    /// Timed out waiting for a frame
    FrameTimeout(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NoPrimarySource => {
                write!(f, "No primary source: register a camera first")
            }
            Error::SourceNotFound(name) => write!(f, "Source not found: {}", name),
            Error::SinkNotFound(name) => write!(f, "Sink not found: {}", name),
            Error::SourceClosed(name) => write!(f, "Source closed: {}", name),
            Error::FrameTimeout(name) => write!(f, "Timed out waiting for frame from: {}", name),
        }
    }
}

impl std::error::Error for Error {}

/// Convenience result alias for camera server operations
pub type Result<T> = std::result::Result<T, Error>;
