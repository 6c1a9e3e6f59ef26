//! Error types for stereo-input-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for stereo-input-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for media object and input operations
#[derive(Error, Debug)]
pub enum Error {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Invalid or unsupported container format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Codec or sample/pixel format not supported
    #[error("Codec not supported: {0}")]
    CodecNotSupported(String),

    /// Decode error
    #[error("Decode failed: {0}")]
    DecodeFailed(String),

    /// Seek error
    #[error("Seek failed at {0} microseconds")]
    SeekFailed(i64),

    /// FFmpeg error with code
    #[error("FFmpeg error {code}: {message}")]
    FFmpeg { code: i32, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Read worker channel error
    #[error("Channel error: {0}")]
    Channel(String),
}

impl Error {
    /// Whether the error means the source could not be found at all
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::FileNotFound(_) => true,
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

impl From<crossbeam_channel::RecvError> for Error {
    fn from(e: crossbeam_channel::RecvError) -> Self {
        Error::Channel(e.to_string())
    }
}

impl<T> From<crossbeam_channel::SendError<T>> for Error {
    fn from(e: crossbeam_channel::SendError<T>) -> Self {
        Error::Channel(e.to_string())
    }
}

#[cfg(feature = "ffmpeg")]
impl From<ffmpeg_next::Error> for Error {
    fn from(e: ffmpeg_next::Error) -> Self {
        Error::FFmpeg {
            code: i32::from(e),
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found() {
        assert!(Error::FileNotFound(PathBuf::from("/missing.mkv")).is_not_found());
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(Error::from(io).is_not_found());
        assert!(!Error::SeekFailed(0).is_not_found());
    }

    #[test]
    fn test_channel_error() {
        let (tx, rx) = crossbeam_channel::bounded::<u8>(1);
        drop(rx);
        let err: Error = tx.send(1).unwrap_err().into();
        assert!(matches!(err, Error::Channel(_)));
    }

    #[test]
    fn test_display() {
        let err = Error::SeekFailed(1_500_000);
        assert_eq!(err.to_string(), "Seek failed at 1500000 microseconds");
    }
}
