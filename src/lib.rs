//! Stereo Input Core - synchronized multi-source stereoscopic media input
//!
//! This crate combines one or more opened media containers into a single
//! input:
//! - Flat numbering of video and audio streams across containers
//! - Stereo layout resolution, including two-stream `separate` pairs
//! - Two-phase reads that decode both views of a pair concurrently
//! - Broadcast seeking that keeps every container time-aligned
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │           Input Module               │
//! │  (MediaInput, mapper, resolver)      │
//! └─────────────────────────────────────┘
//!                  │
//!                  ▼
//! ┌─────────────────────────────────────┐
//! │           Media Module               │
//! │  (MediaObject trait, synthetic and   │
//! │   ffmpeg-next backends)              │
//! └─────────────────────────────────────┘
//!                  │
//!                  ▼
//! ┌─────────────────────────────────────┐
//! │        Threading Module              │
//! │  (per-stream read workers)           │
//! └─────────────────────────────────────┘
//! ```

pub mod error;
pub mod input;
pub mod media;
pub mod threading;

// Re-export main types
pub use error::{Error, Result};
pub use input::{InputConfig, InputSummary, MediaInput};
pub use media::{AudioBlob, DecoderConfig, MediaObject, OpenMedia, StereoLayout, VideoFrame};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging (call once at startup)
pub fn init() {
    // Info level by default if RUST_LOG is not set
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).try_init();

    log::info!("Stereo Input Core {} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_init() {
        init();
        init();
    }
}
