//! Media object boundary
//!
//! A media object is one opened container contributing zero or more video
//! and audio streams. Streams are numbered locally per object; the
//! [`crate::input`] module maps them into one flat numbering.
//!
//! Two backends ship with the crate: [`synthetic::SyntheticMedia`]
//! (in-memory, always available) and `ffmpeg::FfmpegMedia` (behind the
//! `ffmpeg` feature).

mod blob;
pub(crate) mod config;
mod frame;
pub mod stereo;
pub mod synthetic;

#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;

pub use blob::{AudioBlob, SampleFormat};
pub use config::DecoderConfig;
pub use frame::{ChromaLocation, ColorSpace, PixelLayout, PlaneData, ValueRange, VideoFrame};
pub use stereo::StereoLayout;

use crate::error::Result;

/// Capabilities the input layer consumes from one opened container.
///
/// Stream indices are local to the object. Passing an index outside
/// `0..video_streams()` (resp. `audio_streams()`) is a programming error.
///
/// Reads are two-phase: `start_*` issues the request and may return before
/// decoding is done, `finish_*` blocks for the result. Every started read
/// must be finished before the same stream is started again. Only streams
/// marked active are decoded.
pub trait MediaObject: Send {
    /// URL this object was opened from
    fn url(&self) -> &str;

    fn video_streams(&self) -> usize;

    fn audio_streams(&self) -> usize;

    /// Format template of a video stream (no data)
    fn video_frame_template(&self, stream: usize) -> &VideoFrame;

    /// Format template of an audio stream (no data)
    fn audio_blob_template(&self, stream: usize) -> &AudioBlob;

    /// Duration in microseconds
    fn video_duration(&self, stream: usize) -> i64;

    /// Duration in microseconds
    fn audio_duration(&self, stream: usize) -> i64;

    fn video_frame_rate_numerator(&self, stream: usize) -> i32;

    fn video_frame_rate_denominator(&self, stream: usize) -> i32;

    /// Number of metadata tags
    fn tags(&self) -> usize;

    fn tag_name(&self, index: usize) -> &str;

    fn tag_value(&self, index: usize) -> &str;

    fn video_stream_set_active(&mut self, stream: usize, active: bool);

    fn audio_stream_set_active(&mut self, stream: usize, active: bool);

    fn start_video_frame_read(&mut self, stream: usize);

    /// Returns an invalid frame at end of stream or on decode failure
    fn finish_video_frame_read(&mut self, stream: usize) -> VideoFrame;

    /// Request at most `size` bytes of interleaved samples
    fn start_audio_blob_read(&mut self, stream: usize, size: usize);

    /// May return fewer bytes than requested; zero bytes at end of stream
    fn finish_audio_blob_read(&mut self, stream: usize) -> AudioBlob;

    /// Seek all streams to a position in microseconds
    fn seek(&mut self, position: i64) -> Result<()>;

    /// Position of the last delivered data, if known
    fn tell(&self) -> Option<i64>;

    /// Release decoding resources
    fn close(&mut self);
}

/// Media objects that can be opened from a URL alone
pub trait OpenMedia: MediaObject + Sized {
    fn open(url: &str) -> Result<Self>;
}
