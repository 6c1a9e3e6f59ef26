//! In-memory media object
//!
//! Streams are declared up front from templates and durations; reads
//! produce deterministic frames and silent audio on per-stream worker
//! threads. Useful for driving the input layer without a decoder backend.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{AudioBlob, MediaObject, VideoFrame};
use crate::error::Result;
use crate::threading::ReadWorker;

/// Declared video stream
#[derive(Debug, Clone)]
pub struct SyntheticVideo {
    pub template: VideoFrame,

    /// Duration in microseconds
    pub duration: i64,

    /// Frame rate as numerator/denominator
    pub frame_rate: (i32, i32),
}

impl SyntheticVideo {
    /// Frame duration in microseconds
    pub fn frame_duration(&self) -> i64 {
        let (num, den) = self.frame_rate;
        if num <= 0 || den <= 0 {
            return 40_000;
        }
        den as i64 * 1_000_000 / num as i64
    }
}

/// Declared audio stream
#[derive(Debug, Clone)]
pub struct SyntheticAudio {
    pub template: AudioBlob,

    /// Duration in microseconds
    pub duration: i64,
}

/// Description of a synthetic container
#[derive(Debug, Clone, Default)]
pub struct SyntheticSource {
    pub url: String,
    pub video: Vec<SyntheticVideo>,
    pub audio: Vec<SyntheticAudio>,
    pub tags: Vec<(String, String)>,
}

impl SyntheticSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Add a 25 fps video stream
    pub fn with_video(self, template: VideoFrame, duration: i64) -> Self {
        self.with_video_rate(template, duration, 25, 1)
    }

    pub fn with_video_rate(mut self, template: VideoFrame, duration: i64, num: i32, den: i32) -> Self {
        self.video.push(SyntheticVideo {
            template,
            duration,
            frame_rate: (num, den),
        });
        self
    }

    pub fn with_audio(mut self, template: AudioBlob, duration: i64) -> Self {
        self.audio.push(SyntheticAudio { template, duration });
        self
    }

    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct StreamCursor {
    position: i64,
    active: bool,
    reads: usize,
}

/// State shared with the read workers
#[derive(Debug, Default)]
struct SyntheticState {
    video: Vec<StreamCursor>,
    audio: Vec<StreamCursor>,
    last_video_position: Option<i64>,
    last_audio_position: Option<i64>,
}

impl SyntheticState {
    fn read_video(&mut self, stream: usize, video: &SyntheticVideo) -> VideoFrame {
        let cursor = &mut self.video[stream];
        if !cursor.active {
            log::warn!("Synthetic read on inactive video stream {}", stream);
            return VideoFrame::default();
        }
        if cursor.position >= video.duration {
            return VideoFrame::default();
        }

        let pts = cursor.position;
        let frame_duration = video.frame_duration();
        cursor.position += frame_duration;
        cursor.reads += 1;
        self.last_video_position = Some(pts);

        let mut frame = video.template.clone();
        let fill = ((pts / frame_duration) % 256) as u8;
        for plane in 0..frame.layout.planes() {
            let (row, rows) = frame
                .layout
                .plane_geometry(plane, frame.raw_width, frame.raw_height);
            frame.data[0][plane] = Some(vec![fill; row * rows].into());
            frame.line_size[0][plane] = row;
        }
        frame.presentation_time = pts;
        log::trace!("Synthetic video {} frame at {} us", stream, pts);
        frame
    }

    fn read_audio(&mut self, stream: usize, audio: &SyntheticAudio, size: usize) -> AudioBlob {
        let mut blob = audio.template.clone();
        let cursor = &mut self.audio[stream];
        if !cursor.active {
            log::warn!("Synthetic read on inactive audio stream {}", stream);
            return blob;
        }

        let frame_bytes = blob.frame_bytes();
        if frame_bytes == 0 {
            return blob;
        }
        let remaining_us = (audio.duration - cursor.position).max(0) as u128;
        let remaining = (remaining_us * blob.bytes_per_second() as u128 / 1_000_000) as usize;
        let size = size.min(remaining);
        let size = size - size % frame_bytes;

        blob.presentation_time = cursor.position;
        if size > 0 {
            blob.data = Some(vec![0u8; size].into());
            blob.size = size;
            cursor.position += blob.duration_us(size);
            cursor.reads += 1;
            self.last_audio_position = Some(blob.presentation_time);
        }
        blob
    }
}

/// Media object backed by generated data
pub struct SyntheticMedia {
    source: SyntheticSource,
    state: Arc<Mutex<SyntheticState>>,
    video_workers: Vec<ReadWorker<(), VideoFrame>>,
    audio_workers: Vec<ReadWorker<usize, AudioBlob>>,
    closed: bool,
}

impl SyntheticMedia {
    /// Open a synthetic container, spawning one read worker per stream
    pub fn open(source: SyntheticSource) -> Result<Self> {
        let state = Arc::new(Mutex::new(SyntheticState {
            video: vec![StreamCursor::default(); source.video.len()],
            audio: vec![StreamCursor::default(); source.audio.len()],
            ..SyntheticState::default()
        }));

        let mut video_workers = Vec::with_capacity(source.video.len());
        for (i, video) in source.video.iter().enumerate() {
            let state = state.clone();
            let video = video.clone();
            video_workers.push(ReadWorker::spawn(
                format!("synthetic-video-{}", i),
                move |()| state.lock().read_video(i, &video),
            )?);
        }

        let mut audio_workers = Vec::with_capacity(source.audio.len());
        for (i, audio) in source.audio.iter().enumerate() {
            let state = state.clone();
            let audio = audio.clone();
            audio_workers.push(ReadWorker::spawn(
                format!("synthetic-audio-{}", i),
                move |size: usize| state.lock().read_audio(i, &audio, size),
            )?);
        }

        log::debug!(
            "Opened synthetic media {} ({} video, {} audio)",
            source.url,
            source.video.len(),
            source.audio.len()
        );

        Ok(Self {
            source,
            state,
            video_workers,
            audio_workers,
            closed: false,
        })
    }

    /// Read cursor of a video stream in microseconds
    pub fn video_position(&self, stream: usize) -> i64 {
        self.state.lock().video[stream].position
    }

    /// Read cursor of an audio stream in microseconds
    pub fn audio_position(&self, stream: usize) -> i64 {
        self.state.lock().audio[stream].position
    }

    pub fn is_video_active(&self, stream: usize) -> bool {
        self.state.lock().video[stream].active
    }

    pub fn is_audio_active(&self, stream: usize) -> bool {
        self.state.lock().audio[stream].active
    }

    /// Number of frames delivered by a video stream
    pub fn video_reads(&self, stream: usize) -> usize {
        self.state.lock().video[stream].reads
    }

    /// Whether close() was called
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl MediaObject for SyntheticMedia {
    fn url(&self) -> &str {
        &self.source.url
    }

    fn video_streams(&self) -> usize {
        self.source.video.len()
    }

    fn audio_streams(&self) -> usize {
        self.source.audio.len()
    }

    fn video_frame_template(&self, stream: usize) -> &VideoFrame {
        &self.source.video[stream].template
    }

    fn audio_blob_template(&self, stream: usize) -> &AudioBlob {
        &self.source.audio[stream].template
    }

    fn video_duration(&self, stream: usize) -> i64 {
        self.source.video[stream].duration
    }

    fn audio_duration(&self, stream: usize) -> i64 {
        self.source.audio[stream].duration
    }

    fn video_frame_rate_numerator(&self, stream: usize) -> i32 {
        self.source.video[stream].frame_rate.0
    }

    fn video_frame_rate_denominator(&self, stream: usize) -> i32 {
        self.source.video[stream].frame_rate.1
    }

    fn tags(&self) -> usize {
        self.source.tags.len()
    }

    fn tag_name(&self, index: usize) -> &str {
        &self.source.tags[index].0
    }

    fn tag_value(&self, index: usize) -> &str {
        &self.source.tags[index].1
    }

    fn video_stream_set_active(&mut self, stream: usize, active: bool) {
        self.state.lock().video[stream].active = active;
    }

    fn audio_stream_set_active(&mut self, stream: usize, active: bool) {
        self.state.lock().audio[stream].active = active;
    }

    fn start_video_frame_read(&mut self, stream: usize) {
        if let Err(e) = self.video_workers[stream].start(()) {
            log::warn!("Synthetic video {} read could not start: {}", stream, e);
        }
    }

    fn finish_video_frame_read(&mut self, stream: usize) -> VideoFrame {
        self.video_workers[stream].finish().unwrap_or_else(|e| {
            log::warn!("Synthetic video {} read failed: {}", stream, e);
            VideoFrame::default()
        })
    }

    fn start_audio_blob_read(&mut self, stream: usize, size: usize) {
        if let Err(e) = self.audio_workers[stream].start(size) {
            log::warn!("Synthetic audio {} read could not start: {}", stream, e);
        }
    }

    fn finish_audio_blob_read(&mut self, stream: usize) -> AudioBlob {
        self.audio_workers[stream].finish().unwrap_or_else(|e| {
            log::warn!("Synthetic audio {} read failed: {}", stream, e);
            self.source.audio[stream].template.clone()
        })
    }

    fn seek(&mut self, position: i64) -> Result<()> {
        let position = position.max(0);
        let mut guard = self.state.lock();
        let state = &mut *guard;
        for cursor in state.video.iter_mut().chain(state.audio.iter_mut()) {
            cursor.position = position;
        }
        state.last_video_position = None;
        state.last_audio_position = None;
        log::trace!("Synthetic media {} seeked to {} us", self.source.url, position);
        Ok(())
    }

    fn tell(&self) -> Option<i64> {
        let state = self.state.lock();
        state.last_video_position.or(state.last_audio_position)
    }

    fn close(&mut self) {
        self.video_workers.clear();
        self.audio_workers.clear();
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{PixelLayout, SampleFormat};

    fn source() -> SyntheticSource {
        SyntheticSource::new("/media/clip.mkv")
            .with_video(VideoFrame::template(64, 32, 2.0), 200_000)
            .with_audio(AudioBlob::template(2, 48000, SampleFormat::S16), 100_000)
            .with_tag("title", "Clip")
    }

    #[test]
    fn test_inactive_stream_yields_invalid_frame() {
        let mut media = SyntheticMedia::open(source()).unwrap();
        media.start_video_frame_read(0);
        assert!(!media.finish_video_frame_read(0).is_valid());
        assert_eq!(media.video_reads(0), 0);
    }

    #[test]
    fn test_video_frames_until_end() {
        let mut media = SyntheticMedia::open(source()).unwrap();
        media.video_stream_set_active(0, true);

        let mut times = Vec::new();
        loop {
            media.start_video_frame_read(0);
            let frame = media.finish_video_frame_read(0);
            if !frame.is_valid() {
                break;
            }
            assert_eq!(frame.layout, PixelLayout::Yuv420p);
            assert_eq!(frame.line_size[0], [64, 32, 32]);
            assert_eq!(frame.data[0][1].as_ref().unwrap().len(), 32 * 16);
            times.push(frame.presentation_time);
        }
        assert_eq!(times, vec![0, 40_000, 80_000, 120_000, 160_000]);
        assert_eq!(media.tell(), Some(160_000));
    }

    #[test]
    fn test_audio_short_read_at_end() {
        let mut media = SyntheticMedia::open(source()).unwrap();
        media.audio_stream_set_active(0, true);

        // 100 ms of s16 stereo at 48 kHz is 19200 bytes
        media.start_audio_blob_read(0, 16384);
        let blob = media.finish_audio_blob_read(0);
        assert_eq!(blob.size, 16384);
        assert_eq!(blob.presentation_time, 0);

        media.start_audio_blob_read(0, 16384);
        let blob = media.finish_audio_blob_read(0);
        assert!(blob.size < 16384);
        assert_eq!(blob.size % blob.frame_bytes(), 0);

        media.start_audio_blob_read(0, 16384);
        assert!(media.finish_audio_blob_read(0).is_empty());
    }

    #[test]
    fn test_seek_moves_every_cursor() {
        let mut media = SyntheticMedia::open(source()).unwrap();
        media.seek(120_000).unwrap();
        assert_eq!(media.video_position(0), 120_000);
        assert_eq!(media.audio_position(0), 120_000);
        assert_eq!(media.tell(), None);
    }

    #[test]
    fn test_close() {
        let mut media = SyntheticMedia::open(source()).unwrap();
        assert!(!media.is_closed());
        media.close();
        assert!(media.is_closed());
        assert_eq!(media.url(), "/media/clip.mkv");
    }
}
