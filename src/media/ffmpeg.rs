//! FFmpeg-backed media object using ffmpeg-next
//!
//! One demuxer per container feeds per-stream packet queues; only active
//! streams are queued. Each stream decodes on its own [`ReadWorker`], so
//! the two views of a stereo pair decode in parallel.

use std::collections::VecDeque;
use std::sync::Arc;

use ffmpeg_next as ffmpeg;
use ffmpeg_next::codec::context::Context as CodecContext;
use ffmpeg_next::format::context::Input as FormatContext;
use ffmpeg_next::format::{Pixel, Sample};
use ffmpeg_next::media::Type as MediaType;
use ffmpeg_next::software::scaling::{Context as ScalerContext, Flags as ScalerFlags};
use ffmpeg_next::util::frame::audio::Audio as AudioFrameFFmpeg;
use ffmpeg_next::util::frame::video::Video as VideoFrameFFmpeg;
use ffmpeg_next::{Packet, Rational};
use parking_lot::Mutex;

use super::stereo::layout_from_tags;
use super::{
    AudioBlob, ChromaLocation, ColorSpace, DecoderConfig, MediaObject, OpenMedia, PixelLayout,
    SampleFormat, ValueRange, VideoFrame,
};
use crate::error::{Error, Result};
use crate::threading::ReadWorker;

/// Convert PTS to microseconds
fn pts_to_us(pts: i64, time_base: Rational) -> i64 {
    if time_base.denominator() == 0 {
        return pts;
    }
    (pts as i128 * 1_000_000 * time_base.numerator() as i128 / time_base.denominator() as i128)
        as i64
}

/// Map a decoder pixel format to a layout and range; `None` means convert to BGRA
fn pixel_layout(format: Pixel) -> Option<(PixelLayout, Option<ValueRange>)> {
    match format {
        Pixel::YUV420P => Some((PixelLayout::Yuv420p, None)),
        Pixel::YUVJ420P => Some((PixelLayout::Yuv420p, Some(ValueRange::U8Full))),
        Pixel::YUV422P => Some((PixelLayout::Yuv422p, None)),
        Pixel::YUVJ422P => Some((PixelLayout::Yuv422p, Some(ValueRange::U8Full))),
        Pixel::YUV444P => Some((PixelLayout::Yuv444p, None)),
        Pixel::YUVJ444P => Some((PixelLayout::Yuv444p, Some(ValueRange::U8Full))),
        Pixel::BGRA => Some((PixelLayout::Bgra32, Some(ValueRange::U8Full))),
        _ => None,
    }
}

fn color_space(space: ffmpeg::color::Space, height: u32) -> ColorSpace {
    match space {
        ffmpeg::color::Space::BT709 => ColorSpace::Yuv709,
        ffmpeg::color::Space::BT470BG | ffmpeg::color::Space::SMPTE170M => ColorSpace::Yuv601,
        // Unknown: SD material is usually BT.601
        _ if height < 720 => ColorSpace::Yuv601,
        _ => ColorSpace::Yuv709,
    }
}

fn chroma_location(location: ffmpeg::chroma::Location) -> ChromaLocation {
    match location {
        ffmpeg::chroma::Location::Center => ChromaLocation::Center,
        ffmpeg::chroma::Location::TopLeft => ChromaLocation::TopLeft,
        _ => ChromaLocation::Left,
    }
}

fn sample_format(format: Sample) -> Option<SampleFormat> {
    match format {
        Sample::U8(_) => Some(SampleFormat::U8),
        Sample::I16(_) => Some(SampleFormat::S16),
        Sample::I32(_) => Some(SampleFormat::S32),
        Sample::F32(_) => Some(SampleFormat::F32),
        Sample::F64(_) => Some(SampleFormat::D64),
        _ => None,
    }
}

/// Interleave `samples` samples of `bytes` bytes from one plane per channel
fn interleave(planes: &[&[u8]], samples: usize, bytes: usize, out: &mut Vec<u8>) {
    out.reserve(samples * planes.len() * bytes);
    for i in 0..samples {
        for plane in planes {
            out.extend_from_slice(&plane[i * bytes..(i + 1) * bytes]);
        }
    }
}

/// Stream duration, falling back to the container duration
fn stream_duration(input: &FormatContext, stream: &ffmpeg::format::stream::Stream) -> i64 {
    let duration = stream.duration();
    if duration > 0 {
        pts_to_us(duration, stream.time_base())
    } else {
        input.duration().max(0) * 1_000_000 / ffmpeg::ffi::AV_TIME_BASE as i64
    }
}

/// Packets waiting for one stream's decoder
#[derive(Default)]
struct StreamQueue {
    packets: VecDeque<Packet>,

    /// Set after an overflow; packets are dropped up to the next keyframe
    waiting_for_key: bool,
}

impl StreamQueue {
    /// Queue a packet, holding at most `max`; false if it was dropped.
    ///
    /// On overflow the queue is emptied and refilled from the next keyframe.
    fn push(&mut self, packet: Packet, max: usize) -> bool {
        if self.waiting_for_key {
            if !packet.is_key() {
                return false;
            }
            self.waiting_for_key = false;
        }
        if self.packets.len() >= max {
            self.packets.clear();
            if !packet.is_key() {
                self.waiting_for_key = true;
                return false;
            }
        }
        self.packets.push_back(packet);
        true
    }

    fn pop(&mut self) -> Option<Packet> {
        self.packets.pop_front()
    }

    fn clear(&mut self) {
        self.packets.clear();
        self.waiting_for_key = false;
    }

    fn len(&self) -> usize {
        self.packets.len()
    }
}

/// Demuxer state shared by the stream workers
struct Demuxer {
    input: FormatContext,

    /// Container stream index per local video / audio stream
    video_index: Vec<usize>,
    audio_index: Vec<usize>,

    video_active: Vec<bool>,
    audio_active: Vec<bool>,

    video_queues: Vec<StreamQueue>,
    audio_queues: Vec<StreamQueue>,

    max_queued_packets: usize,

    /// No more packets until the next seek
    eof: bool,

    /// Incremented on every seek; decoders flush when it changes
    generation: u64,

    /// Position of the last delivered frame or blob
    position: Option<i64>,
}

// SAFETY: the format context is only touched with the demuxer mutex held
unsafe impl Send for Demuxer {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Video,
    Audio,
}

impl Demuxer {
    fn queue(&mut self, kind: Kind, stream: usize) -> &mut StreamQueue {
        match kind {
            Kind::Video => &mut self.video_queues[stream],
            Kind::Audio => &mut self.audio_queues[stream],
        }
    }

    fn is_active(&self, kind: Kind, stream: usize) -> bool {
        match kind {
            Kind::Video => self.video_active[stream],
            Kind::Audio => self.audio_active[stream],
        }
    }

    fn set_active(&mut self, kind: Kind, stream: usize, active: bool) {
        match kind {
            Kind::Video => self.video_active[stream] = active,
            Kind::Audio => self.audio_active[stream] = active,
        }
        if !active {
            self.queue(kind, stream).clear();
        }
    }

    /// Next packet for a stream, reading the container until one arrives
    fn next_packet(&mut self, kind: Kind, stream: usize) -> Option<Packet> {
        loop {
            if let Some(packet) = self.queue(kind, stream).pop() {
                return Some(packet);
            }
            if self.eof {
                return None;
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => self.route(packet),
                Err(ffmpeg::Error::Eof) => {
                    log::debug!("Demuxer reached end of input");
                    self.eof = true;
                }
                Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => {}
                Err(e) => {
                    log::warn!("Demuxer read failed: {}", e);
                    self.eof = true;
                }
            }
        }
    }

    /// Queue a packet for its stream if that stream is active
    fn route(&mut self, packet: Packet) {
        let index = packet.stream();
        let target = if let Some(s) = self.video_index.iter().position(|&i| i == index) {
            (Kind::Video, s)
        } else if let Some(s) = self.audio_index.iter().position(|&i| i == index) {
            (Kind::Audio, s)
        } else {
            return;
        };

        if !self.is_active(target.0, target.1) {
            return;
        }
        let max = self.max_queued_packets;
        let queue = self.queue(target.0, target.1);
        let was_full = queue.len() >= max;
        if !queue.push(packet, max) && was_full {
            log::warn!(
                "{:?} stream {} queue full, skipping to next keyframe",
                target.0,
                target.1
            );
        }
    }

    fn seek(&mut self, position: i64) -> Result<()> {
        self.input.seek(position, ..position).map_err(|e| {
            log::error!("Demuxer seek to {} us failed: {}", position, e);
            Error::SeekFailed(position)
        })?;
        for queue in self.video_queues.iter_mut().chain(self.audio_queues.iter_mut()) {
            queue.clear();
        }
        self.eof = false;
        self.generation += 1;
        self.position = None;
        Ok(())
    }
}

/// Decoder for one video stream, owned by its worker
struct VideoDecoder {
    stream: usize,
    decoder: ffmpeg::decoder::Video,
    scaler: Option<ScalerContext>,
    template: VideoFrame,
    time_base: Rational,
    generation: u64,
    draining: bool,
}

// SAFETY: used by exactly one worker thread at a time
unsafe impl Send for VideoDecoder {}

impl VideoDecoder {
    /// Flush after a seek; false if the stream is not active
    fn sync(&mut self, demuxer: &Mutex<Demuxer>) -> bool {
        let demuxer = demuxer.lock();
        if demuxer.generation != self.generation {
            self.decoder.flush();
            self.generation = demuxer.generation;
            self.draining = false;
        }
        if !demuxer.is_active(Kind::Video, self.stream) {
            log::warn!("Video read on inactive stream {}", self.stream);
            return false;
        }
        true
    }

    fn read(&mut self, demuxer: &Mutex<Demuxer>) -> VideoFrame {
        let mut decoded = VideoFrameFFmpeg::empty();
        loop {
            if !self.sync(demuxer) {
                return VideoFrame::default();
            }

            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => {
                    return match self.convert(&decoded) {
                        Ok(frame) => {
                            demuxer.lock().position = Some(frame.presentation_time);
                            frame
                        }
                        Err(e) => {
                            log::warn!("Video stream {}: {}", self.stream, e);
                            VideoFrame::default()
                        }
                    };
                }
                Err(ffmpeg::Error::Eof) => return VideoFrame::default(),
                Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => {}
                Err(e) => {
                    log::warn!("Video stream {} decode failed: {}", self.stream, e);
                    return VideoFrame::default();
                }
            }

            let packet = demuxer.lock().next_packet(Kind::Video, self.stream);
            match packet {
                Some(packet) => {
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        log::warn!("Video stream {} rejected packet: {}", self.stream, e);
                    }
                }
                None if self.draining => return VideoFrame::default(),
                None => {
                    self.decoder.send_eof().ok();
                    self.draining = true;
                }
            }
        }
    }

    fn convert(&mut self, decoded: &VideoFrameFFmpeg) -> Result<VideoFrame> {
        let pts = decoded.pts().or_else(|| decoded.timestamp()).unwrap_or(0);

        let scaled;
        let source = match self.scaler.as_mut() {
            Some(scaler) => {
                let mut out = VideoFrameFFmpeg::empty();
                scaler
                    .run(decoded, &mut out)
                    .map_err(|e| Error::DecodeFailed(format!("Failed to scale frame: {}", e)))?;
                scaled = out;
                &scaled
            }
            None => decoded,
        };

        let mut frame = self.template.clone();
        if source.width() != frame.raw_width || source.height() != frame.raw_height {
            return Err(Error::DecodeFailed(format!(
                "frame size changed to {}x{}",
                source.width(),
                source.height()
            )));
        }

        for plane in 0..frame.layout.planes() {
            let (row, rows) = frame
                .layout
                .plane_geometry(plane, frame.raw_width, frame.raw_height);
            let stride = source.stride(plane);
            let bytes = source.data(plane);
            let mut packed = Vec::with_capacity(row * rows);
            for y in 0..rows {
                packed.extend_from_slice(&bytes[y * stride..y * stride + row]);
            }
            frame.data[0][plane] = Some(packed.into());
            frame.line_size[0][plane] = row;
        }
        frame.presentation_time = pts_to_us(pts, self.time_base);
        log::trace!("Video stream {} frame at {} us", self.stream, frame.presentation_time);
        Ok(frame)
    }
}

/// Interleaved samples decoded but not yet delivered
#[derive(Default)]
struct PendingAudio {
    bytes: Vec<u8>,

    /// Presentation time of the first pending byte
    time: i64,

    /// Demuxer generation the bytes were decoded in
    generation: u64,
}

impl PendingAudio {
    /// Drop bytes decoded before a seek; true if the generation changed
    fn resync(&mut self, generation: u64) -> bool {
        if generation == self.generation {
            return false;
        }
        self.generation = generation;
        self.bytes.clear();
        true
    }

    /// Move up to `size` bytes, whole sample frames only, into a copy of `template`
    fn take(&mut self, template: &AudioBlob, size: usize) -> AudioBlob {
        let mut blob = template.clone();
        let frame_bytes = blob.frame_bytes().max(1);
        let take = size.min(self.bytes.len());
        let take = take - take % frame_bytes;
        blob.presentation_time = self.time;
        if take > 0 {
            let data: Vec<u8> = self.bytes.drain(..take).collect();
            blob.data = Some(data.into());
            blob.size = take;
            self.time += blob.duration_us(take);
        }
        blob
    }
}

/// Decoder for one audio stream, owned by its worker
struct AudioDecoder {
    stream: usize,
    decoder: ffmpeg::decoder::Audio,
    template: AudioBlob,
    time_base: Rational,
    draining: bool,
    pending: PendingAudio,
}

// SAFETY: used by exactly one worker thread at a time
unsafe impl Send for AudioDecoder {}

impl AudioDecoder {
    /// Flush after a seek; false if the stream is not active
    fn sync(&mut self, demuxer: &Mutex<Demuxer>) -> bool {
        let demuxer = demuxer.lock();
        if self.pending.resync(demuxer.generation) {
            self.decoder.flush();
            self.draining = false;
        }
        if !demuxer.is_active(Kind::Audio, self.stream) {
            log::warn!("Audio read on inactive stream {}", self.stream);
            return false;
        }
        true
    }

    /// Append a decoded frame to the pending buffer in packed order.
    ///
    /// Frames whose layout does not match the stream template are dropped.
    fn append(&mut self, decoded: &AudioFrameFFmpeg) {
        let bytes = self.template.sample_format.bytes();
        let channels = self.template.channels as usize;
        let samples = decoded.samples();
        let needed = samples * bytes;

        let planes: Vec<&[u8]> = if decoded.is_planar() {
            if decoded.planes() < channels {
                log::warn!(
                    "Audio stream {}: frame has {} planes, expected {}",
                    self.stream,
                    decoded.planes(),
                    channels
                );
                return;
            }
            (0..channels).map(|ch| decoded.data(ch)).collect()
        } else {
            vec![decoded.data(0)]
        };
        let per_plane = if decoded.is_planar() { needed } else { needed * channels };
        if planes.iter().any(|p| p.len() < per_plane) {
            log::warn!("Audio stream {}: short frame dropped", self.stream);
            return;
        }

        let pending = &mut self.pending;
        if pending.bytes.is_empty() {
            let pts = decoded.pts().or_else(|| decoded.timestamp()).unwrap_or(0);
            pending.time = pts_to_us(pts, self.time_base);
        }
        if decoded.is_planar() {
            interleave(&planes, samples, bytes, &mut pending.bytes);
        } else {
            pending.bytes.extend_from_slice(&planes[0][..per_plane]);
        }
    }

    fn read(&mut self, demuxer: &Mutex<Demuxer>, size: usize) -> AudioBlob {
        let mut decoded = AudioFrameFFmpeg::empty();

        // Drops samples buffered before a seek, even when enough are pending
        if !self.sync(demuxer) {
            return self.template.clone();
        }
        while self.pending.bytes.len() < size {
            if !self.sync(demuxer) {
                return self.template.clone();
            }

            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => {
                    self.append(&decoded);
                    continue;
                }
                Err(ffmpeg::Error::Eof) => break,
                Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => {}
                Err(e) => {
                    log::warn!("Audio stream {} decode failed: {}", self.stream, e);
                    break;
                }
            }

            let packet = demuxer.lock().next_packet(Kind::Audio, self.stream);
            match packet {
                Some(packet) => {
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        log::warn!("Audio stream {} rejected packet: {}", self.stream, e);
                    }
                }
                None if self.draining => break,
                None => {
                    self.decoder.send_eof().ok();
                    self.draining = true;
                }
            }
        }

        let blob = self.pending.take(&self.template, size);
        if blob.size > 0 {
            demuxer.lock().position = Some(blob.presentation_time);
        }
        log::trace!("Audio stream {} blob of {} bytes", self.stream, blob.size);
        blob
    }
}

/// Video stream description
struct VideoStream {
    template: VideoFrame,
    duration: i64,
    frame_rate: (i32, i32),
}

/// Audio stream description
struct AudioStream {
    template: AudioBlob,
    duration: i64,
}

/// Media object decoding a container through FFmpeg
pub struct FfmpegMedia {
    url: String,
    tags: Vec<(String, String)>,
    video: Vec<VideoStream>,
    audio: Vec<AudioStream>,
    demuxer: Arc<Mutex<Demuxer>>,
    video_workers: Vec<ReadWorker<(), VideoFrame>>,
    audio_workers: Vec<ReadWorker<usize, AudioBlob>>,
}

impl FfmpegMedia {
    /// Open a container with the given decoder configuration
    pub fn open_with_config(url: &str, config: &DecoderConfig) -> Result<Self> {
        // Safe to call multiple times
        ffmpeg::init().map_err(|e| Error::FFmpeg {
            code: -1,
            message: format!("FFmpeg init failed: {}", e),
        })?;

        let input = ffmpeg::format::input(url).map_err(|e| {
            if e.to_string().contains("No such file") {
                Error::FileNotFound(url.into())
            } else {
                Error::InvalidFormat(e.to_string())
            }
        })?;
        log::debug!("Opened {} ({})", url, input.format().name());

        let tags: Vec<(String, String)> = input
            .metadata()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let mut video = Vec::new();
        let mut audio = Vec::new();
        let mut video_decoders = Vec::new();
        let mut audio_decoders = Vec::new();
        let mut video_index = Vec::new();
        let mut audio_index = Vec::new();

        for stream in input.streams() {
            let medium = stream.parameters().medium();
            if medium != MediaType::Video && medium != MediaType::Audio {
                continue;
            }

            let mut context = CodecContext::from_parameters(stream.parameters())?;
            if config.thread_count > 0 {
                unsafe {
                    (*context.as_mut_ptr()).thread_count = config.thread_count as i32;
                }
            }
            let stream_tags: Vec<(String, String)> = stream
                .metadata()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();

            if medium == MediaType::Video {
                let decoder = context.decoder().video().map_err(|e| {
                    Error::DecodeFailed(format!("Failed to open video decoder: {}", e))
                })?;
                let (width, height) = (decoder.width(), decoder.height());
                if width == 0 || height == 0 {
                    log::warn!("Skipping video stream {} without geometry", stream.index());
                    continue;
                }

                let sar = decoder.aspect_ratio();
                let sar = if sar.numerator() > 0 && sar.denominator() > 0 {
                    sar.numerator() as f32 / sar.denominator() as f32
                } else {
                    1.0
                };
                let mut template = VideoFrame::template(width, height, width as f32 * sar / height as f32);

                let scaler = match pixel_layout(decoder.format()) {
                    Some((layout, range)) => {
                        template.layout = layout;
                        template.value_range = range.unwrap_or(match decoder.color_range() {
                            ffmpeg::color::Range::JPEG => ValueRange::U8Full,
                            _ => ValueRange::U8Mpeg,
                        });
                        None
                    }
                    None => {
                        template.layout = PixelLayout::Bgra32;
                        template.value_range = ValueRange::U8Full;
                        log::debug!("Converting {:?} to BGRA", decoder.format());
                        Some(
                            ScalerContext::get(
                                decoder.format(),
                                width,
                                height,
                                Pixel::BGRA,
                                width,
                                height,
                                ScalerFlags::BILINEAR,
                            )
                            .map_err(|e| {
                                Error::DecodeFailed(format!("Failed to create scaler: {}", e))
                            })?,
                        )
                    }
                };
                template.color_space = if template.layout == PixelLayout::Bgra32 {
                    ColorSpace::Srgb
                } else {
                    color_space(decoder.color_space(), height)
                };
                template.chroma_location = chroma_location(decoder.chroma_location());

                // Stream tags follow container tags so they take precedence
                let all_tags = tags.iter().chain(stream_tags.iter());
                if let Some((layout, swap)) =
                    layout_from_tags(all_tags.map(|(k, v)| (k.as_str(), v.as_str())))
                {
                    template.stereo_layout = layout;
                    template.stereo_layout_swap = swap;
                    template.set_view_dimensions();
                }

                let rate = stream.avg_frame_rate();
                let rate = if rate.denominator() > 0 && rate.numerator() > 0 {
                    rate
                } else {
                    stream.rate()
                };

                let local = video.len();
                video_decoders.push(VideoDecoder {
                    stream: local,
                    decoder,
                    scaler,
                    template: template.clone(),
                    time_base: stream.time_base(),
                    generation: 0,
                    draining: false,
                });
                video.push(VideoStream {
                    template,
                    duration: stream_duration(&input, &stream),
                    frame_rate: (rate.numerator(), rate.denominator()),
                });
                video_index.push(stream.index());
            } else {
                let decoder = context.decoder().audio().map_err(|e| {
                    Error::DecodeFailed(format!("Failed to open audio decoder: {}", e))
                })?;
                let format = match sample_format(decoder.format()) {
                    Some(format) => format,
                    None => {
                        log::warn!(
                            "Skipping audio stream {} with sample format {:?}",
                            stream.index(),
                            decoder.format()
                        );
                        continue;
                    }
                };
                let channels = unsafe { (*stream.parameters().as_ptr()).ch_layout.nb_channels };

                let mut template = AudioBlob::template(channels.max(0) as u32, decoder.rate(), format);
                if let Some((_, language)) = stream_tags.iter().find(|(k, _)| k == "language") {
                    template.language = language.clone();
                }

                let local = audio.len();
                audio_decoders.push(AudioDecoder {
                    stream: local,
                    decoder,
                    template: template.clone(),
                    time_base: stream.time_base(),
                    draining: false,
                    pending: PendingAudio::default(),
                });
                audio.push(AudioStream {
                    template,
                    duration: stream_duration(&input, &stream),
                });
                audio_index.push(stream.index());
            }
        }

        let demuxer = Arc::new(Mutex::new(Demuxer {
            input,
            video_active: vec![false; video_index.len()],
            audio_active: vec![false; audio_index.len()],
            video_queues: (0..video_index.len()).map(|_| StreamQueue::default()).collect(),
            audio_queues: (0..audio_index.len()).map(|_| StreamQueue::default()).collect(),
            video_index,
            audio_index,
            max_queued_packets: config.max_queued_packets.max(1),
            eof: false,
            generation: 0,
            position: None,
        }));

        let mut video_workers = Vec::with_capacity(video_decoders.len());
        for (i, mut decoder) in video_decoders.into_iter().enumerate() {
            let demuxer = demuxer.clone();
            video_workers.push(ReadWorker::spawn(format!("video-{}", i), move |()| {
                decoder.read(&demuxer)
            })?);
        }

        let mut audio_workers = Vec::with_capacity(audio_decoders.len());
        for (i, mut decoder) in audio_decoders.into_iter().enumerate() {
            let demuxer = demuxer.clone();
            audio_workers.push(ReadWorker::spawn(format!("audio-{}", i), move |size: usize| {
                decoder.read(&demuxer, size)
            })?);
        }

        log::info!(
            "Opened {}: {} video, {} audio, {} tags",
            url,
            video.len(),
            audio.len(),
            tags.len()
        );

        Ok(Self {
            url: url.to_string(),
            tags,
            video,
            audio,
            demuxer,
            video_workers,
            audio_workers,
        })
    }
}

impl OpenMedia for FfmpegMedia {
    fn open(url: &str) -> Result<Self> {
        Self::open_with_config(url, &DecoderConfig::default())
    }
}

impl MediaObject for FfmpegMedia {
    fn url(&self) -> &str {
        &self.url
    }

    fn video_streams(&self) -> usize {
        self.video.len()
    }

    fn audio_streams(&self) -> usize {
        self.audio.len()
    }

    fn video_frame_template(&self, stream: usize) -> &VideoFrame {
        &self.video[stream].template
    }

    fn audio_blob_template(&self, stream: usize) -> &AudioBlob {
        &self.audio[stream].template
    }

    fn video_duration(&self, stream: usize) -> i64 {
        self.video[stream].duration
    }

    fn audio_duration(&self, stream: usize) -> i64 {
        self.audio[stream].duration
    }

    fn video_frame_rate_numerator(&self, stream: usize) -> i32 {
        self.video[stream].frame_rate.0
    }

    fn video_frame_rate_denominator(&self, stream: usize) -> i32 {
        self.video[stream].frame_rate.1
    }

    fn tags(&self) -> usize {
        self.tags.len()
    }

    fn tag_name(&self, index: usize) -> &str {
        &self.tags[index].0
    }

    fn tag_value(&self, index: usize) -> &str {
        &self.tags[index].1
    }

    fn video_stream_set_active(&mut self, stream: usize, active: bool) {
        self.demuxer.lock().set_active(Kind::Video, stream, active);
    }

    fn audio_stream_set_active(&mut self, stream: usize, active: bool) {
        self.demuxer.lock().set_active(Kind::Audio, stream, active);
    }

    fn start_video_frame_read(&mut self, stream: usize) {
        if let Err(e) = self.video_workers[stream].start(()) {
            log::warn!("{}: video {} read could not start: {}", self.url, stream, e);
        }
    }

    fn finish_video_frame_read(&mut self, stream: usize) -> VideoFrame {
        self.video_workers[stream].finish().unwrap_or_else(|e| {
            log::warn!("{}: video {} read failed: {}", self.url, stream, e);
            VideoFrame::default()
        })
    }

    fn start_audio_blob_read(&mut self, stream: usize, size: usize) {
        if let Err(e) = self.audio_workers[stream].start(size) {
            log::warn!("{}: audio {} read could not start: {}", self.url, stream, e);
        }
    }

    fn finish_audio_blob_read(&mut self, stream: usize) -> AudioBlob {
        self.audio_workers[stream].finish().unwrap_or_else(|e| {
            log::warn!("{}: audio {} read failed: {}", self.url, stream, e);
            self.audio[stream].template.clone()
        })
    }

    fn seek(&mut self, position: i64) -> Result<()> {
        log::debug!("{}: seek to {} us", self.url, position);
        self.demuxer.lock().seek(position)
    }

    fn tell(&self) -> Option<i64> {
        self.demuxer.lock().position
    }

    fn close(&mut self) {
        // Joins the workers; the demuxer goes with the last reference
        self.video_workers.clear();
        self.audio_workers.clear();
        log::debug!("Closed {}", self.url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg_next::format::sample;
    use std::io::Write;

    #[test]
    fn test_pts_conversion() {
        assert_eq!(pts_to_us(90000, Rational::new(1, 90000)), 1_000_000);
        assert_eq!(pts_to_us(1001, Rational::new(1, 24000)), 41_708);
        assert_eq!(pts_to_us(42, Rational::new(1, 0)), 42);

        // Large timestamps do not overflow
        assert_eq!(
            pts_to_us(i64::MAX / 1000, Rational::new(1, 1_000_000)),
            i64::MAX / 1000
        );
    }

    #[test]
    fn test_pixel_format_mapping() {
        assert_eq!(pixel_layout(Pixel::YUV420P), Some((PixelLayout::Yuv420p, None)));
        assert_eq!(
            pixel_layout(Pixel::YUVJ422P),
            Some((PixelLayout::Yuv422p, Some(ValueRange::U8Full)))
        );
        assert_eq!(pixel_layout(Pixel::NV12), None);
        assert_eq!(pixel_layout(Pixel::RGB24), None);
    }

    #[test]
    fn test_color_mapping() {
        assert_eq!(color_space(ffmpeg::color::Space::BT709, 480), ColorSpace::Yuv709);
        assert_eq!(color_space(ffmpeg::color::Space::Unspecified, 576), ColorSpace::Yuv601);
        assert_eq!(color_space(ffmpeg::color::Space::Unspecified, 1080), ColorSpace::Yuv709);
        assert_eq!(
            chroma_location(ffmpeg::chroma::Location::Unspecified),
            ChromaLocation::Left
        );
        assert_eq!(sample_format(Sample::I16(sample::Type::Planar)), Some(SampleFormat::S16));
        assert_eq!(sample_format(Sample::None), None);
    }

    fn packet(key: bool) -> Packet {
        let mut packet = Packet::empty();
        if key {
            packet.set_flags(ffmpeg::codec::packet::Flags::KEY);
        }
        packet
    }

    #[test]
    fn test_queue_overflow_resumes_at_keyframe() {
        let mut queue = StreamQueue::default();
        assert!(queue.push(packet(true), 3));
        assert!(queue.push(packet(false), 3));
        assert!(queue.push(packet(false), 3));

        // Overflow empties the queue; inter packets wait for a keyframe
        assert!(!queue.push(packet(false), 3));
        assert_eq!(queue.len(), 0);
        assert!(!queue.push(packet(false), 3));
        assert_eq!(queue.len(), 0);

        assert!(queue.push(packet(true), 3));
        assert!(queue.push(packet(false), 3));
        assert_eq!(queue.len(), 2);
        assert!(queue.pop().unwrap().is_key());
    }

    #[test]
    fn test_queue_overflow_on_keyframe_keeps_it() {
        let mut queue = StreamQueue::default();
        queue.push(packet(true), 2);
        queue.push(packet(false), 2);

        assert!(queue.push(packet(true), 2));
        assert_eq!(queue.len(), 1);
        assert!(queue.push(packet(false), 2));
    }

    #[test]
    fn test_queue_clear_stops_waiting() {
        let mut queue = StreamQueue::default();
        queue.push(packet(false), 1);
        queue.push(packet(false), 1);
        assert_eq!(queue.len(), 0);

        queue.clear();
        assert!(queue.push(packet(false), 1));
    }

    #[test]
    fn test_interleave_planes() {
        let left = [1u8, 1, 2, 2, 3, 3];
        let right = [7u8, 7, 8, 8, 9, 9];
        let mut out = vec![0xff];
        interleave(&[&left, &right], 3, 2, &mut out);
        assert_eq!(out, vec![0xff, 1, 1, 7, 7, 2, 2, 8, 8, 3, 3, 9, 9]);
    }

    #[test]
    fn test_interleave_ignores_plane_padding() {
        let padded = [5u8, 6, 0, 0];
        let mut out = Vec::new();
        interleave(&[&padded], 2, 1, &mut out);
        assert_eq!(out, vec![5, 6]);
    }

    #[test]
    fn test_pending_audio_dropped_after_seek() {
        let template = AudioBlob::template(2, 48000, SampleFormat::S16);
        let mut pending = PendingAudio::default();
        pending.bytes = vec![1; 4800];
        pending.time = 500_000;

        // Same generation keeps the buffered samples
        assert!(!pending.resync(0));
        assert_eq!(pending.bytes.len(), 4800);

        // A seek bumps the generation; nothing stale may be delivered
        assert!(pending.resync(1));
        assert!(pending.take(&template, 1920).is_empty());
        assert!(!pending.resync(1));
    }

    #[test]
    fn test_pending_audio_take_whole_frames() {
        let template = AudioBlob::template(2, 48000, SampleFormat::S16);
        let mut pending = PendingAudio::default();
        pending.bytes = (0..10).collect();
        pending.time = 1_000;

        let blob = pending.take(&template, 7);
        assert_eq!(blob.size, 4);
        assert_eq!(blob.presentation_time, 1_000);
        assert_eq!(&blob.data.unwrap()[..], &[0, 1, 2, 3]);

        // One stereo S16 sample frame at 48 kHz
        assert_eq!(pending.time, 1_000 + 20);
        assert_eq!(pending.bytes.len(), 6);
    }

    #[test]
    fn test_open_missing_file() {
        let err = FfmpegMedia::open("/nonexistent/stereo.mkv").err().unwrap();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_open_garbage_file() {
        let mut file = tempfile::Builder::new().suffix(".mkv").tempfile().unwrap();
        file.write_all(&[0x5a; 4096]).unwrap();
        file.flush().unwrap();

        let result = FfmpegMedia::open(file.path().to_str().unwrap());
        assert!(result.is_err());
    }
}
