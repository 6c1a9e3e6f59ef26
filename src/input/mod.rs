//! Unified input over one or more media objects
//!
//! A [`MediaInput`] opens an ordered list of containers and presents their
//! streams as one input: flat video and audio stream numbering, merged
//! tags, a common duration and a single current stereo layout. In the
//! `separate` layout the first two video streams are read together as the
//! two views of one stereo frame.

use crate::error::Result;
use crate::media::stereo::layout_to_string;
use crate::media::{AudioBlob, MediaObject, OpenMedia, StereoLayout, VideoFrame};

pub(crate) mod config;
mod info;
pub mod mapper;
pub mod resolver;

pub use config::{InputConfig, DEFAULT_SKIP_TAG};
pub use info::{InputSummary, StreamSummary};

use mapper::{locate_stream, total_streams, StreamKind, StreamLocation};

/// Basename of a URL, splitting on both `/` and `\`
fn basename(url: &str) -> &str {
    match url.rfind(['/', '\\']) {
        Some(i) => &url[i + 1..],
        None => url,
    }
}

/// Label prefix for item `index` of `count`, empty when there is only one
fn prefix(count: usize, index: usize) -> String {
    if count == 1 {
        String::new()
    } else {
        format!("{} - ", index + 1)
    }
}

/// Synchronized input over a list of media objects
pub struct MediaInput<M: MediaObject> {
    /// Input configuration
    config: InputConfig,

    /// Opened containers, in URL order
    objects: Vec<M>,

    /// Basenames of all URLs joined with `/`
    id: String,

    /// Merged tag table
    tag_names: Vec<String>,
    tag_values: Vec<String>,

    /// Display names per flat stream index
    video_stream_names: Vec<String>,
    audio_stream_names: Vec<String>,

    /// Exactly two compatible video streams exist
    supports_stereo_layout_separate: bool,

    active_video_stream: Option<usize>,
    active_audio_stream: Option<usize>,

    /// Lead-in to skip in microseconds
    initial_skip: i64,

    /// Duration in microseconds, -1 when closed
    duration: i64,

    /// Current video template, carrying the active stereo layout
    video_frame: VideoFrame,

    /// Current audio template
    audio_blob: AudioBlob,
}

impl<M: MediaObject> Default for MediaInput<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: MediaObject> MediaInput<M> {
    /// Create a closed input with the default configuration
    pub fn new() -> Self {
        Self::with_config(InputConfig::default())
    }

    /// Create a closed input
    pub fn with_config(config: InputConfig) -> Self {
        Self {
            config,
            objects: Vec::new(),
            id: String::new(),
            tag_names: Vec::new(),
            tag_values: Vec::new(),
            video_stream_names: Vec::new(),
            audio_stream_names: Vec::new(),
            supports_stereo_layout_separate: false,
            active_video_stream: None,
            active_audio_stream: None,
            initial_skip: 0,
            duration: -1,
            video_frame: VideoFrame::default(),
            audio_blob: AudioBlob::default(),
        }
    }

    /// Open `urls` using the backend's own opener
    pub fn open<S: AsRef<str>>(&mut self, urls: &[S]) -> Result<()>
    where
        M: OpenMedia,
    {
        self.open_with(urls, M::open)
    }

    /// Open `urls` in order, creating each media object with `opener`.
    ///
    /// If any object fails to open, the ones already opened are closed,
    /// the input stays closed and the error is returned.
    ///
    /// # Panics
    ///
    /// If `urls` is empty.
    pub fn open_with<S, F>(&mut self, urls: &[S], mut opener: F) -> Result<()>
    where
        S: AsRef<str>,
        F: FnMut(&str) -> Result<M>,
    {
        assert!(!urls.is_empty(), "no URLs to open");
        self.close();

        let mut objects = Vec::with_capacity(urls.len());
        for url in urls {
            let url = url.as_ref();
            match opener(url) {
                Ok(object) => objects.push(object),
                Err(e) => {
                    log::error!("Failed to open {}: {}", url, e);
                    for mut object in objects {
                        object.close();
                    }
                    return Err(e);
                }
            }
        }
        self.objects = objects;

        self.id = self
            .objects
            .iter()
            .map(|o| basename(o.url()))
            .collect::<Vec<_>>()
            .join("/");

        let count = self.objects.len();
        for (i, object) in self.objects.iter().enumerate() {
            let pfx = prefix(count, i);
            for j in 0..object.tags() {
                self.tag_names.push(format!("{}{}", pfx, object.tag_name(j)));
                self.tag_values.push(format!("{}{}", pfx, object.tag_value(j)));
            }
        }

        for (i, object) in self.objects.iter().enumerate() {
            let pfx = prefix(count, i);
            let streams = object.video_streams();
            for j in 0..streams {
                self.video_stream_names.push(format!(
                    "{}{}{}",
                    pfx,
                    prefix(streams, j),
                    object.video_frame_template(j).format_info()
                ));
            }
        }
        for (i, object) in self.objects.iter().enumerate() {
            let pfx = prefix(count, i);
            let streams = object.audio_streams();
            for j in 0..streams {
                self.audio_stream_names.push(format!(
                    "{}{}{}",
                    pfx,
                    prefix(streams, j),
                    object.audio_blob_template(j).format_info()
                ));
            }
        }

        self.duration = self
            .objects
            .iter()
            .flat_map(|o| {
                (0..o.video_streams())
                    .map(move |s| o.video_duration(s))
                    .chain((0..o.audio_streams()).map(move |s| o.audio_duration(s)))
            })
            .min()
            .unwrap_or(0);

        // The tag name is not container-prefixed, so this only matches single-object inputs
        self.initial_skip = self
            .tag_value_by_name(&self.config.skip_tag)
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0);

        let resolution = resolver::resolve(&self.objects);
        self.supports_stereo_layout_separate = resolution.supports_separate;
        if let Some(initial) = resolution.initial {
            self.video_frame = initial;
            self.active_video_stream = Some(0);
            self.select_video_stream(0);
        }

        if self.audio_streams() > 0 {
            self.select_audio_stream(0);
        }

        log::info!("Opened input {} ({} media objects)", self.id, count);
        if self.config.log_summary {
            self.summary().log();
        }
        Ok(())
    }

    /// Identity of the input, empty when closed
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Opened media objects, in URL order
    pub fn media_objects(&self) -> &[M] {
        &self.objects
    }

    pub fn tags(&self) -> usize {
        self.tag_names.len()
    }

    pub fn tag_name(&self, index: usize) -> &str {
        &self.tag_names[index]
    }

    pub fn tag_value(&self, index: usize) -> &str {
        &self.tag_values[index]
    }

    /// Value of the first merged tag named exactly `name`
    pub fn tag_value_by_name(&self, name: &str) -> Option<&str> {
        self.tag_names
            .iter()
            .position(|n| n == name)
            .map(|i| self.tag_values[i].as_str())
    }

    /// Total number of video streams across all objects
    pub fn video_streams(&self) -> usize {
        total_streams(&self.objects, StreamKind::Video)
    }

    /// Total number of audio streams across all objects
    pub fn audio_streams(&self) -> usize {
        total_streams(&self.objects, StreamKind::Audio)
    }

    pub fn video_stream_name(&self, stream: usize) -> &str {
        &self.video_stream_names[stream]
    }

    pub fn audio_stream_name(&self, stream: usize) -> &str {
        &self.audio_stream_names[stream]
    }

    /// Initial skip in microseconds, 0 if none was declared
    pub fn initial_skip(&self) -> i64 {
        self.initial_skip
    }

    /// Duration in microseconds: the shortest stream, 0 without streams, -1 when closed
    pub fn duration(&self) -> i64 {
        self.duration
    }

    pub fn active_video_stream(&self) -> Option<usize> {
        self.active_video_stream
    }

    pub fn active_audio_stream(&self) -> Option<usize> {
        self.active_audio_stream
    }

    pub fn supports_stereo_layout_separate(&self) -> bool {
        self.supports_stereo_layout_separate
    }

    fn active_video(&self) -> usize {
        match self.active_video_stream {
            Some(stream) => stream,
            None => panic!("no active video stream"),
        }
    }

    fn active_audio(&self) -> usize {
        match self.active_audio_stream {
            Some(stream) => stream,
            None => panic!("no active audio stream"),
        }
    }

    fn active_video_location(&self) -> StreamLocation {
        locate_stream(&self.objects, StreamKind::Video, self.active_video())
    }

    fn active_audio_location(&self) -> StreamLocation {
        locate_stream(&self.objects, StreamKind::Audio, self.active_audio())
    }

    /// Locations of the two views of a `separate` pair
    fn separate_views(&self) -> [StreamLocation; 2] {
        [
            locate_stream(&self.objects, StreamKind::Video, 0),
            locate_stream(&self.objects, StreamKind::Video, 1),
        ]
    }

    fn is_separate(&self) -> bool {
        self.video_frame.stereo_layout == StereoLayout::Separate
    }

    /// Current video template, carrying the active stereo layout
    pub fn video_frame_template(&self) -> &VideoFrame {
        assert!(self.active_video_stream.is_some(), "no active video stream");
        &self.video_frame
    }

    pub fn video_frame_rate_numerator(&self) -> i32 {
        let location = self.active_video_location();
        self.objects[location.object].video_frame_rate_numerator(location.stream)
    }

    pub fn video_frame_rate_denominator(&self) -> i32 {
        let location = self.active_video_location();
        self.objects[location.object].video_frame_rate_denominator(location.stream)
    }

    /// Frame duration of the active video stream in microseconds, 0 if the rate is unknown
    pub fn video_frame_duration(&self) -> i64 {
        let num = i64::from(self.video_frame_rate_numerator());
        let den = i64::from(self.video_frame_rate_denominator());
        if num == 0 {
            return 0;
        }
        den * 1_000_000 / num
    }

    /// Current audio template
    pub fn audio_blob_template(&self) -> &AudioBlob {
        assert!(self.active_audio_stream.is_some(), "no active audio stream");
        &self.audio_blob
    }

    /// Whether `layout` can be applied to the active video stream
    pub fn stereo_layout_is_supported(&self, layout: StereoLayout, _swap: bool) -> bool {
        if self.video_streams() == 0 {
            return false;
        }
        let location = self.active_video_location();
        let template = self.objects[location.object].video_frame_template(location.stream);
        resolver::layout_supported(layout, template, self.supports_stereo_layout_separate)
    }

    /// Apply a stereo layout to the active video stream.
    ///
    /// Entering `separate` reseeks every object to the position of the
    /// active stream's object so the second view starts in sync.
    ///
    /// # Panics
    ///
    /// If the layout is not supported.
    pub fn set_stereo_layout(&mut self, layout: StereoLayout, swap: bool) {
        assert!(
            self.stereo_layout_is_supported(layout, swap),
            "stereo layout {} not supported",
            layout_to_string(layout, swap)
        );
        let entering_separate = layout == StereoLayout::Separate && !self.is_separate();

        let location = self.active_video_location();
        let mut frame = self.objects[location.object]
            .video_frame_template(location.stream)
            .clone();
        frame.stereo_layout = layout;
        frame.stereo_layout_swap = swap;
        frame.set_view_dimensions();
        self.video_frame = frame;
        self.activate_video_streams();

        if entering_separate {
            if let Some(position) = self.objects[location.object].tell() {
                log::debug!("Resyncing views at {} us", position);
                self.seek(position);
            }
        }
    }

    /// Select the video stream to read.
    ///
    /// In the `separate` layout both views stay active and the selection
    /// is left unchanged. Otherwise the current layout is kept if the new
    /// stream supports it, else it falls back to `mono`.
    pub fn select_video_stream(&mut self, stream: usize) {
        assert!(stream < self.video_streams(), "video stream {} out of range", stream);
        if self.is_separate() {
            self.activate_video_streams();
            return;
        }

        self.active_video_stream = Some(stream);
        let layout = self.video_frame.stereo_layout;
        let swap = self.video_frame.stereo_layout_swap;
        if self.stereo_layout_is_supported(layout, swap) {
            self.set_stereo_layout(layout, swap);
        } else {
            log::warn!(
                "Stereo layout {} not supported by video stream {}, using mono",
                layout_to_string(layout, swap),
                stream
            );
            self.set_stereo_layout(StereoLayout::Mono, false);
        }
    }

    /// Select the audio stream to read
    pub fn select_audio_stream(&mut self, stream: usize) {
        assert!(stream < self.audio_streams(), "audio stream {} out of range", stream);
        self.active_audio_stream = Some(stream);
        let location = self.active_audio_location();
        self.audio_blob = self.objects[location.object]
            .audio_blob_template(location.stream)
            .clone();

        for (o, object) in self.objects.iter_mut().enumerate() {
            for s in 0..object.audio_streams() {
                object.audio_stream_set_active(s, o == location.object && s == location.stream);
            }
        }
        log::debug!("Audio stream {} active ({:?})", stream, location);
    }

    /// Mark exactly the streams the current layout reads as active
    fn activate_video_streams(&mut self) {
        let wanted: Vec<StreamLocation> = if self.is_separate() {
            self.separate_views().to_vec()
        } else {
            vec![self.active_video_location()]
        };

        for (o, object) in self.objects.iter_mut().enumerate() {
            for s in 0..object.video_streams() {
                let active = wanted.contains(&StreamLocation { object: o, stream: s });
                object.video_stream_set_active(s, active);
            }
        }
        log::debug!("Video streams active: {:?}", wanted);
    }

    /// Start reading the next video frame.
    ///
    /// In the `separate` layout both views are started before either is
    /// finished so they decode concurrently.
    pub fn start_video_frame_read(&mut self) {
        if self.is_separate() {
            assert!(self.active_video_stream.is_some(), "no active video stream");
            for location in self.separate_views() {
                self.objects[location.object].start_video_frame_read(location.stream);
            }
        } else {
            let location = self.active_video_location();
            self.objects[location.object].start_video_frame_read(location.stream);
        }
    }

    /// Finish the read started by [`Self::start_video_frame_read`].
    ///
    /// Returns an invalid frame at the end of the input. A `separate` pair
    /// is invalid as soon as either view is.
    pub fn finish_video_frame_read(&mut self) -> VideoFrame {
        let mut frame = self.video_frame_template().clone();
        if self.is_separate() {
            let [first, second] = self.separate_views();
            let left = self.objects[first.object].finish_video_frame_read(first.stream);
            let right = self.objects[second.object].finish_video_frame_read(second.stream);
            if !left.is_valid() || !right.is_valid() {
                log::trace!("Stereo pair incomplete");
                return VideoFrame::default();
            }
            frame.data = [left.data[0].clone(), right.data[0].clone()];
            frame.line_size = [left.line_size[0], right.line_size[0]];
            frame.presentation_time = left.presentation_time;
        } else {
            let location = self.active_video_location();
            let single = self.objects[location.object].finish_video_frame_read(location.stream);
            if !single.is_valid() {
                return VideoFrame::default();
            }
            frame.data[0] = single.data[0].clone();
            frame.line_size[0] = single.line_size[0];
            frame.presentation_time = single.presentation_time;
        }
        log::trace!("Video frame at {} us", frame.presentation_time);
        frame
    }

    /// Start reading at most `size` bytes from the active audio stream
    pub fn start_audio_blob_read(&mut self, size: usize) {
        let location = self.active_audio_location();
        self.objects[location.object].start_audio_blob_read(location.stream, size);
    }

    /// Finish the audio read; a short blob signals the end of the stream
    pub fn finish_audio_blob_read(&mut self) -> AudioBlob {
        let location = self.active_audio_location();
        self.objects[location.object].finish_audio_blob_read(location.stream)
    }

    /// Seek every object, active or not, to `position` in microseconds
    pub fn seek(&mut self, position: i64) {
        for object in &mut self.objects {
            if let Err(e) = object.seek(position) {
                log::warn!("Seek of {} to {} us failed: {}", object.url(), position, e);
            }
        }
    }

    /// Close every object and reset the input. Closing twice is a no-op.
    pub fn close(&mut self) {
        if !self.objects.is_empty() {
            log::info!("Closing input {}", self.id);
        }
        for object in &mut self.objects {
            object.close();
        }
        self.objects.clear();
        self.id.clear();
        self.tag_names.clear();
        self.tag_values.clear();
        self.video_stream_names.clear();
        self.audio_stream_names.clear();
        self.supports_stereo_layout_separate = false;
        self.active_video_stream = None;
        self.active_audio_stream = None;
        self.initial_skip = 0;
        self.duration = -1;
        self.video_frame = VideoFrame::default();
        self.audio_blob = AudioBlob::default();
    }

    /// Overview of the opened input
    pub fn summary(&self) -> InputSummary {
        let stereo_layout = self.active_video_stream.map(|_| {
            layout_to_string(
                self.video_frame.stereo_layout,
                self.video_frame.stereo_layout_swap,
            )
            .to_string()
        });

        let video = (0..self.video_streams())
            .map(|i| {
                let location = locate_stream(&self.objects, StreamKind::Video, i);
                StreamSummary {
                    name: self.video_stream_names[i].clone(),
                    format: self.objects[location.object]
                        .video_frame_template(location.stream)
                        .format_name(),
                }
            })
            .collect();

        let audio = (0..self.audio_streams())
            .map(|i| {
                let location = locate_stream(&self.objects, StreamKind::Audio, i);
                StreamSummary {
                    name: self.audio_stream_names[i].clone(),
                    format: self.objects[location.object]
                        .audio_blob_template(location.stream)
                        .format_name(),
                }
            })
            .collect();

        InputSummary {
            id: self.id.clone(),
            duration: self.duration,
            stereo_layout,
            video,
            audio,
        }
    }
}

impl<M: MediaObject> Drop for MediaInput<M> {
    fn drop(&mut self) {
        self.close();
    }
}
