//! Video frame types

use std::sync::Arc;

use super::stereo::{layout_to_string, StereoLayout};

/// Shared, immutable plane bytes
pub type PlaneData = Arc<[u8]>;

/// Pixel layout of decoded video data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelLayout {
    /// Packed 32-bit BGRA
    #[default]
    Bgra32,
    /// Planar YUV, no chroma subsampling
    Yuv444p,
    /// Planar YUV, horizontal chroma subsampling
    Yuv422p,
    /// Planar YUV, horizontal and vertical chroma subsampling
    Yuv420p,
}

impl PixelLayout {
    /// Number of planes carrying data
    pub fn planes(self) -> usize {
        match self {
            PixelLayout::Bgra32 => 1,
            _ => 3,
        }
    }

    /// Bytes per row and row count of a tightly packed plane
    pub fn plane_geometry(self, plane: usize, width: u32, height: u32) -> (usize, usize) {
        let (w, h) = (width as usize, height as usize);
        match (self, plane) {
            (PixelLayout::Bgra32, _) => (w * 4, h),
            (_, 0) | (PixelLayout::Yuv444p, _) => (w, h),
            (PixelLayout::Yuv422p, _) => (w.div_ceil(2), h),
            (PixelLayout::Yuv420p, _) => (w.div_ceil(2), h.div_ceil(2)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PixelLayout::Bgra32 => "bgra32",
            PixelLayout::Yuv444p => "yuv444p",
            PixelLayout::Yuv422p => "yuv422p",
            PixelLayout::Yuv420p => "yuv420p",
        }
    }
}

/// Color space of the pixel values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorSpace {
    #[default]
    Srgb,
    Yuv601,
    Yuv709,
}

impl ColorSpace {
    pub fn name(self) -> &'static str {
        match self {
            ColorSpace::Srgb => "srgb",
            ColorSpace::Yuv601 => "601",
            ColorSpace::Yuv709 => "709",
        }
    }
}

/// Range of the stored values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueRange {
    /// 0-255
    #[default]
    U8Full,
    /// 16-235 luma, 16-240 chroma
    U8Mpeg,
}

impl ValueRange {
    pub fn name(self) -> &'static str {
        match self {
            ValueRange::U8Full => "jpeg",
            ValueRange::U8Mpeg => "mpeg",
        }
    }
}

/// Position of chroma samples relative to luma samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChromaLocation {
    #[default]
    Center,
    Left,
    TopLeft,
}

impl ChromaLocation {
    pub fn name(self) -> &'static str {
        match self {
            ChromaLocation::Center => "center",
            ChromaLocation::Left => "left",
            ChromaLocation::TopLeft => "topleft",
        }
    }
}

/// Video frame format template and decoded frame.
///
/// Media objects hand out templates (no data) describing each stream, and
/// decoded frames carrying plane data. A stereo frame holds up to two views;
/// view 0 is always the canonical one. For single-stream layouts all data
/// sits in view 0 and `stereo_layout` tells consumers how to split it.
#[derive(Clone, PartialEq, Default)]
pub struct VideoFrame {
    /// Width of the stored frame
    pub raw_width: u32,

    /// Height of the stored frame
    pub raw_height: u32,

    /// Width of one view
    pub width: u32,

    /// Height of one view
    pub height: u32,

    /// Display aspect ratio of the stored frame
    pub aspect_ratio: f32,

    pub layout: PixelLayout,
    pub color_space: ColorSpace,
    pub value_range: ValueRange,
    pub chroma_location: ChromaLocation,

    pub stereo_layout: StereoLayout,

    /// Whether the right view comes first
    pub stereo_layout_swap: bool,

    /// Plane data per view
    pub data: [[Option<PlaneData>; 3]; 2],

    /// Bytes per row per view and plane
    pub line_size: [[usize; 3]; 2],

    /// Presentation timestamp in microseconds
    pub presentation_time: i64,
}

impl VideoFrame {
    /// Create a mono template with the given geometry and 8-bit 4:2:0 video defaults
    pub fn template(raw_width: u32, raw_height: u32, aspect_ratio: f32) -> Self {
        Self {
            raw_width,
            raw_height,
            width: raw_width,
            height: raw_height,
            aspect_ratio,
            layout: PixelLayout::Yuv420p,
            color_space: ColorSpace::Yuv709,
            value_range: ValueRange::U8Mpeg,
            chroma_location: ChromaLocation::Left,
            ..Self::default()
        }
    }

    /// A frame is valid once it has a geometry; end of stream yields an invalid frame
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Derive the size of one view from the raw size and stereo layout
    pub fn set_view_dimensions(&mut self) {
        self.width = self.raw_width;
        self.height = self.raw_height;
        match self.stereo_layout {
            StereoLayout::LeftRight | StereoLayout::LeftRightHalf => self.width /= 2,
            StereoLayout::TopBottom | StereoLayout::TopBottomHalf | StereoLayout::EvenOddRows => {
                self.height /= 2
            }
            StereoLayout::Mono | StereoLayout::Separate | StereoLayout::Alternating => {}
        }
    }

    /// Display aspect ratio of one view
    pub fn view_aspect_ratio(&self) -> f32 {
        match self.stereo_layout {
            StereoLayout::LeftRight => self.aspect_ratio / 2.0,
            StereoLayout::TopBottom => self.aspect_ratio * 2.0,
            _ => self.aspect_ratio,
        }
    }

    /// Short description, used in stream names
    pub fn format_info(&self) -> String {
        format!(
            "{}x{}, {:.3}:1",
            self.raw_width, self.raw_height, self.aspect_ratio
        )
    }

    /// Full format description
    pub fn format_name(&self) -> String {
        let mut name = format!(
            "{}x{}-{:.3}:1-{}",
            self.raw_width,
            self.raw_height,
            self.aspect_ratio,
            self.layout.name()
        );
        if self.layout != PixelLayout::Bgra32 {
            name.push('-');
            name.push_str(self.color_space.name());
            name.push('-');
            name.push_str(self.value_range.name());
            if self.layout != PixelLayout::Yuv444p {
                name.push('-');
                name.push_str(self.chroma_location.name());
            }
        }
        name.push('-');
        name.push_str(layout_to_string(self.stereo_layout, self.stereo_layout_swap));
        name
    }

    /// Presentation time in seconds
    pub fn pts_seconds(&self) -> f64 {
        self.presentation_time as f64 / 1_000_000.0
    }

    /// Whether view 1 carries data
    pub fn has_second_view(&self) -> bool {
        self.data[1][0].is_some()
    }
}

impl std::fmt::Debug for VideoFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoFrame")
            .field("raw_width", &self.raw_width)
            .field("raw_height", &self.raw_height)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("aspect_ratio", &self.aspect_ratio)
            .field("layout", &self.layout)
            .field("stereo_layout", &self.stereo_layout)
            .field("stereo_layout_swap", &self.stereo_layout_swap)
            .field("presentation_time", &self.presentation_time)
            .field("views", &(self.data[0][0].is_some() as u8 + self.has_second_view() as u8))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_invalid() {
        assert!(!VideoFrame::default().is_valid());
        assert!(VideoFrame::template(1920, 1080, 16.0 / 9.0).is_valid());
    }

    #[test]
    fn test_view_dimensions() {
        let mut frame = VideoFrame::template(3840, 1080, 32.0 / 9.0);
        frame.stereo_layout = StereoLayout::LeftRight;
        frame.set_view_dimensions();
        assert_eq!((frame.width, frame.height), (1920, 1080));
        assert_eq!(frame.view_aspect_ratio(), 16.0 / 9.0);

        frame.stereo_layout = StereoLayout::EvenOddRows;
        frame.set_view_dimensions();
        assert_eq!((frame.width, frame.height), (3840, 540));

        frame.stereo_layout = StereoLayout::Separate;
        frame.set_view_dimensions();
        assert_eq!((frame.width, frame.height), (3840, 1080));
    }

    #[test]
    fn test_plane_geometry() {
        assert_eq!(PixelLayout::Yuv420p.plane_geometry(0, 1921, 1081), (1921, 1081));
        assert_eq!(PixelLayout::Yuv420p.plane_geometry(1, 1921, 1081), (961, 541));
        assert_eq!(PixelLayout::Yuv422p.plane_geometry(2, 1920, 1080), (960, 1080));
        assert_eq!(PixelLayout::Bgra32.plane_geometry(0, 1920, 1080), (7680, 1080));
        assert_eq!(PixelLayout::Bgra32.planes(), 1);
    }

    #[test]
    fn test_format_strings() {
        let mut frame = VideoFrame::template(1920, 1080, 16.0 / 9.0);
        assert_eq!(frame.format_info(), "1920x1080, 1.778:1");
        assert_eq!(frame.format_name(), "1920x1080-1.778:1-yuv420p-709-mpeg-left-mono");

        frame.layout = PixelLayout::Bgra32;
        frame.stereo_layout = StereoLayout::TopBottom;
        frame.stereo_layout_swap = true;
        assert_eq!(frame.format_name(), "1920x1080-1.778:1-bgra32-bottom-top");
    }
}
