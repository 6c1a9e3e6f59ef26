//! Stereo layout resolution

use super::mapper::{locate_stream, total_streams, StreamKind};
use crate::media::{MediaObject, StereoLayout, VideoFrame};

/// Whether two video streams can serve as the two views of a `separate` pair.
///
/// Aspect ratios must be exactly equal.
#[allow(clippy::float_cmp)]
pub fn separate_compatible(first: &VideoFrame, second: &VideoFrame) -> bool {
    first.width == second.width
        && first.height == second.height
        && first.aspect_ratio == second.aspect_ratio
        && first.layout == second.layout
        && first.color_space == second.color_space
        && first.value_range == second.value_range
        && first.chroma_location == second.chroma_location
}

/// Whether `layout` can be applied to a stream with the given template
pub fn layout_supported(layout: StereoLayout, template: &VideoFrame, separate_supported: bool) -> bool {
    match layout {
        StereoLayout::LeftRight | StereoLayout::LeftRightHalf => template.raw_width % 2 == 0,
        StereoLayout::TopBottom | StereoLayout::TopBottomHalf | StereoLayout::EvenOddRows => {
            template.raw_height % 2 == 0
        }
        StereoLayout::Separate => separate_supported,
        StereoLayout::Mono | StereoLayout::Alternating => true,
    }
}

/// Outcome of resolving an opened object list
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Exactly two compatible video streams exist
    pub supports_separate: bool,

    /// Template for flat video stream 0 carrying the default layout, if any video exists
    pub initial: Option<VideoFrame>,
}

fn video_template<M: MediaObject>(objects: &[M], flat: usize) -> &VideoFrame {
    let location = locate_stream(objects, StreamKind::Video, flat);
    objects[location.object].video_frame_template(location.stream)
}

/// Decide the default stereo layout of the combined input
pub fn resolve<M: MediaObject>(objects: &[M]) -> Resolution {
    let video_streams = total_streams(objects, StreamKind::Video);
    if video_streams == 0 {
        return Resolution {
            supports_separate: false,
            initial: None,
        };
    }

    let supports_separate = video_streams == 2
        && separate_compatible(video_template(objects, 0), video_template(objects, 1));

    let mut initial = video_template(objects, 0).clone();
    if supports_separate {
        initial.stereo_layout = StereoLayout::Separate;
        initial.stereo_layout_swap = false;
        initial.set_view_dimensions();
    } else if initial.stereo_layout == StereoLayout::Separate {
        // A single stream cannot carry a separate pair
        log::warn!("Stream declares separate layout without a matching second stream, using mono");
        initial.stereo_layout = StereoLayout::Mono;
        initial.stereo_layout_swap = false;
        initial.set_view_dimensions();
    }

    Resolution {
        supports_separate,
        initial: Some(initial),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::synthetic::{SyntheticMedia, SyntheticSource};
    use crate::media::{ChromaLocation, ColorSpace, PixelLayout, ValueRange};

    fn hd() -> VideoFrame {
        VideoFrame::template(1920, 1080, 16.0 / 9.0)
    }

    fn open(templates: &[&[VideoFrame]]) -> Vec<SyntheticMedia> {
        templates
            .iter()
            .enumerate()
            .map(|(i, streams)| {
                let source = streams.iter().fold(
                    SyntheticSource::new(format!("/media/{}.mkv", i)),
                    |source, t| source.with_video(t.clone(), 1_000_000),
                );
                SyntheticMedia::open(source).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_identical_streams_are_compatible() {
        assert!(separate_compatible(&hd(), &hd()));
    }

    #[test]
    fn test_any_differing_field_is_incompatible() {
        let variants: Vec<Box<dyn Fn(&mut VideoFrame)>> = vec![
            Box::new(|t: &mut VideoFrame| t.width = 1280),
            Box::new(|t: &mut VideoFrame| t.height = 720),
            Box::new(|t: &mut VideoFrame| t.aspect_ratio = 4.0 / 3.0),
            Box::new(|t: &mut VideoFrame| t.layout = PixelLayout::Yuv422p),
            Box::new(|t: &mut VideoFrame| t.color_space = ColorSpace::Yuv601),
            Box::new(|t: &mut VideoFrame| t.value_range = ValueRange::U8Full),
            Box::new(|t: &mut VideoFrame| t.chroma_location = ChromaLocation::Center),
        ];
        for change in variants {
            let mut other = hd();
            change(&mut other);
            assert!(!separate_compatible(&hd(), &other));
        }
    }

    #[test]
    fn test_aspect_ratio_must_match_exactly() {
        let mut other = hd();
        other.aspect_ratio = f32::from_bits(other.aspect_ratio.to_bits() + 1);
        assert!(!separate_compatible(&hd(), &other));
    }

    #[test]
    fn test_layout_support_predicate() {
        let even = VideoFrame::template(1920, 1080, 16.0 / 9.0);
        let odd = VideoFrame::template(1921, 1081, 16.0 / 9.0);

        assert!(layout_supported(StereoLayout::LeftRight, &even, false));
        assert!(!layout_supported(StereoLayout::LeftRight, &odd, false));
        assert!(!layout_supported(StereoLayout::LeftRightHalf, &odd, false));
        assert!(!layout_supported(StereoLayout::TopBottom, &odd, false));
        assert!(!layout_supported(StereoLayout::EvenOddRows, &odd, false));
        assert!(layout_supported(StereoLayout::Alternating, &odd, false));
        assert!(layout_supported(StereoLayout::Mono, &odd, false));
        assert!(!layout_supported(StereoLayout::Separate, &even, false));
        assert!(layout_supported(StereoLayout::Separate, &even, true));
    }

    #[test]
    fn test_resolve_two_objects() {
        let objects = open(&[&[hd()], &[hd()]]);
        let resolution = resolve(&objects);
        assert!(resolution.supports_separate);
        assert_eq!(
            resolution.initial.unwrap().stereo_layout,
            StereoLayout::Separate
        );
    }

    #[test]
    fn test_resolve_two_streams_in_one_object() {
        let objects = open(&[&[hd(), hd()]]);
        assert!(resolve(&objects).supports_separate);
    }

    #[test]
    fn test_resolve_keeps_declared_layout() {
        let mut packed = VideoFrame::template(3840, 1080, 32.0 / 9.0);
        packed.stereo_layout = StereoLayout::LeftRight;
        packed.set_view_dimensions();

        let objects = open(&[&[packed.clone()]]);
        let resolution = resolve(&objects);
        assert!(!resolution.supports_separate);
        assert_eq!(resolution.initial, Some(packed));
    }

    #[test]
    fn test_resolve_declared_separate_without_pair() {
        let mut declared = hd();
        declared.stereo_layout = StereoLayout::Separate;
        declared.stereo_layout_swap = true;

        let objects = open(&[&[declared]]);
        let resolution = resolve(&objects);
        assert!(!resolution.supports_separate);

        let initial = resolution.initial.unwrap();
        assert_eq!(initial.stereo_layout, StereoLayout::Mono);
        assert!(!initial.stereo_layout_swap);
        assert_eq!((initial.width, initial.height), (1920, 1080));
    }

    #[test]
    fn test_resolve_three_streams() {
        let objects = open(&[&[hd(), hd()], &[hd()]]);
        let resolution = resolve(&objects);
        assert!(!resolution.supports_separate);
        assert_eq!(resolution.initial.unwrap().stereo_layout, StereoLayout::Mono);
    }

    #[test]
    fn test_resolve_without_video() {
        let no_video: &[VideoFrame] = &[];
        let objects = open(&[no_video]);
        assert_eq!(
            resolve(&objects),
            Resolution {
                supports_separate: false,
                initial: None
            }
        );
    }
}
