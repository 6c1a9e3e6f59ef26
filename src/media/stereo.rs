//! Stereoscopic layout types

/// Arrangement of the left and right views within or across frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StereoLayout {
    /// Single view, no stereo information
    #[default]
    Mono,
    /// Two views from two independently decoded streams
    Separate,
    /// Views alternate frame by frame
    Alternating,
    /// Views stacked vertically, each at full resolution
    TopBottom,
    /// Views stacked vertically, each squeezed to half height
    TopBottomHalf,
    /// Views side by side, each at full resolution
    LeftRight,
    /// Views side by side, each squeezed to half width
    LeftRightHalf,
    /// Views interleaved row by row
    EvenOddRows,
}

const LAYOUT_NAMES: [(StereoLayout, bool, &str); 15] = [
    (StereoLayout::Mono, false, "mono"),
    (StereoLayout::Separate, false, "separate-left-right"),
    (StereoLayout::Separate, true, "separate-right-left"),
    (StereoLayout::Alternating, false, "alternating-left-right"),
    (StereoLayout::Alternating, true, "alternating-right-left"),
    (StereoLayout::TopBottom, false, "top-bottom"),
    (StereoLayout::TopBottom, true, "bottom-top"),
    (StereoLayout::TopBottomHalf, false, "top-bottom-half"),
    (StereoLayout::TopBottomHalf, true, "bottom-top-half"),
    (StereoLayout::LeftRight, false, "left-right"),
    (StereoLayout::LeftRight, true, "right-left"),
    (StereoLayout::LeftRightHalf, false, "left-right-half"),
    (StereoLayout::LeftRightHalf, true, "right-left-half"),
    (StereoLayout::EvenOddRows, false, "even-odd-rows"),
    (StereoLayout::EvenOddRows, true, "odd-even-rows"),
];

/// Name of a layout together with its view order.
///
/// `mono` has no view order, so the swap flag is ignored for it.
pub fn layout_to_string(layout: StereoLayout, swap: bool) -> &'static str {
    let swap = swap && layout != StereoLayout::Mono;
    LAYOUT_NAMES
        .iter()
        .find(|(l, s, _)| *l == layout && *s == swap)
        .map(|(_, _, name)| *name)
        .unwrap_or("mono")
}

/// Parse a name produced by [`layout_to_string`]
pub fn layout_from_string(name: &str) -> Option<(StereoLayout, bool)> {
    LAYOUT_NAMES
        .iter()
        .find(|(_, _, n)| *n == name)
        .map(|(layout, swap, _)| (*layout, *swap))
}

/// Detect a declared stereo layout from metadata tags.
///
/// Understands the Matroska `stereo_mode` values and the
/// `StereoscopicLayout` tag family written by some 3D distributors.
/// Later tags override earlier ones, so stream tags should follow
/// container tags.
pub fn layout_from_tags<'a, I>(tags: I) -> Option<(StereoLayout, bool)>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut detected = None;
    let mut half_width = false;
    let mut half_height = false;

    for (name, value) in tags {
        match name {
            "stereo_mode" => {
                let found = match value {
                    "mono" => Some((StereoLayout::Mono, false)),
                    "left_right" => Some((StereoLayout::LeftRight, false)),
                    "right_left" => Some((StereoLayout::LeftRight, true)),
                    "top_bottom" => Some((StereoLayout::TopBottom, false)),
                    "bottom_top" => Some((StereoLayout::TopBottom, true)),
                    "row_interleaved_lr" => Some((StereoLayout::EvenOddRows, false)),
                    "row_interleaved_rl" => Some((StereoLayout::EvenOddRows, true)),
                    "block_lr" => Some((StereoLayout::Alternating, false)),
                    "block_rl" => Some((StereoLayout::Alternating, true)),
                    _ => None,
                };
                if found.is_some() {
                    detected = found;
                }
            }
            "StereoscopicLayout" => {
                let found = match value {
                    "SideBySideLF" => Some((StereoLayout::LeftRight, false)),
                    "SideBySideRF" => Some((StereoLayout::LeftRight, true)),
                    "OverUnderLT" => Some((StereoLayout::TopBottom, false)),
                    "OverUnderRT" => Some((StereoLayout::TopBottom, true)),
                    _ => None,
                };
                if found.is_some() {
                    detected = found;
                }
            }
            "StereoscopicHalfWidth" => half_width = value == "1",
            "StereoscopicHalfHeight" => half_height = value == "1",
            _ => {}
        }
    }

    detected.map(|(layout, swap)| match layout {
        StereoLayout::LeftRight if half_width => (StereoLayout::LeftRightHalf, swap),
        StereoLayout::TopBottom if half_height => (StereoLayout::TopBottomHalf, swap),
        other => (other, swap),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_names() {
        assert_eq!(layout_to_string(StereoLayout::LeftRight, true), "right-left");
        assert_eq!(layout_to_string(StereoLayout::Separate, false), "separate-left-right");
        assert_eq!(layout_to_string(StereoLayout::Mono, true), "mono");
        assert_eq!(
            layout_from_string("bottom-top-half"),
            Some((StereoLayout::TopBottomHalf, true))
        );
        assert_eq!(layout_from_string("sideways"), None);
    }

    #[test]
    fn test_every_name_parses_back() {
        for (layout, swap, name) in LAYOUT_NAMES {
            assert_eq!(layout_from_string(name), Some((layout, swap)));
            assert_eq!(layout_to_string(layout, swap), name);
        }
    }

    #[test]
    fn test_matroska_stereo_mode() {
        let tags = [("title", "Demo"), ("stereo_mode", "bottom_top")];
        assert_eq!(
            layout_from_tags(tags.iter().copied()),
            Some((StereoLayout::TopBottom, true))
        );
        assert_eq!(layout_from_tags([("stereo_mode", "anaglyph_cyan_red")]), None);
    }

    #[test]
    fn test_stereoscopic_layout_tags() {
        let tags = [
            ("StereoscopicLayout", "SideBySideRF"),
            ("StereoscopicHalfWidth", "1"),
        ];
        assert_eq!(
            layout_from_tags(tags.iter().copied()),
            Some((StereoLayout::LeftRightHalf, true))
        );

        let tags = [("StereoscopicLayout", "OverUnderLT")];
        assert_eq!(
            layout_from_tags(tags.iter().copied()),
            Some((StereoLayout::TopBottom, false))
        );
    }

    #[test]
    fn test_no_tags() {
        assert_eq!(layout_from_tags(std::iter::empty()), None);
    }
}
