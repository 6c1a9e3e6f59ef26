//! Flat stream index mapping
//!
//! Video (resp. audio) streams of all media objects are numbered in one
//! flat space: the local streams of object 0, then those of object 1, and
//! so on.

use crate::media::MediaObject;

/// Media kind of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
}

/// Position of a flat stream inside the object list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamLocation {
    /// Index of the owning media object
    pub object: usize,

    /// Stream index local to that object
    pub stream: usize,
}

/// Map a flat index given the per-object stream counts.
///
/// # Panics
///
/// If `flat` is not below the sum of `counts`.
pub fn locate<I>(counts: I, flat: usize) -> StreamLocation
where
    I: IntoIterator<Item = usize>,
{
    let mut remaining = flat;
    for (object, count) in counts.into_iter().enumerate() {
        if remaining < count {
            return StreamLocation {
                object,
                stream: remaining,
            };
        }
        remaining -= count;
    }
    panic!("stream {} out of range", flat);
}

/// Number of streams of a kind in one object
pub fn stream_count<M: MediaObject>(object: &M, kind: StreamKind) -> usize {
    match kind {
        StreamKind::Video => object.video_streams(),
        StreamKind::Audio => object.audio_streams(),
    }
}

/// Total number of streams of a kind across all objects
pub fn total_streams<M: MediaObject>(objects: &[M], kind: StreamKind) -> usize {
    objects.iter().map(|o| stream_count(o, kind)).sum()
}

/// Map a flat stream index of `kind` to its owning object and local index
pub fn locate_stream<M: MediaObject>(objects: &[M], kind: StreamKind, flat: usize) -> StreamLocation {
    locate(objects.iter().map(|o| stream_count(o, kind)), flat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::synthetic::{SyntheticMedia, SyntheticSource};
    use crate::media::{AudioBlob, SampleFormat, VideoFrame};

    #[test]
    fn test_locate_prefix_sums() {
        let counts = [2, 1];
        assert_eq!(locate(counts, 0), StreamLocation { object: 0, stream: 0 });
        assert_eq!(locate(counts, 1), StreamLocation { object: 0, stream: 1 });
        assert_eq!(locate(counts, 2), StreamLocation { object: 1, stream: 0 });
    }

    #[test]
    fn test_locate_skips_empty_objects() {
        let counts = [0, 3, 0, 1];
        assert_eq!(locate(counts, 0), StreamLocation { object: 1, stream: 0 });
        assert_eq!(locate(counts, 2), StreamLocation { object: 1, stream: 2 });
        assert_eq!(locate(counts, 3), StreamLocation { object: 3, stream: 0 });
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_locate_out_of_range() {
        locate([2, 1], 3);
    }

    #[test]
    fn test_locate_stream_by_kind() {
        let video = VideoFrame::template(320, 240, 4.0 / 3.0);
        let audio = AudioBlob::template(2, 44100, SampleFormat::S16);
        let objects = vec![
            SyntheticMedia::open(
                SyntheticSource::new("a")
                    .with_video(video.clone(), 1_000_000)
                    .with_video(video.clone(), 1_000_000),
            )
            .unwrap(),
            SyntheticMedia::open(
                SyntheticSource::new("b")
                    .with_video(video, 1_000_000)
                    .with_audio(audio, 1_000_000),
            )
            .unwrap(),
        ];

        assert_eq!(total_streams(&objects, StreamKind::Video), 3);
        assert_eq!(total_streams(&objects, StreamKind::Audio), 1);
        assert_eq!(
            locate_stream(&objects, StreamKind::Video, 2),
            StreamLocation { object: 1, stream: 0 }
        );
        assert_eq!(
            locate_stream(&objects, StreamKind::Audio, 0),
            StreamLocation { object: 1, stream: 0 }
        );
    }
}
