//! Audio blob types

use super::frame::PlaneData;

/// Sample format for interleaved audio data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SampleFormat {
    /// 8-bit unsigned integer
    U8,
    /// 16-bit signed integer
    #[default]
    S16,
    /// 32-bit signed integer
    S32,
    /// 32-bit float
    F32,
    /// 64-bit float
    D64,
}

impl SampleFormat {
    /// Bits per sample
    pub fn bits(self) -> u32 {
        match self {
            SampleFormat::U8 => 8,
            SampleFormat::S16 => 16,
            SampleFormat::S32 | SampleFormat::F32 => 32,
            SampleFormat::D64 => 64,
        }
    }

    /// Bytes per sample
    pub fn bytes(self) -> usize {
        self.bits() as usize / 8
    }

    pub fn name(self) -> &'static str {
        match self {
            SampleFormat::U8 => "u8",
            SampleFormat::S16 => "s16",
            SampleFormat::S32 => "s32",
            SampleFormat::F32 => "f32",
            SampleFormat::D64 => "d64",
        }
    }
}

/// Chunk of decoded, interleaved audio samples, or a stream format template
#[derive(Clone, PartialEq, Default)]
pub struct AudioBlob {
    /// Language code, empty if unknown
    pub language: String,

    /// Number of audio channels
    pub channels: u32,

    /// Sample rate in Hz
    pub rate: u32,

    pub sample_format: SampleFormat,

    /// Interleaved sample data
    pub data: Option<PlaneData>,

    /// Size of `data` in bytes
    pub size: usize,

    /// Presentation timestamp in microseconds
    pub presentation_time: i64,
}

impl AudioBlob {
    /// Create a template without data
    pub fn template(channels: u32, rate: u32, sample_format: SampleFormat) -> Self {
        Self {
            channels,
            rate,
            sample_format,
            ..Self::default()
        }
    }

    /// Bits per sample
    pub fn sample_bits(&self) -> u32 {
        self.sample_format.bits()
    }

    /// Bytes of one sample across all channels
    pub fn frame_bytes(&self) -> usize {
        self.channels as usize * self.sample_format.bytes()
    }

    /// Bytes of one second of audio
    pub fn bytes_per_second(&self) -> u64 {
        self.frame_bytes() as u64 * self.rate as u64
    }

    /// Duration of `size` bytes in microseconds
    pub fn duration_us(&self, size: usize) -> i64 {
        let bps = self.bytes_per_second();
        if bps == 0 {
            return 0;
        }
        (size as u128 * 1_000_000 / bps as u128) as i64
    }

    /// A zero-size blob marks end of stream
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Short description, used in stream names
    pub fn format_info(&self) -> String {
        format!(
            "{}, {} ch., {} kHz, {} bit",
            if self.language.is_empty() { "unknown" } else { self.language.as_str() },
            self.channels,
            self.rate as f32 / 1000.0,
            self.sample_bits()
        )
    }

    /// Full format description
    pub fn format_name(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            if self.language.is_empty() { "unknown" } else { self.language.as_str() },
            self.channels,
            self.rate,
            self.sample_format.name()
        )
    }
}

impl std::fmt::Debug for AudioBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioBlob")
            .field("language", &self.language)
            .field("channels", &self.channels)
            .field("rate", &self.rate)
            .field("sample_format", &self.sample_format)
            .field("size", &self.size)
            .field("presentation_time", &self.presentation_time)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template() {
        let blob = AudioBlob::template(2, 48000, SampleFormat::F32);
        assert!(blob.is_empty());
        assert_eq!(blob.frame_bytes(), 8);
        assert_eq!(blob.bytes_per_second(), 384_000);
    }

    #[test]
    fn test_duration_calculation() {
        let blob = AudioBlob::template(2, 48000, SampleFormat::S16);
        // 4096 bytes = 1024 stereo samples at 48000 Hz = 21.333 ms
        assert_eq!(blob.duration_us(4096), 21333);
        assert_eq!(AudioBlob::default().duration_us(4096), 0);
    }

    #[test]
    fn test_format_strings() {
        let mut blob = AudioBlob::template(6, 44100, SampleFormat::S16);
        assert_eq!(blob.format_info(), "unknown, 6 ch., 44.1 kHz, 16 bit");
        blob.language = "eng".to_string();
        assert_eq!(blob.format_name(), "eng-6-44100-s16");
    }
}
