//! Decoder configuration

/// Configuration for decoder-backed media objects
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Number of codec threads per stream (0 = auto)
    pub thread_count: u32,

    /// Packets buffered per active stream before the oldest are dropped.
    /// Bounds memory when an active stream is not being read.
    pub max_queued_packets: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            thread_count: 0,
            max_queued_packets: 512,
        }
    }
}

impl DecoderConfig {
    /// Low memory preset
    pub fn low_memory() -> Self {
        Self {
            thread_count: 2,
            max_queued_packets: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DecoderConfig::default();
        assert_eq!(config.thread_count, 0);
        assert_eq!(config.max_queued_packets, 512);
    }

    #[test]
    fn test_presets() {
        let low = DecoderConfig::low_memory();
        assert!(low.max_queued_packets < DecoderConfig::default().max_queued_packets);
    }
}
