//! Input configuration

/// Tag carrying the lead-in to skip, in microseconds
pub const DEFAULT_SKIP_TAG: &str = "StereoscopicSkip";

/// Configuration for [`super::MediaInput`]
#[derive(Debug, Clone)]
pub struct InputConfig {
    /// Merged-tag name holding the initial skip offset
    pub skip_tag: String,

    /// Emit the input summary through the logger on open
    pub log_summary: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            skip_tag: DEFAULT_SKIP_TAG.to_string(),
            log_summary: true,
        }
    }
}

impl InputConfig {
    /// Quiet preset, no summary on open
    pub fn quiet() -> Self {
        Self {
            log_summary: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InputConfig::default();
        assert_eq!(config.skip_tag, "StereoscopicSkip");
        assert!(config.log_summary);
        assert!(!InputConfig::quiet().log_summary);
    }
}
