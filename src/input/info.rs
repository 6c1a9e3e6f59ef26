//! Input summary types

/// One entry of the summary's stream list
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSummary {
    /// Name from the input's stream-name table
    pub name: String,

    /// Full format description
    pub format: String,
}

/// Human-readable overview of an opened input
#[derive(Debug, Clone, PartialEq)]
pub struct InputSummary {
    /// Input identity
    pub id: String,

    /// Duration in microseconds
    pub duration: i64,

    /// Active stereo layout name, if video exists
    pub stereo_layout: Option<String>,

    pub video: Vec<StreamSummary>,

    pub audio: Vec<StreamSummary>,
}

impl InputSummary {
    /// Check if the input has video
    pub fn has_video(&self) -> bool {
        !self.video.is_empty()
    }

    /// Check if the input has audio
    pub fn has_audio(&self) -> bool {
        !self.audio.is_empty()
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.duration as f64 / 1_000_000.0
    }

    /// Summary as log lines
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Input {}:", self.id),
            format!("    Duration: {} seconds", self.duration_seconds()),
        ];
        if let Some(ref layout) = self.stereo_layout {
            lines.push(format!("    Stereo layout: {}", layout));
        }
        for stream in &self.video {
            lines.push(format!("    Video {}: {}", stream.name, stream.format));
        }
        if !self.has_video() {
            lines.push("    No video.".to_string());
        }
        for stream in &self.audio {
            lines.push(format!("    Audio {}: {}", stream.name, stream.format));
        }
        if !self.has_audio() {
            lines.push("    No audio.".to_string());
        }
        lines
    }

    /// Emit the summary at info level
    pub fn log(&self) {
        for line in self.lines() {
            log::info!("{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_lines() {
        let summary = InputSummary {
            id: "movie.mkv".to_string(),
            duration: 7_500_000,
            stereo_layout: Some("left-right".to_string()),
            video: vec![StreamSummary {
                name: "3840x1080, 3.556:1".to_string(),
                format: "3840x1080-3.556:1-yuv420p-709-mpeg-left-left-right".to_string(),
            }],
            audio: Vec::new(),
        };

        assert!(summary.has_video());
        assert!(!summary.has_audio());
        assert_eq!(
            summary.lines(),
            vec![
                "Input movie.mkv:",
                "    Duration: 7.5 seconds",
                "    Stereo layout: left-right",
                "    Video 3840x1080, 3.556:1: 3840x1080-3.556:1-yuv420p-709-mpeg-left-left-right",
                "    No audio.",
            ]
        );
    }
}
