use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{plan::RevealMode, timeline::TimelineConfig, types::FieldRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// `0xRRGGBB`, the form ffmpeg's color source accepts.
    pub fn to_hex(self) -> String {
        format!("0x{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub background: Rgb,
    pub text_color: Rgb,
    pub font_size_question: f32,
    pub font_size_options: f32,
    pub font_size_answer: f32,
    pub font_size_explanation: f32,
    /// Gap between wrapped lines of one block, in pixels.
    pub line_spacing: u32,
    /// Extra gap after each option block, in pixels.
    pub option_spacing: u32,
    /// Left/right margin as a fraction of the width.
    pub margin_ratio: f32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
            background: Rgb(255, 240, 245),
            text_color: Rgb(0, 0, 0),
            font_size_question: 48.0,
            font_size_options: 40.0,
            font_size_answer: 44.0,
            font_size_explanation: 36.0,
            line_spacing: 10,
            option_spacing: 20,
            margin_ratio: 0.1,
        }
    }
}

impl VideoConfig {
    pub fn font_size(&self, role: FieldRole) -> f32 {
        match role {
            FieldRole::Question => self.font_size_question,
            FieldRole::Option(_) => self.font_size_options,
            FieldRole::Answer => self.font_size_answer,
            FieldRole::Explanation => self.font_size_explanation,
        }
    }

    /// Vertical anchor of a block as a fraction of the height.
    pub fn anchor(&self, role: FieldRole) -> f32 {
        match role {
            FieldRole::Question => 0.15,
            FieldRole::Option(_) => 0.35,
            FieldRole::Answer => 0.65,
            FieldRole::Explanation => 0.75,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    pub language: String,
    pub tld: String,
    pub codec: String,
    pub bitrate: String,
    pub sample_rate: u32,
    pub channels: u32,
    /// Per-request limit for speech synthesis; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            tld: "com".to_string(),
            codec: "aac".to_string(),
            bitrate: "192k".to_string(),
            sample_rate: 44100,
            channels: 2,
            timeout: None,
        }
    }
}

/// Everything the assembler needs besides its collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssemblyConfig {
    pub video: VideoConfig,
    pub audio: AudioConfig,
    pub timeline: TimelineConfig,
    pub mode: RevealMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_color_is_ffmpeg_style() {
        assert_eq!(Rgb(255, 240, 245).to_hex(), "0xFFF0F5");
        assert_eq!(Rgb(0, 1, 2).to_hex(), "0x000102");
    }

    #[test]
    fn anchors_keep_field_order_top_to_bottom() {
        let cfg = VideoConfig::default();
        let order = [
            FieldRole::Question,
            FieldRole::Option('A'),
            FieldRole::Answer,
            FieldRole::Explanation,
        ];
        for pair in order.windows(2) {
            assert!(cfg.anchor(pair[0]) < cfg.anchor(pair[1]));
        }
    }
}
