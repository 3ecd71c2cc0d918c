use std::path::Path;

use image::{Rgb as Pixel, RgbImage};
use rusttype::{Font, Scale, point};

use crate::{
    config::{Rgb, VideoConfig},
    error::{QuizreelError, Result},
    font::LoadedFont,
    types::{FieldRole, RevealStage},
};

/// Rasterizes one reveal stage into an image file.
pub trait FrameRenderer: Send + Sync {
    fn render(&self, stage: &RevealStage, out_path: &Path) -> Result<()>;
}

/// Advance width of `text` laid out on a single line.
pub fn measure_width(font: &Font<'_>, scale: Scale, text: &str) -> f32 {
    font.layout(text, scale, point(0.0, 0.0))
        .last()
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
}

/// Greedy word wrap by measured width. Explicit newlines start a new line;
/// a word wider than `max_width` gets a line of its own.
pub fn wrap_text(font: &Font<'_>, size: f32, text: &str, max_width: f32) -> Vec<String> {
    let scale = Scale::uniform(size);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };

            if current.is_empty() || measure_width(font, scale, &candidate) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

fn role_group(role: FieldRole) -> u8 {
    match role {
        FieldRole::Question => 0,
        FieldRole::Option(_) => 1,
        FieldRole::Answer => 2,
        FieldRole::Explanation => 3,
    }
}

pub struct TextFrameRenderer {
    video: VideoConfig,
    font: LoadedFont,
}

impl TextFrameRenderer {
    pub fn new(video: VideoConfig, font: LoadedFont) -> Self {
        Self { video, font }
    }

    pub fn font(&self) -> &LoadedFont {
        &self.font
    }

    /// Draws the full cumulative content of `stage` on a fresh canvas.
    pub fn render_image(&self, stage: &RevealStage) -> RgbImage {
        let cfg = &self.video;
        let Rgb(r, g, b) = cfg.background;
        let mut img = RgbImage::from_pixel(cfg.width, cfg.height, Pixel([r, g, b]));

        let margin = (cfg.width as f32 * cfg.margin_ratio).round();
        let max_width = (cfg.width as f32 - 2.0 * margin).max(1.0);

        let mut cursor = 0.0f32;
        let mut last_group: Option<u8> = None;

        for block in &stage.blocks {
            let group = role_group(block.role);
            if last_group != Some(group) {
                cursor = cursor.max(cfg.height as f32 * cfg.anchor(block.role));
            }
            last_group = Some(group);

            let size = cfg.font_size(block.role);
            let scale = Scale::uniform(size);
            let v = self.font.font.v_metrics(scale);
            let line_height = (v.ascent - v.descent).ceil() + cfg.line_spacing as f32;

            for line in wrap_text(&self.font.font, size, &block.text, max_width) {
                let width = measure_width(&self.font.font, scale, &line);
                let x = ((cfg.width as f32 - width) / 2.0).floor();
                self.draw_line(&mut img, &line, scale, x, cursor + v.ascent);
                cursor += line_height;
            }

            if matches!(block.role, FieldRole::Option(_)) {
                cursor += cfg.option_spacing as f32;
            }
        }

        img
    }

    fn draw_line(&self, img: &mut RgbImage, line: &str, scale: Scale, x: f32, baseline: f32) {
        let Rgb(tr, tg, tb) = self.video.text_color;
        let (w, h) = (img.width() as i32, img.height() as i32);

        for glyph in self.font.font.layout(line, scale, point(x, baseline)) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                let px = bb.min.x + gx as i32;
                let py = bb.min.y + gy as i32;
                if px < 0 || py < 0 || px >= w || py >= h {
                    return;
                }
                let pixel = img.get_pixel_mut(px as u32, py as u32);
                let c = coverage.clamp(0.0, 1.0);
                let mix = |bg: u8, fg: u8| (bg as f32 * (1.0 - c) + fg as f32 * c).round() as u8;
                *pixel = Pixel([mix(pixel[0], tr), mix(pixel[1], tg), mix(pixel[2], tb)]);
            });
        }
    }
}

impl FrameRenderer for TextFrameRenderer {
    fn render(&self, stage: &RevealStage, out_path: &Path) -> Result<()> {
        self.render_image(stage)
            .save(out_path)
            .map_err(|e| QuizreelError::RenderFailed {
                output: out_path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}
