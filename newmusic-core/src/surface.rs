//! The drawing capability the card composer needs from a rendering backend.

use serde::{Deserialize, Serialize};

/// An opaque sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}
impl Rgb8 {
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}
impl std::fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}
impl TryFrom<String> for Rgb8 {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value).ok_or_else(|| format!("invalid colour {value:?}, expected #rrggbb"))
    }
}
impl From<Rgb8> for String {
    fn from(value: Rgb8) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub size_px: f32,
    pub weight: FontWeight,
}
impl FontSpec {
    pub const fn regular(size_px: f32) -> Self {
        Self {
            size_px,
            weight: FontWeight::Regular,
        }
    }

    pub const fn bold(size_px: f32) -> Self {
        Self {
            size_px,
            weight: FontWeight::Bold,
        }
    }
}

/// Decoded album art, straight (non-premultiplied) RGBA8.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtImage(pub image::RgbaImage);
impl ArtImage {
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn as_rgba(&self) -> &image::RgbaImage {
        &self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to encode display list: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Backend(String),
}

/// A fixed-size canvas. Coordinates are pixels from the top-left; text is
/// positioned by its alphabetic baseline. Anything drawn outside the canvas
/// is clipped.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb8);
    fn fill_text(&mut self, text: &str, x: f32, y: f32, font: FontSpec, color: Rgb8);
    fn measure_text(&mut self, text: &str, font: FontSpec) -> f32;
    fn draw_image(&mut self, image: &ArtImage, x: f32, y: f32, w: f32, h: f32);

    /// Extension of the files produced by [`Surface::encode`], without the dot.
    fn file_extension(&self) -> &'static str;
    /// Encode the current contents for writing to disk.
    fn encode(&mut self) -> Result<Vec<u8>, SurfaceError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    FillRect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgb8,
    },
    FillText {
        text: String,
        x: f32,
        y: f32,
        font: FontSpec,
        color: Rgb8,
    },
    DrawImage {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        source_width: u32,
        source_height: u32,
    },
}

/// A surface that records draw calls instead of painting pixels. Text is
/// measured as a fixed advance per character, which makes layouts exactly
/// reproducible. Encodes to a JSON display list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    #[serde(skip)]
    advance_per_em: f32,
    ops: Vec<DrawOp>,
}
impl RecordingSurface {
    pub const DEFAULT_ADVANCE_PER_EM: f32 = 0.5;

    pub fn new(width: u32, height: u32) -> Self {
        Self::with_advance(width, height, Self::DEFAULT_ADVANCE_PER_EM)
    }

    /// `advance_per_em` is the width of one character as a fraction of the font size.
    pub fn with_advance(width: u32, height: u32, advance_per_em: f32) -> Self {
        Self {
            width,
            height,
            advance_per_em,
            ops: vec![],
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Every string passed to `fill_text`, in draw order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::FillText { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}
impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb8) {
        self.ops.push(DrawOp::FillRect { x, y, w, h, color });
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, font: FontSpec, color: Rgb8) {
        self.ops.push(DrawOp::FillText {
            text: text.to_string(),
            x,
            y,
            font,
            color,
        });
    }

    fn measure_text(&mut self, text: &str, font: FontSpec) -> f32 {
        text.chars().count() as f32 * font.size_px * self.advance_per_em
    }

    fn draw_image(&mut self, image: &ArtImage, x: f32, y: f32, w: f32, h: f32) {
        self.ops.push(DrawOp::DrawImage {
            x,
            y,
            w,
            h,
            source_width: image.width(),
            source_height: image.height(),
        });
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }

    fn encode(&mut self) -> Result<Vec<u8>, SurfaceError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}
