//! Font loading and single-line shaping.

use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use newmusic_core::{FontSpec, FontWeight};

use crate::RasterError;

/// The regular and bold faces used on the card, as raw font file bytes.
#[derive(Debug, Clone)]
pub struct FontSet {
    pub regular: Vec<u8>,
    pub bold: Vec<u8>,
}
impl FontSet {
    pub fn load(regular: &Path, bold: &Path) -> Result<Self, RasterError> {
        let read = |path: &Path| {
            std::fs::read(path).map_err(|source| RasterError::FontRead {
                path: path.to_path_buf(),
                source,
            })
        };
        Ok(Self {
            regular: read(regular)?,
            bold: read(bold)?,
        })
    }

    /// Common DejaVu Sans install locations, regular then bold.
    pub fn default_paths() -> (PathBuf, PathBuf) {
        let dir = Path::new("/usr/share/fonts/truetype/dejavu");
        (dir.join("DejaVuSans.ttf"), dir.join("DejaVuSans-Bold.ttf"))
    }
}

struct LoadedFace {
    family: String,
    data: vello_cpu::peniko::FontData,
}

/// A glyph ready to paint, relative to the requested baseline origin.
pub(crate) struct ShapedLine {
    pub glyphs: Vec<vello_cpu::Glyph>,
    pub font_size: f32,
    pub width: f32,
}

pub(crate) struct TextShaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    regular: LoadedFace,
    bold: LoadedFace,
}
impl TextShaper {
    pub fn new(fonts: &FontSet) -> Result<Self, RasterError> {
        let mut font_ctx = parley::FontContext::default();
        let regular = register(&mut font_ctx, &fonts.regular, "regular")?;
        let bold = register(&mut font_ctx, &fonts.bold, "bold")?;
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            regular,
            bold,
        })
    }

    pub fn face(&self, weight: FontWeight) -> &vello_cpu::peniko::FontData {
        match weight {
            FontWeight::Regular => &self.regular.data,
            FontWeight::Bold => &self.bold.data,
        }
    }

    /// Shape `text` on one unbroken line. Glyph `y` is relative to the
    /// baseline, so callers translate by the baseline they want.
    pub fn shape(&mut self, text: &str, font: FontSpec) -> ShapedLine {
        let text = single_line(text);
        let text = text.as_ref();
        let (face, weight) = match font.weight {
            FontWeight::Regular => (&self.regular, parley::style::FontWeight::NORMAL),
            FontWeight::Bold => (&self.bold, parley::style::FontWeight::BOLD),
        };

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(face.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(font.size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(weight));

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);

        let mut glyphs = vec![];
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let baseline = run.baseline();
                glyphs.extend(run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y - baseline,
                }));
            }
        }

        ShapedLine {
            glyphs,
            font_size: font.size_px,
            width: layout.width(),
        }
    }
}

/// Replace line breaks, tabs and other control characters with spaces so
/// the shaper never starts a second line.
fn single_line(text: &str) -> Cow<'_, str> {
    let is_break = |c: char| c.is_control() || (c.is_whitespace() && c != ' ');
    if text.contains(is_break) {
        Cow::Owned(text.replace(is_break, " "))
    } else {
        Cow::Borrowed(text)
    }
}

fn register(
    font_ctx: &mut parley::FontContext,
    bytes: &[u8],
    label: &'static str,
) -> Result<LoadedFace, RasterError> {
    let families = font_ctx
        .collection
        .register_fonts(parley::fontique::Blob::from(bytes.to_vec()), None);
    let family_id = families
        .first()
        .map(|(id, _)| *id)
        .ok_or(RasterError::NoFontFamily(label))?;
    let family = font_ctx
        .collection
        .family_name(family_id)
        .ok_or(RasterError::NoFontFamily(label))?
        .to_string();
    tracing::debug!("registered {label} font family {family:?}");

    Ok(LoadedFace {
        family,
        data: vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes.to_vec()), 0),
    })
}
