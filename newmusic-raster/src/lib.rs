//! A pixel [`Surface`] for the release card, drawn on the CPU and encoded as JPEG.

use std::{path::PathBuf, sync::Arc};

use image::{
    RgbImage, RgbaImage,
    codecs::jpeg::JpegEncoder,
    imageops::{self, FilterType},
};
use newmusic_core::{ArtImage, FontSpec, Rgb8, Surface, SurfaceError};
use vello_cpu::kurbo::{Affine, Rect};

mod text;

pub use text::FontSet;
use text::TextShaper;

/// Quality used when encoding the finished card.
pub const JPEG_QUALITY: u8 = 90;

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("failed to read font {}: {source}", path.display())]
    FontRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("the {0} font file contains no usable font family")]
    NoFontFamily(&'static str),
    #[error("canvas {width}x{height} is too large")]
    CanvasTooLarge { width: u32, height: u32 },
}

pub struct RasterSurface {
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
    text: TextShaper,
}
impl RasterSurface {
    pub fn new(width: u32, height: u32, fonts: &FontSet) -> Result<Self, RasterError> {
        let too_large = || RasterError::CanvasTooLarge { width, height };
        let w: u16 = width.try_into().map_err(|_| too_large())?;
        let h: u16 = height.try_into().map_err(|_| too_large())?;
        Ok(Self {
            width: w,
            height: h,
            ctx: vello_cpu::RenderContext::new(w, h),
            text: TextShaper::new(fonts)?,
        })
    }

    fn set_color(&mut self, color: Rgb8) {
        self.ctx
            .set_paint(vello_cpu::peniko::Color::from_rgba8(color.r, color.g, color.b, 255));
    }
}
impl Surface for RasterSurface {
    fn width(&self) -> u32 {
        self.width.into()
    }

    fn height(&self) -> u32 {
        self.height.into()
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb8) {
        self.ctx.set_transform(Affine::IDENTITY);
        self.set_color(color);
        self.ctx.fill_rect(&Rect::new(
            x.into(),
            y.into(),
            (x + w).into(),
            (y + h).into(),
        ));
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, font: FontSpec, color: Rgb8) {
        if text.is_empty() {
            return;
        }
        let line = self.text.shape(text, font);
        self.ctx.set_transform(Affine::translate((f64::from(x), f64::from(y))));
        self.set_color(color);
        self.ctx
            .glyph_run(self.text.face(font.weight))
            .font_size(line.font_size)
            .fill_glyphs(line.glyphs.into_iter());
    }

    fn measure_text(&mut self, text: &str, font: FontSpec) -> f32 {
        self.text.shape(text, font).width
    }

    fn draw_image(&mut self, image: &ArtImage, x: f32, y: f32, w: f32, h: f32) {
        let (tw, th) = (w.round().max(1.0) as u32, h.round().max(1.0) as u32);
        let resized = imageops::resize(image.as_rgba(), tw, th, FilterType::Triangle);
        let Some(pixmap) = pixmap_from_rgba(&resized) else {
            tracing::warn!("album art of {tw}x{th} cannot be drawn");
            return;
        };

        self.ctx.set_transform(Affine::translate((f64::from(x), f64::from(y))));
        self.ctx.set_paint_transform(Affine::IDENTITY);
        self.ctx.set_paint(vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        });
        self.ctx.fill_rect(&Rect::new(0.0, 0.0, tw.into(), th.into()));
    }

    fn file_extension(&self) -> &'static str {
        "jpg"
    }

    fn encode(&mut self) -> Result<Vec<u8>, SurfaceError> {
        self.ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.render_to_pixmap(&mut pixmap);

        // The background is opaque, so premultiplied and straight colour agree.
        let rgb: Vec<u8> = pixmap
            .data_as_u8_slice()
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();
        let image = RgbImage::from_raw(self.width.into(), self.height.into(), rgb).ok_or_else(|| {
            SurfaceError::Backend("rendered pixmap has the wrong size".to_string())
        })?;

        let mut buffer = vec![];
        let encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
        image.write_with_encoder(encoder)?;
        Ok(buffer)
    }
}

/// Convert straight RGBA into a premultiplied pixmap.
fn pixmap_from_rgba(image: &RgbaImage) -> Option<vello_cpu::Pixmap> {
    let w: u16 = image.width().try_into().ok()?;
    let h: u16 = image.height().try_into().ok()?;
    let pixels = image
        .pixels()
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array(premultiply(px.0)))
        .collect();
    Some(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        image.pixels().all(|px| px.0[3] == 255),
    ))
}

fn premultiply([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    let scale = |c: u8| ((u16::from(c) * u16::from(a) + 127) / 255) as u8;
    [scale(r), scale(g), scale(b), a]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system_fonts() -> Option<FontSet> {
        let (regular, bold) = FontSet::default_paths();
        FontSet::load(&regular, &bold).ok()
    }

    #[test]
    fn test_premultiply() {
        assert_eq!(premultiply([200, 100, 50, 255]), [200, 100, 50, 255]);
        assert_eq!(premultiply([200, 100, 50, 0]), [0, 0, 0, 0]);
        assert_eq!(premultiply([255, 128, 0, 128]), [128, 64, 0, 128]);
    }

    #[test]
    fn test_pixmap_from_rgba() {
        let image = RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        let pixmap = pixmap_from_rgba(&image).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (3, 2));
        assert_eq!(&pixmap.data_as_u8_slice()[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_missing_font_file() {
        let result = FontSet::load(
            std::path::Path::new("/nonexistent/regular.ttf"),
            std::path::Path::new("/nonexistent/bold.ttf"),
        );
        assert!(matches!(result, Err(RasterError::FontRead { .. })));
    }

    #[test]
    fn test_garbage_font_is_rejected() {
        let fonts = FontSet {
            regular: b"not a font".to_vec(),
            bold: b"not a font".to_vec(),
        };
        assert!(matches!(
            RasterSurface::new(10, 10, &fonts),
            Err(RasterError::NoFontFamily("regular"))
        ));
    }

    #[test]
    fn test_renders_jpeg() {
        let Some(fonts) = system_fonts() else {
            return;
        };
        let mut surface = RasterSurface::new(200, 100, &fonts).unwrap();
        assert!(RasterSurface::new(70_000, 10, &fonts).is_err());

        let narrow = surface.measure_text("ab", FontSpec::regular(20.0));
        let wide = surface.measure_text("ab ab ab", FontSpec::regular(20.0));
        assert!(narrow > 0.0 && wide > narrow);
        assert!(
            surface.measure_text("ab ab ab", FontSpec::bold(20.0)) >= wide,
            "bold text should not be narrower"
        );

        surface.fill_rect(0.0, 0.0, 200.0, 100.0, Rgb8::new(0xfa, 0xfa, 0xfa));
        surface.fill_text("Hello", 10.0, 40.0, FontSpec::bold(30.0), Rgb8::BLACK);
        let art = ArtImage(RgbaImage::from_pixel(8, 8, image::Rgba([255, 0, 0, 255])));
        surface.draw_image(&art, 150.0, 50.0, 40.0, 40.0);

        let bytes = surface.encode().unwrap();
        assert_eq!(&bytes[..2], &[0xff, 0xd8]);
        let decoded = image::load_from_memory(&bytes).unwrap().into_rgb8();
        assert_eq!(decoded.dimensions(), (200, 100));
        let art_pixel = decoded.get_pixel(170, 70);
        assert!(art_pixel[0] > 200 && art_pixel[1] < 60, "{art_pixel:?}");
        let background = decoded.get_pixel(100, 95);
        assert!(background.0.iter().all(|&c| c > 230), "{background:?}");
    }
}
