//! Laying the week's releases out onto the card.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    art::AssetLoadError,
    layout::{LayoutCursor, TextFlow},
    release::Release,
    surface::{ArtImage, FontSpec, Rgb8, Surface},
    util,
};

/// Fixed card dimensions and text presets, in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardGeometry {
    pub width: u32,
    pub height: u32,
    pub padding: f32,
    pub art_size: f32,
    /// Horizontal gap between the art and the text column.
    pub art_gap: f32,
    pub line_height: f32,
    /// Offset from one block's baseline to the next block's first baseline.
    pub block_gap: f32,
    /// Where the first release starts.
    pub first_release_y: f32,
    pub title_y: f32,
    pub date_y: f32,
    pub title_font: FontSpec,
    pub date_font: FontSpec,
    pub heading_font: FontSpec,
    pub summary_font: FontSpec,
    pub detail_font: FontSpec,
}
impl Default for CardGeometry {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 2500,
            padding: 30.0,
            art_size: 150.0,
            art_gap: 20.0,
            line_height: 45.0,
            block_gap: 35.0,
            first_release_y: 220.0,
            title_y: 90.0,
            date_y: 160.0,
            title_font: FontSpec::bold(60.0),
            date_font: FontSpec::regular(45.0),
            heading_font: FontSpec::bold(40.0),
            summary_font: FontSpec::regular(32.0),
            detail_font: FontSpec::regular(28.0),
        }
    }
}
impl CardGeometry {
    /// Width available to a text block.
    pub fn max_text_width(&self) -> f32 {
        self.width as f32 - (self.padding * 3.0 + self.art_size)
    }

    /// Left edge of the text column.
    pub fn text_x(&self) -> f32 {
        self.padding + self.art_size + self.art_gap
    }

    /// Fixed spacing after a release's last block.
    pub fn release_gap(&self) -> f32 {
        self.padding * 2.0
    }

    pub fn text_flow(&self) -> TextFlow {
        TextFlow::new(self.max_text_width(), self.line_height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardStyle {
    pub title: String,
    pub background: Rgb8,
    pub text_color: Rgb8,
}
impl Default for CardStyle {
    fn default() -> Self {
        Self {
            title: "New Music Friday".to_string(),
            background: Rgb8::new(0xfa, 0xfa, 0xfa),
            text_color: Rgb8::BLACK,
        }
    }
}

/// What happened to one release during a render pass.
#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseOutcome {
    Rendered {
        /// Cursor before the release was drawn.
        start: LayoutCursor,
        /// Cursor after the release, gap included.
        end: LayoutCursor,
    },
    /// Nothing was drawn and the cursor did not move.
    Skipped { reason: AssetLoadError },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardReport {
    /// One entry per input release, in input order.
    pub outcomes: Vec<ReleaseOutcome>,
    /// The cursor after the last release.
    pub cursor: LayoutCursor,
    /// Indices of rendered releases that reach past the bottom edge, wholly or
    /// in part.
    pub clipped: Vec<usize>,
}
impl CardReport {
    pub fn rendered_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ReleaseOutcome::Rendered { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.rendered_count()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardComposer {
    pub geometry: CardGeometry,
    pub style: CardStyle,
}
impl CardComposer {
    pub fn new(geometry: CardGeometry, style: CardStyle) -> Self {
        Self { geometry, style }
    }

    /// Paint the whole card. `art` is index-aligned with `releases`; a release
    /// whose art is missing or failed is skipped without drawing anything.
    ///
    /// Content that runs past the bottom edge is not reflowed: it is drawn off
    /// the canvas and reported in [`CardReport::clipped`].
    pub fn compose<S: Surface + ?Sized>(
        &self,
        releases: &[Release],
        art: &[Result<ArtImage, AssetLoadError>],
        surface: &mut S,
        today: NaiveDate,
    ) -> CardReport {
        self.draw_header(surface, today);

        let mut cursor = LayoutCursor(self.geometry.first_release_y);
        let mut outcomes = Vec::with_capacity(releases.len());
        let mut clipped = vec![];
        for (index, release) in releases.iter().enumerate() {
            let art = match art.get(index) {
                Some(Ok(art)) => art,
                Some(Err(reason)) => {
                    tracing::warn!("skipping {}: {reason}", release.heading());
                    outcomes.push(ReleaseOutcome::Skipped {
                        reason: reason.clone(),
                    });
                    continue;
                }
                None => {
                    tracing::warn!("skipping {}: no album art was fetched", release.heading());
                    outcomes.push(ReleaseOutcome::Skipped {
                        reason: AssetLoadError::NotFetched,
                    });
                    continue;
                }
            };

            let start = cursor;
            cursor = self.draw_release(surface, release, art, start);
            let bottom = self.content_bottom(start, cursor);
            if bottom > surface.height() as f32 {
                tracing::warn!(
                    "{} spans y={}..{} and is clipped by the {}px canvas",
                    release.heading(),
                    start.y(),
                    bottom,
                    surface.height()
                );
                clipped.push(index);
            }
            outcomes.push(ReleaseOutcome::Rendered { start, end: cursor });
        }

        CardReport {
            outcomes,
            cursor,
            clipped,
        }
    }

    /// Lowest drawn point of a release: the art's bottom edge or its last
    /// baseline, whichever is further down.
    fn content_bottom(&self, start: LayoutCursor, end: LayoutCursor) -> f32 {
        let g = &self.geometry;
        (start.y() + g.art_size).max(end.y() - g.release_gap())
    }

    fn draw_header<S: Surface + ?Sized>(&self, surface: &mut S, today: NaiveDate) {
        let g = &self.geometry;
        let (width, height) = (surface.width() as f32, surface.height() as f32);
        surface.fill_rect(0.0, 0.0, width, height, self.style.background);
        surface.fill_text(
            &self.style.title,
            g.padding,
            g.title_y,
            g.title_font,
            self.style.text_color,
        );
        surface.fill_text(
            &util::long_form_date(today),
            g.padding,
            g.date_y,
            g.date_font,
            self.style.text_color,
        );
    }

    /// Draw one release with its top edge at `cursor` and return the cursor
    /// for the next one.
    fn draw_release<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        release: &Release,
        art: &ArtImage,
        cursor: LayoutCursor,
    ) -> LayoutCursor {
        let g = &self.geometry;
        surface.draw_image(art, g.padding, cursor.y(), g.art_size, g.art_size);

        // Each block returns the baseline of its last line, not the next free one.
        let y = self.draw_block(
            surface,
            &release.heading(),
            g.heading_font,
            cursor.y() + g.block_gap,
        );
        let y = self.draw_block(surface, &release.summary(), g.summary_font, y + g.block_gap);
        let y = self.draw_block(
            surface,
            release.release_date_text(),
            g.detail_font,
            y + g.block_gap,
        );

        LayoutCursor(y).advance(g.release_gap())
    }

    fn draw_block<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        text: &str,
        font: FontSpec,
        y: f32,
    ) -> f32 {
        let output = self
            .geometry
            .text_flow()
            .flow(text, self.geometry.text_x(), y, |s| surface.measure_text(s, font));
        for line in &output.lines {
            surface.fill_text(&line.text, line.x, line.y, font, self.style.text_color);
        }
        output.last_y
    }
}

#[cfg(test)]
mod tests {
    use crate::surface::{DrawOp, RecordingSurface};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn art() -> Result<ArtImage, AssetLoadError> {
        Ok(ArtImage(image::RgbaImage::new(64, 64)))
    }

    fn release(artist: &str, name: &str) -> Release {
        Release::new(artist, name, date(2024, 10, 11))
            .with_release_type("album")
            .with_genres(["Pop", "Rock"])
    }

    fn surface() -> RecordingSurface {
        RecordingSurface::new(1080, 2500)
    }

    fn compose(
        releases: &[Release],
        art: &[Result<ArtImage, AssetLoadError>],
        surface: &mut RecordingSurface,
    ) -> CardReport {
        CardComposer::default().compose(releases, art, surface, date(2024, 10, 11))
    }

    #[test]
    fn test_geometry_defaults() {
        let g = CardGeometry::default();
        assert_eq!(g.max_text_width(), 840.0);
        assert_eq!(g.text_x(), 200.0);
        assert_eq!(g.release_gap(), 60.0);
    }

    #[test]
    fn test_header() {
        let mut surface = surface();
        let report = compose(&[], &[], &mut surface);
        assert!(report.outcomes.is_empty());
        assert_eq!(report.cursor, LayoutCursor(220.0));
        assert_eq!(
            surface.ops()[0],
            DrawOp::FillRect {
                x: 0.0,
                y: 0.0,
                w: 1080.0,
                h: 2500.0,
                color: Rgb8::new(0xfa, 0xfa, 0xfa)
            }
        );
        assert_eq!(
            surface.texts().collect::<Vec<_>>(),
            ["New Music Friday", "Friday, October 11, 2024"]
        );
    }

    #[test]
    fn test_single_release_geometry() {
        let mut surface = surface();
        let releases = [release("Charli xcx", "BRAT")];
        let report = compose(&releases, &[art()], &mut surface);

        // Art at the cursor, then three one-line blocks 35px apart, then the 60px gap.
        assert_eq!(
            surface.ops()[3],
            DrawOp::DrawImage {
                x: 30.0,
                y: 220.0,
                w: 150.0,
                h: 150.0,
                source_width: 64,
                source_height: 64
            }
        );
        let lines: Vec<_> = surface
            .ops()
            .iter()
            .skip(4)
            .map(|op| match op {
                DrawOp::FillText { text, x, y, .. } => (text.as_str(), *x, *y),
                other => panic!("unexpected op {other:?}"),
            })
            .collect();
        assert_eq!(
            lines,
            [
                ("Charli xcx - BRAT", 200.0, 255.0),
                ("album (Pop, Rock)", 200.0, 290.0),
                ("11/10/2024", 200.0, 325.0),
            ]
        );
        assert_eq!(
            report.outcomes,
            [ReleaseOutcome::Rendered {
                start: LayoutCursor(220.0),
                end: LayoutCursor(385.0)
            }]
        );
        assert_eq!(report.cursor, LayoutCursor(385.0));
    }

    #[test]
    fn test_wrapped_heading_pushes_later_blocks_down() {
        let mut surface = surface();
        // 20px per char at the 40px heading preset: 840px fits 42 chars.
        let long_name = "word ".repeat(12);
        let releases = [release("Artist", long_name.trim())];
        let report = compose(&releases, &[art()], &mut surface);

        let ys: Vec<f32> = surface
            .ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillText { y, .. } => Some(*y),
                _ => None,
            })
            .skip(2)
            .collect();
        assert_eq!(ys, [255.0, 300.0, 335.0, 370.0]);
        assert_eq!(report.cursor, LayoutCursor(430.0));
    }

    #[test]
    fn test_failed_art_skips_release_entirely() {
        let mut surface = surface();
        let releases = [release("A", "first"), release("B", "broken"), release("C", "third")];
        let art = [
            art(),
            Err(AssetLoadError::Status {
                url: "https://example.com/b.jpg".to_string(),
                status: 404,
            }),
            art(),
        ];
        let report = compose(&releases, &art, &mut surface);

        assert!(surface.texts().all(|t| !t.contains("broken")));
        assert_eq!(
            surface
                .ops()
                .iter()
                .filter(|op| matches!(op, DrawOp::DrawImage { .. }))
                .count(),
            2
        );

        let [
            ReleaseOutcome::Rendered { end: after_first, .. },
            ReleaseOutcome::Skipped { .. },
            ReleaseOutcome::Rendered { start: third_start, .. },
        ] = &report.outcomes[..]
        else {
            panic!("unexpected outcomes {:?}", report.outcomes);
        };
        assert_eq!(after_first, third_start);
        assert_eq!(report.rendered_count(), 2);
        assert_eq!(report.skipped_count(), 1);
    }

    #[test]
    fn test_missing_art_entry_is_skipped() {
        let mut surface = surface();
        let releases = [release("A", "first"), release("B", "second")];
        let report = compose(&releases, &[art()], &mut surface);
        assert_eq!(
            report.outcomes[1],
            ReleaseOutcome::Skipped {
                reason: AssetLoadError::NotFetched
            }
        );
    }

    #[test]
    fn test_cursor_strictly_increases_per_release() {
        let mut surface = surface();
        let releases = [release("A", "one"), release("B", "two"), release("C", "three")];
        let report = compose(&releases, &[art(), art(), art()], &mut surface);

        let mut previous = LayoutCursor(220.0);
        for outcome in &report.outcomes {
            let ReleaseOutcome::Rendered { start, end } = outcome else {
                panic!("expected every release to render");
            };
            assert_eq!(*start, previous);
            assert!(end > start);
            previous = *end;
        }
    }

    #[test]
    fn test_overflow_is_clipped_not_reflowed() {
        let mut surface = RecordingSurface::new(1080, 600);
        let releases: Vec<_> = (0..4).map(|i| release("A", &format!("r{i}"))).collect();
        let art: Vec<_> = releases.iter().map(|_| art()).collect();
        let report = compose(&releases, &art, &mut surface);

        // Releases start at 220, 385, 550, 715 and their art is 150px tall.
        assert_eq!(report.clipped, [2, 3]);
        assert_eq!(report.rendered_count(), 4);
        assert!(surface.texts().any(|t| t == "A - r3"));
        assert_eq!(report.cursor, LayoutCursor(880.0));
    }

    #[test]
    fn test_partly_visible_release_is_clipped() {
        let releases: Vec<_> = (0..4).map(|i| release("A", &format!("r{i}"))).collect();
        let art: Vec<_> = releases.iter().map(|_| art()).collect();

        // r2 ends exactly on the bottom edge.
        let report = compose(&releases, &art, &mut RecordingSurface::new(1080, 700));
        assert_eq!(report.clipped, [3]);

        // r3 starts 15px above the bottom edge.
        let report = compose(&releases, &art, &mut RecordingSurface::new(1080, 730));
        assert_eq!(report.clipped, [3]);
        let report = compose(&releases, &art, &mut RecordingSurface::new(1080, 870));
        assert!(report.clipped.is_empty());
    }

    #[test]
    fn test_composition_is_deterministic() {
        let releases = [release("A", "one"), release("B", "two")];
        let art = [art(), art()];
        let render = || {
            let mut surface = surface();
            let report = compose(&releases, &art, &mut surface);
            (surface, report)
        };
        assert_eq!(render(), render());
    }
}
