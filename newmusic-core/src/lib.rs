//! The release-selection-and-rendering pipeline behind the weekly "new releases" card.
//!
//! Raw record-store rows are parsed into [`Release`]s, narrowed to the trailing
//! seven-day [`DateWindow`], and laid out onto a [`Surface`] by the [`CardComposer`].

pub mod art;
pub mod compose;
pub mod layout;
pub mod pipeline;
pub mod release;
pub mod store;
pub mod surface;
pub mod util;
pub mod validate;
pub mod window;

pub use art::{ArtFetcher, AssetLoadError, HttpArtFetcher, prefetch_art};
pub use compose::{CardComposer, CardGeometry, CardReport, CardStyle, ReleaseOutcome};
pub use layout::{LayoutCursor, PlacedLine, TextFlow, TextFlowOutput};
pub use pipeline::{PipelineError, RenderSettings, RunOutcome, render_card};
pub use release::{
    DateOrder, GenreEncoding, ParseError, ParsedRow, RawRow, Release, RowOutcome, parse_row,
};
pub use store::{CatalogReadError, ParsedCatalog, read_catalog};
pub use surface::{
    ArtImage, DrawOp, FontSpec, FontWeight, RecordingSurface, Rgb8, Surface, SurfaceError,
};
pub use validate::{RowIssue, ValidationReport, validate_header, validate_row, validate_store};
pub use window::{DateWindow, select};
