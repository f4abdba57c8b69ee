//! Trip-report loading, dose extraction and chart composition.
//!
//! The pipeline is `parsers` (CSV into a validated [`model::Timeline`]),
//! `views` (timeline plus selection into a [`tripchart_protocol::ChartSet`],
//! then into render commands) and `svg` for static export.

pub mod config;
pub mod model;
pub mod parsers;
pub mod report;
pub mod selection;
pub mod svg;
pub mod views;

pub use config::{DosePolicy, ReportConfig};
pub use model::{Metadata, Session, Timeline};
pub use parsers::ParseError;
pub use selection::{SelectionController, SelectionState};
pub use views::CompositionError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Composition(#[from] CompositionError),
}
