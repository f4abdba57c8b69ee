pub mod dose;
pub mod table;
pub mod timeline;

use thiserror::Error;

/// A table already split into fields: a header row plus data rows.
///
/// This is the hand-off point from whatever loaded the file (see
/// [`table::read_table`]) to the parsers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Position of `name` among the headers (whitespace-insensitive).
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("timeline: {0}")]
    Timeline(#[from] timeline::TimelineParseError),
    #[error("dose: {0}")]
    Dose(#[from] dose::DoseParseError),
    #[error("table: {0}")]
    Table(#[from] table::TableLoadError),
}
