use thiserror::Error;
use tracing::{debug, warn};
use tripchart_protocol::DoseEvent;

use crate::config::DosePolicy;
use crate::model::Timeline;

/// Cell value meaning "nothing taken on this row", both for the whole cell
/// and for the amount segment.
const NO_DOSE: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DoseParseError {
    #[error("row {row}: malformed dose {value:?}, expected substance:amount")]
    MalformedDose { row: usize, value: String },
}

/// A decoded dose cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoseCell<'a> {
    /// `"0"` or blank.
    None,
    /// `substance:0`, an encoding artifact rather than a dose.
    ZeroAmount,
    Dose { substance: &'a str, amount: &'a str },
}

/// Decode one dose cell.
///
/// The encoding is `"0"` for no dose, otherwise `substance:amount` with
/// exactly one `:`. Any other shape is malformed.
pub fn decode_dose_cell(row: usize, raw: &str) -> Result<DoseCell<'_>, DoseParseError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == NO_DOSE {
        return Ok(DoseCell::None);
    }

    let malformed = || DoseParseError::MalformedDose {
        row,
        value: raw.to_string(),
    };
    let mut segments = raw.split(':').map(str::trim);
    let (Some(substance), Some(amount), None) = (segments.next(), segments.next(), segments.next())
    else {
        return Err(malformed());
    };
    if substance.is_empty() || amount.is_empty() {
        return Err(malformed());
    }

    if amount == NO_DOSE {
        Ok(DoseCell::ZeroAmount)
    } else {
        Ok(DoseCell::Dose { substance, amount })
    }
}

/// Dose events of a timeline plus the rows that were dropped on the way.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DoseExtraction {
    pub events: Vec<DoseEvent>,
    /// Malformed rows skipped under [`DosePolicy::Skip`].
    pub skipped: Vec<DoseParseError>,
}

/// Scan the dose column and collect one [`DoseEvent`] per real dose, in
/// timeline order, stamped with its row's time.
///
/// With [`DosePolicy::Skip`] a malformed cell is logged and left out; with
/// [`DosePolicy::Abort`] the first one is returned as the error.
pub fn extract_dose_events(
    timeline: &Timeline,
    policy: DosePolicy,
) -> Result<DoseExtraction, DoseParseError> {
    let mut extraction = DoseExtraction::default();

    for (row, record) in timeline.records().iter().enumerate() {
        match decode_dose_cell(row, &record.dose) {
            Ok(DoseCell::Dose { substance, amount }) => extraction.events.push(DoseEvent {
                time: record.time,
                day: record.day,
                substance: substance.to_string(),
                amount: amount.to_string(),
            }),
            Ok(DoseCell::ZeroAmount) => debug!(row, cell = %record.dose, "ignoring zero-amount dose"),
            Ok(DoseCell::None) => {}
            Err(err) => match policy {
                DosePolicy::Abort => return Err(err),
                DosePolicy::Skip => {
                    warn!(%err, "skipping malformed dose row");
                    extraction.skipped.push(err);
                }
            },
        }
    }

    Ok(extraction)
}
