use std::sync::Arc;

use tracing::info;
use tripchart_protocol::DoseMarkers;

use super::Timeline;
use crate::config::DosePolicy;
use crate::parsers::dose::{DoseParseError, extract_dose_events};
use crate::parsers::timeline::parse_timeline;
use crate::parsers::{ParseError, RawTable};

/// The loaded, read-only data of one report: the parsed timeline and the
/// dose events derived from it.
///
/// Both halves are behind reference counts so selection controllers and
/// chart sets can share them without copying.
#[derive(Debug, Clone)]
pub struct Session {
    timeline: Arc<Timeline>,
    doses: DoseMarkers,
    skipped_doses: Vec<DoseParseError>,
}

impl Session {
    /// Parse the timeline table and extract its dose events.
    ///
    /// Timeline errors always fail the load. Malformed dose cells fail it
    /// only under [`DosePolicy::Abort`].
    pub fn load(table: &RawTable, policy: DosePolicy) -> Result<Self, ParseError> {
        let timeline = parse_timeline(table)?;
        let extraction = extract_dose_events(&timeline, policy)?;

        info!(
            records = timeline.len(),
            metrics = timeline.metric_names().len(),
            doses = extraction.events.len(),
            skipped_doses = extraction.skipped.len(),
            "timeline loaded"
        );

        Ok(Self {
            timeline: Arc::new(timeline),
            doses: DoseMarkers::new(extraction.events),
            skipped_doses: extraction.skipped,
        })
    }

    pub fn timeline(&self) -> &Arc<Timeline> {
        &self.timeline
    }

    pub fn doses(&self) -> &DoseMarkers {
        &self.doses
    }

    /// Dose rows dropped while loading.
    pub fn skipped_doses(&self) -> &[DoseParseError] {
        &self.skipped_doses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[[&str; 4]]) -> RawTable {
        RawTable::new(
            ["time", "dose", "comment", "anxiety"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            rows.iter()
                .map(|r| r.iter().map(|f| f.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn load_extracts_doses_once() {
        let session = Session::load(
            &table(&[
                ["10:00", "0", "ok", "2"],
                ["10:15", "MDMA:100", "fine", "4"],
                ["10:30", "0", "great", "1"],
            ]),
            DosePolicy::Skip,
        )
        .unwrap();
        assert_eq!(session.timeline().len(), 3);
        assert_eq!(session.doses().len(), 1);
        assert!(session.skipped_doses().is_empty());
    }

    #[test]
    fn malformed_dose_is_recorded_under_skip() {
        let session = Session::load(
            &table(&[["10:00", "MDMA", "ok", "2"], ["10:15", "MDMA:100", "", "4"]]),
            DosePolicy::Skip,
        )
        .unwrap();
        assert_eq!(session.doses().len(), 1);
        assert_eq!(session.skipped_doses().len(), 1);
    }

    #[test]
    fn malformed_dose_fails_under_abort() {
        let result = Session::load(&table(&[["10:00", "MDMA", "ok", "2"]]), DosePolicy::Abort);
        assert!(matches!(result, Err(ParseError::Dose(_))));
    }

    #[test]
    fn malformed_time_always_fails() {
        let result = Session::load(&table(&[["10-00", "0", "ok", "2"]]), DosePolicy::Skip);
        assert!(matches!(result, Err(ParseError::Timeline(_))));
    }
}
