use serde::Serialize;
use thiserror::Error;
use tripchart_core::config::{DosePolicy, ReportConfig};
use tripchart_core::parsers::ParseError;
use tripchart_core::parsers::table::{read_metadata, read_table};
use tripchart_core::report::{metadata_markdown, narrative_markdown};
use tripchart_core::selection::SelectionController;
use tripchart_core::svg::render_chart_set_svg;
use tripchart_core::{Metadata, Session};
use wasm_bindgen::prelude::*;

#[derive(Debug, Error)]
enum BridgeError {
    #[error(transparent)]
    Core(#[from] tripchart_core::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ParseError> for BridgeError {
    fn from(err: ParseError) -> Self {
        Self::Core(err.into())
    }
}

impl From<tripchart_core::CompositionError> for BridgeError {
    fn from(err: tripchart_core::CompositionError) -> Self {
        Self::Core(err.into())
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, BridgeError> {
    Ok(serde_json::to_string(value)?)
}

/// One loaded trip report and its current metric selection.
#[wasm_bindgen]
pub struct Report {
    controller: SelectionController,
    narrative: String,
    metadata: String,
    skipped_doses: usize,
}

impl Report {
    fn load(
        timeline_csv: &str,
        metadata_csv: Option<&str>,
        strict_doses: bool,
    ) -> Result<Self, BridgeError> {
        let config = ReportConfig {
            dose_policy: if strict_doses {
                DosePolicy::Abort
            } else {
                DosePolicy::Skip
            },
            ..ReportConfig::default()
        };
        let table = read_table(timeline_csv.as_bytes()).map_err(ParseError::from)?;
        let session = Session::load(&table, config.dose_policy)?;
        let metadata = match metadata_csv {
            Some(csv) => read_metadata(csv.as_bytes()).map_err(ParseError::from)?,
            None => Metadata::default(),
        };
        let controller = SelectionController::for_session(&session, &config.default_metrics)?;

        Ok(Self {
            narrative: narrative_markdown(session.timeline()),
            metadata: metadata_markdown(&metadata),
            skipped_doses: session.skipped_doses().len(),
            controller,
        })
    }

    fn select_json(&mut self, metrics_json: &str) -> Result<String, BridgeError> {
        let metrics: Vec<String> = serde_json::from_str(metrics_json)?;
        let charts = self.controller.select(&metrics)?;
        to_json(charts)
    }

    fn toggle_json(&mut self, metric: &str) -> Result<String, BridgeError> {
        let charts = self.controller.toggle(metric)?;
        to_json(charts)
    }
}

#[wasm_bindgen]
impl Report {
    /// Load a report from the timeline table text and, optionally, the
    /// metadata table text. The default metrics the timeline tracks are
    /// selected.
    #[wasm_bindgen(constructor)]
    pub fn new(
        timeline_csv: &str,
        metadata_csv: Option<String>,
        strict_doses: bool,
    ) -> Result<Report, JsError> {
        Ok(Self::load(timeline_csv, metadata_csv.as_deref(), strict_doses)?)
    }

    /// Replace the selection with a JSON array of metric names and return
    /// the new chart set as JSON. On an unknown metric nothing changes.
    pub fn select(&mut self, metrics_json: &str) -> Result<String, JsError> {
        Ok(self.select_json(metrics_json)?)
    }

    /// Add or remove one metric and return the new chart set as JSON.
    pub fn toggle(&mut self, metric: &str) -> Result<String, JsError> {
        Ok(self.toggle_json(metric)?)
    }

    /// The current chart set as JSON.
    pub fn charts(&self) -> Result<String, JsError> {
        Ok(to_json(self.controller.charts())?)
    }

    /// Selected metric names as a JSON array, in display order.
    pub fn selection(&self) -> Result<String, JsError> {
        Ok(to_json(self.controller.selection().metrics())?)
    }

    /// Every metric of the timeline as a JSON array, in column order.
    pub fn metric_names(&self) -> Result<String, JsError> {
        Ok(to_json(self.controller.available_metrics())?)
    }

    pub fn narrative(&self) -> String {
        self.narrative.clone()
    }

    pub fn metadata(&self) -> String {
        self.metadata.clone()
    }

    pub fn skipped_doses(&self) -> usize {
        self.skipped_doses
    }

    /// The current chart set as a standalone SVG document.
    pub fn render_svg(&self, width: f64, chart_height: f64, dark: bool) -> String {
        render_chart_set_svg(self.controller.charts(), width, chart_height, dark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMELINE: &str = "time;dose;comment;intensity;anxiety\n\
        18:00;Mescaline:300;first sip;0;2\n\
        19:00;0;visuals<br>nausea;3;4\n\
        20:30;Mescaline;?;6;1\n";
    const METADATA: &str = "age;setting\n34;desert\n";

    fn report() -> Report {
        Report::load(TIMELINE, Some(METADATA), false).unwrap()
    }

    #[test]
    fn loads_with_default_selection() {
        let report = report();
        assert_eq!(report.skipped_doses(), 1);
        assert_eq!(
            to_json(report.controller.selection().metrics()).unwrap(),
            r#"["intensity","anxiety"]"#
        );
        assert_eq!(report.metadata(), "**Age** : 34\n\n**Setting** : desert\n\n");
        assert!(report.narrative().contains("*visuals* \n\n*nausea*"));
    }

    #[test]
    fn select_returns_chart_json() {
        let mut report = report();
        let json: serde_json::Value =
            serde_json::from_str(&report.select_json(r#"["anxiety"]"#).unwrap()).unwrap();
        assert_eq!(json["charts"].as_array().map(Vec::len), Some(1));
        assert_eq!(json["charts"][0]["value_range"]["min"], 1.0);
        assert_eq!(json["charts"][0]["dose_markers"][0]["substance"], "Mescaline");
    }

    #[test]
    fn rejected_selection_keeps_charts() {
        let mut report = report();
        let before = report.controller.charts().clone();
        assert!(matches!(
            report.select_json(r#"["anxiety", "clarity"]"#),
            Err(BridgeError::Core(tripchart_core::Error::Composition(_)))
        ));
        assert!(matches!(
            report.select_json("not json"),
            Err(BridgeError::Json(_))
        ));
        assert_eq!(report.controller.charts(), &before);
    }

    #[test]
    fn toggle_and_strict_load() {
        let mut report = report();
        report.toggle_json("intensity").unwrap();
        assert_eq!(report.controller.selection().metrics(), ["anxiety"]);

        assert!(matches!(
            Report::load(TIMELINE, None, true),
            Err(BridgeError::Core(tripchart_core::Error::Parse(ParseError::Dose(_))))
        ));
    }
}
