use serde::{Deserialize, Serialize};
use tripchart_protocol::MetricName;

/// Metrics shown when a report is first opened.
pub const DEFAULT_METRICS: [&str; 4] = ["intensity", "euphoria", "introspection", "anxiety"];

/// What to do with a dose cell that is neither `"0"` nor `substance:amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DosePolicy {
    /// Drop the row from the dose events and keep loading.
    #[default]
    Skip,
    /// Fail the whole load.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub dose_policy: DosePolicy,
    /// Initial selection. Names missing from the timeline's schema are
    /// dropped when the report is opened.
    pub default_metrics: Vec<MetricName>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dose_policy: DosePolicy::default(),
            default_metrics: DEFAULT_METRICS
                .iter()
                .filter_map(|name| MetricName::new(name).ok())
                .collect(),
        }
    }
}
