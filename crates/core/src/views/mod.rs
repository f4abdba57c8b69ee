pub mod chart;
pub mod chart_set;
pub mod markers;
pub mod series;
pub mod time_axis;

use thiserror::Error;
use tripchart_protocol::MetricName;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    #[error("unknown metric {name:?} (available: {})", available.join(", "))]
    UnknownMetric {
        name: String,
        available: Vec<MetricName>,
    },
}

impl CompositionError {
    pub(crate) fn unknown_metric(name: &str, available: &[MetricName]) -> Self {
        Self::UnknownMetric {
            name: name.trim().to_string(),
            available: available.to_vec(),
        }
    }
}
