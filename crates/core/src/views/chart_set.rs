use tracing::debug;
use tripchart_protocol::{
    ChartSet, ChartSpec, DoseMarkers, MetricName, MetricSeries, RATING_UPPER_BOUND, ValueRange,
};

use super::CompositionError;
use super::series::build_metric_series;
use crate::model::Timeline;

/// Collapse duplicate names, keeping the first occurrence of each.
///
/// Names are trimmed; blank entries name no metric and are dropped.
pub fn normalize_request<I, S>(names: I) -> Vec<MetricName>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut request: Vec<MetricName> = Vec::new();
    for name in names {
        if let Ok(name) = MetricName::new(name.as_ref()) {
            if !request.contains(&name) {
                request.push(name);
            }
        }
    }
    request
}

/// `[lowest observed value, RATING_UPPER_BOUND]`.
///
/// An empty series gets `[0, RATING_UPPER_BOUND]`. The lower bound never
/// exceeds the upper one.
pub fn value_range_for(series: &MetricSeries) -> ValueRange {
    let min = series.min_value().unwrap_or(0.0).min(RATING_UPPER_BOUND);
    ValueRange {
        min,
        max: RATING_UPPER_BOUND,
    }
}

/// Build one chart per requested metric, in request order.
///
/// Every chart carries a clone of `doses` (same allocation), so all charts
/// draw identical markers. Composition is all-or-nothing: the first unknown
/// metric fails the whole set.
pub fn compose_chart_set(
    request: &[MetricName],
    timeline: &Timeline,
    doses: &DoseMarkers,
) -> Result<ChartSet, CompositionError> {
    let request = normalize_request(request);

    // Validate up front so a bad name late in the request costs nothing.
    if let Some(unknown) = request.iter().find(|m| !timeline.schema().contains(m)) {
        return Err(CompositionError::unknown_metric(
            unknown,
            timeline.metric_names(),
        ));
    }

    let charts = request
        .iter()
        .map(|metric| {
            let series = build_metric_series(timeline, metric)?;
            Ok(ChartSpec {
                metric: series.metric.clone(),
                value_range: value_range_for(&series),
                series,
                dose_markers: doses.clone(),
            })
        })
        .collect::<Result<Vec<_>, CompositionError>>()?;

    debug!(
        charts = charts.len(),
        doses = doses.len(),
        "composed chart set"
    );
    Ok(ChartSet::new(charts))
}
