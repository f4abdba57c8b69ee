use std::sync::Arc;

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::metric_name::MetricName;
use crate::types::session_minute;

/// Upper bound of the rating scale shared by every metric.
///
/// All charts use it as the top of their value range so they can be compared
/// side by side.
pub const RATING_UPPER_BOUND: f64 = 10.0;

/// A discrete administration of a substance, anchored to a time of day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoseEvent {
    pub time: NaiveTime,
    /// Midnights crossed between the first record and this one.
    #[serde(default)]
    pub day: u32,
    pub substance: String,
    /// Amount as logged. Usually a bare number of milligrams.
    pub amount: String,
}

impl DoseEvent {
    pub fn minute(&self) -> f64 {
        session_minute(self.day, self.time)
    }

    /// Annotation text for the marker, e.g. `"MDMA : 100mg"`.
    ///
    /// Bare numeric amounts are read as milligrams; anything else is shown
    /// verbatim.
    pub fn label(&self) -> String {
        if self.amount.parse::<f64>().is_ok() {
            format!("{} : {}mg", self.substance, self.amount)
        } else {
            format!("{} : {}", self.substance, self.amount)
        }
    }
}

/// The dose events of a session, shared by every chart of a composition.
///
/// Cloning only bumps a refcount; equality compares the events themselves.
#[derive(Debug, Clone)]
pub struct DoseMarkers(Arc<[DoseEvent]>);

impl DoseMarkers {
    pub fn new(events: Vec<DoseEvent>) -> Self {
        Self(Arc::from(events))
    }

    /// Whether both handles point at the very same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for DoseMarkers {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PartialEq for DoseMarkers {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0[..] == other.0[..]
    }
}

impl std::ops::Deref for DoseMarkers {
    type Target = [DoseEvent];

    fn deref(&self) -> &[DoseEvent] {
        &self.0
    }
}

impl From<Vec<DoseEvent>> for DoseMarkers {
    fn from(events: Vec<DoseEvent>) -> Self {
        Self::new(events)
    }
}

impl Serialize for DoseMarkers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0[..].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DoseMarkers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<DoseEvent>::deserialize(deserializer).map(Self::new)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub time: NaiveTime,
    #[serde(default)]
    pub day: u32,
    pub value: f64,
}

impl SeriesPoint {
    pub fn minute(&self) -> f64 {
        session_minute(self.day, self.time)
    }
}

/// One metric's ratings across the whole timeline, in record order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub metric: MetricName,
    pub points: Vec<SeriesPoint>,
}

impl MetricSeries {
    /// Smallest observed value, `None` for an empty series.
    pub fn min_value(&self) -> Option<f64> {
        self.points.iter().map(|p| p.value).reduce(f64::min)
    }

    pub fn max_value(&self) -> Option<f64> {
        self.points.iter().map(|p| p.value).reduce(f64::max)
    }

    /// Earliest and latest session minutes.
    pub fn minute_span(&self) -> Option<(f64, f64)> {
        let first = self.points.first()?.minute();
        Some(
            self.points
                .iter()
                .map(SeriesPoint::minute)
                .fold((first, first), |(lo, hi), m| (lo.min(m), hi.max(m))),
        )
    }
}

/// Vertical extent of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Everything a renderer needs to draw one metric chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub metric: MetricName,
    pub series: MetricSeries,
    pub dose_markers: DoseMarkers,
    pub value_range: ValueRange,
}

/// The ordered charts of one composition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartSet {
    charts: Vec<ChartSpec>,
}

impl ChartSet {
    pub fn new(charts: Vec<ChartSpec>) -> Self {
        Self { charts }
    }

    pub fn charts(&self) -> &[ChartSpec] {
        &self.charts
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    pub fn get(&self, metric: &str) -> Option<&ChartSpec> {
        self.charts.iter().find(|c| c.metric == metric)
    }

    /// Metric names in display order.
    pub fn metrics(&self) -> impl Iterator<Item = &MetricName> {
        self.charts.iter().map(|c| &c.metric)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChartSpec> {
        self.charts.iter()
    }
}

impl<'a> IntoIterator for &'a ChartSet {
    type Item = &'a ChartSpec;
    type IntoIter = std::slice::Iter<'a, ChartSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.charts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default()
    }

    fn anxiety() -> MetricName {
        MetricName::new("anxiety").unwrap_or_else(|_| unreachable!())
    }

    fn point(day: u32, time: NaiveTime, value: f64) -> SeriesPoint {
        SeriesPoint { time, day, value }
    }

    fn dose(substance: &str, amount: &str) -> DoseEvent {
        DoseEvent {
            time: at(10, 15),
            day: 0,
            substance: substance.into(),
            amount: amount.into(),
        }
    }

    #[test]
    fn numeric_amounts_are_labelled_in_milligrams() {
        assert_eq!(dose("MDMA", "100").label(), "MDMA : 100mg");
        assert_eq!(dose("6-APB", "37.5").label(), "6-APB : 37.5mg");
        assert_eq!(dose("Cannabis", "1 joint").label(), "Cannabis : 1 joint");
    }

    #[test]
    fn dose_markers_share_allocation_on_clone() {
        let markers = DoseMarkers::new(vec![dose("MDMA", "100")]);
        let other = markers.clone();
        assert!(markers.ptr_eq(&other));
        assert_eq!(markers.len(), 1);
    }

    #[test]
    fn dose_markers_compare_by_value() {
        let a = DoseMarkers::new(vec![dose("MDMA", "100")]);
        let b = DoseMarkers::new(vec![dose("MDMA", "100")]);
        assert!(!a.ptr_eq(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn series_extremes() {
        let series = MetricSeries {
            metric: anxiety(),
            points: vec![
                point(0, at(10, 0), 2.0),
                point(0, at(10, 15), 4.0),
                point(0, at(10, 30), 1.0),
            ],
        };
        assert_eq!(series.min_value(), Some(1.0));
        assert_eq!(series.max_value(), Some(4.0));
        assert_eq!(series.minute_span(), Some((600.0, 630.0)));

        let empty = MetricSeries {
            metric: anxiety(),
            points: vec![],
        };
        assert_eq!(empty.min_value(), None);
        assert_eq!(empty.minute_span(), None);
    }

    #[test]
    fn points_after_midnight_extend_the_span() {
        let series = MetricSeries {
            metric: anxiety(),
            points: vec![point(0, at(23, 0), 3.0), point(1, at(0, 30), 5.0)],
        };
        assert_eq!(series.points[1].minute(), 1470.0);
        assert_eq!(series.minute_span(), Some((1380.0, 1470.0)));

        let late = DoseEvent {
            day: 1,
            ..dose("MDMA", "100")
        };
        assert_eq!(late.minute(), 1440.0 + 615.0);
    }

    #[test]
    fn chart_spec_serializes_markers_as_array() {
        let markers = DoseMarkers::new(vec![dose("MDMA", "100")]);
        let spec = ChartSpec {
            metric: anxiety(),
            series: MetricSeries {
                metric: anxiety(),
                points: vec![],
            },
            dose_markers: markers,
            value_range: ValueRange {
                min: 0.0,
                max: RATING_UPPER_BOUND,
            },
        };
        let json = serde_json::to_value(&spec).unwrap_or_default();
        assert_eq!(json["dose_markers"][0]["substance"], "MDMA");
        assert_eq!(json["dose_markers"][0]["time"], "10:15:00");
        assert_eq!(json["metric"], "anxiety");
    }
}
