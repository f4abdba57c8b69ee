use std::collections::HashMap;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tripchart_protocol::{MetricName, TimeWindow, session_minute};

/// The fixed set of rating columns every record carries, in column order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<MetricName>", into = "Vec<MetricName>")]
pub struct MetricSchema {
    names: Vec<MetricName>,
    index: HashMap<MetricName, usize>,
}

impl MetricSchema {
    /// Build a schema from column names. Duplicates must be rejected by the
    /// caller; the first occurrence wins here.
    pub fn new(names: Vec<MetricName>) -> Self {
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        Self { names, index }
    }

    pub fn names(&self) -> &[MetricName] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name.trim()).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// The schema's own handle for `name`, so callers share its allocation.
    pub fn resolve(&self, name: &str) -> Option<&MetricName> {
        self.index_of(name).map(|i| &self.names[i])
    }
}

impl From<Vec<MetricName>> for MetricSchema {
    fn from(names: Vec<MetricName>) -> Self {
        Self::new(names)
    }
}

impl From<MetricSchema> for Vec<MetricName> {
    fn from(schema: MetricSchema) -> Self {
        schema.names
    }
}

/// One logged instant: ratings for every metric, the raw dose cell, and the
/// free-text comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineRecord {
    pub time: NaiveTime,
    /// Midnights crossed since the first record.
    #[serde(default)]
    pub day: u32,
    /// Ratings indexed like [`MetricSchema::names`].
    pub ratings: Vec<f64>,
    /// Undecoded dose cell (`"0"` or `substance:amount`).
    pub dose: String,
    pub comment: String,
}

impl TimelineRecord {
    pub fn minute(&self) -> f64 {
        session_minute(self.day, self.time)
    }
}

/// A record whose rating count does not match the schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record {row} has {found} ratings, the schema has {expected} metrics")]
pub struct RatingCountMismatch {
    pub row: usize,
    pub expected: usize,
    pub found: usize,
}

/// The full chronological log of one session. Immutable once parsed.
///
/// Every record has exactly one rating per schema metric; deserializing
/// checks this too.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "TimelineParts")]
pub struct Timeline {
    schema: MetricSchema,
    records: Vec<TimelineRecord>,
}

#[derive(Deserialize)]
struct TimelineParts {
    schema: MetricSchema,
    records: Vec<TimelineRecord>,
}

impl TryFrom<TimelineParts> for Timeline {
    type Error = RatingCountMismatch;

    fn try_from(parts: TimelineParts) -> Result<Self, Self::Error> {
        let expected = parts.schema.len();
        if let Some((row, record)) = parts
            .records
            .iter()
            .enumerate()
            .find(|(_, r)| r.ratings.len() != expected)
        {
            return Err(RatingCountMismatch {
                row,
                expected,
                found: record.ratings.len(),
            });
        }
        Ok(Self::from_parts(parts.schema, parts.records))
    }
}

impl Timeline {
    /// Callers guarantee every record has `schema.len()` ratings.
    pub(crate) fn from_parts(schema: MetricSchema, records: Vec<TimelineRecord>) -> Self {
        debug_assert!(records.iter().all(|r| r.ratings.len() == schema.len()));
        Self { schema, records }
    }

    pub fn schema(&self) -> &MetricSchema {
        &self.schema
    }

    /// Selectable metrics, in column order.
    pub fn metric_names(&self) -> &[MetricName] {
        self.schema.names()
    }

    pub fn records(&self) -> &[TimelineRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rating of `metric` in `record`, `None` for a metric outside the schema.
    pub fn rating(&self, record: &TimelineRecord, metric: &str) -> Option<f64> {
        self.schema
            .index_of(metric)
            .and_then(|i| record.ratings.get(i).copied())
    }

    /// Earliest to latest session minute; `None` for an empty timeline.
    pub fn time_window(&self) -> Option<TimeWindow> {
        let first = self.records.first()?.minute();
        let (start, end) = self
            .records
            .iter()
            .map(TimelineRecord::minute)
            .fold((first, first), |(lo, hi), m| (lo.min(m), hi.max(m)));
        Some(TimeWindow::from_minutes(start, end))
    }
}
