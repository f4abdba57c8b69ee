use chrono::NaiveTime;
use thiserror::Error;
use tracing::info;
use tripchart_protocol::MetricName;

use super::RawTable;
use crate::model::{MetricSchema, Timeline, TimelineRecord};

pub const TIME_COLUMN: &str = "time";
pub const DOSE_COLUMN: &str = "dose";
pub const COMMENT_COLUMN: &str = "comment";

const TIME_FORMAT: &str = "%H:%M";

/// Row numbers are zero-based data-row indices (the header is not counted).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineParseError {
    #[error("row {row}: malformed time {value:?}, expected HH:MM")]
    MalformedTime { row: usize, value: String },
    #[error("missing required column {0:?}")]
    MissingColumn(&'static str),
    #[error("column {0:?} appears more than once")]
    DuplicateColumn(String),
    #[error("column {0} has a blank header")]
    BlankColumn(usize),
    #[error("row {row}: expected {expected} fields, found {found}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("row {row}: metric {metric:?} has non-numeric rating {value:?}")]
    MalformedRating {
        row: usize,
        metric: MetricName,
        value: String,
    },
}

/// Parse an `HH:MM` time of day. Single-digit hours (`9:05`) are accepted.
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT).ok()
}

/// Column positions resolved from the header row.
struct Layout {
    time: usize,
    dose: usize,
    comment: Option<usize>,
    /// `(column index, name)` for every rating column, in header order.
    metrics: Vec<(usize, MetricName)>,
}

impl Layout {
    fn from_headers(headers: &[String]) -> Result<Self, TimelineParseError> {
        let mut time = None;
        let mut dose = None;
        let mut comment = None;
        let mut metrics: Vec<(usize, MetricName)> = Vec::new();

        for (i, header) in headers.iter().enumerate() {
            let name = header.trim();
            let slot = match name {
                TIME_COLUMN => &mut time,
                DOSE_COLUMN => &mut dose,
                COMMENT_COLUMN => &mut comment,
                _ => {
                    let metric =
                        MetricName::new(name).map_err(|_| TimelineParseError::BlankColumn(i))?;
                    if metrics.iter().any(|(_, m)| *m == metric) {
                        return Err(TimelineParseError::DuplicateColumn(name.to_string()));
                    }
                    metrics.push((i, metric));
                    continue;
                }
            };
            if slot.replace(i).is_some() {
                return Err(TimelineParseError::DuplicateColumn(name.to_string()));
            }
        }

        Ok(Self {
            time: time.ok_or(TimelineParseError::MissingColumn(TIME_COLUMN))?,
            dose: dose.ok_or(TimelineParseError::MissingColumn(DOSE_COLUMN))?,
            comment,
            metrics,
        })
    }
}

/// Parse raw timeline rows into a [`Timeline`].
///
/// Every column other than `time`, `dose` and `comment` is a metric and must
/// hold a number on every row. The dose cell is kept verbatim for the dose
/// extractor. Rows are never merged or reordered, even when two share a
/// timestamp, so the output has exactly one record per input row.
///
/// A time earlier than the row before it is read as the next day, so a
/// session logged from 22:00 to 00:30 keeps its order on the chart.
pub fn parse_timeline(table: &RawTable) -> Result<Timeline, TimelineParseError> {
    let layout = Layout::from_headers(&table.headers)?;
    let expected = table.headers.len();
    let mut records: Vec<TimelineRecord> = Vec::with_capacity(table.rows.len());
    let mut day: u32 = 0;

    for (row, fields) in table.rows.iter().enumerate() {
        if fields.len() != expected {
            return Err(TimelineParseError::RowWidth {
                row,
                expected,
                found: fields.len(),
            });
        }

        let raw_time = &fields[layout.time];
        let time = parse_time_of_day(raw_time).ok_or_else(|| TimelineParseError::MalformedTime {
            row,
            value: raw_time.clone(),
        })?;

        if records.last().is_some_and(|prev| time < prev.time) {
            day += 1;
            info!(row, day, "time went backwards, continuing on the next day");
        }

        let ratings = layout
            .metrics
            .iter()
            .map(|(col, metric)| parse_rating(&fields[*col], row, metric))
            .collect::<Result<Vec<_>, _>>()?;

        records.push(TimelineRecord {
            time,
            day,
            ratings,
            dose: fields[layout.dose].trim().to_string(),
            comment: layout
                .comment
                .map(|col| fields[col].trim().to_string())
                .unwrap_or_default(),
        });
    }

    let schema = MetricSchema::new(layout.metrics.into_iter().map(|(_, m)| m).collect());
    Ok(Timeline::from_parts(schema, records))
}

fn parse_rating(value: &str, row: usize, metric: &MetricName) -> Result<f64, TimelineParseError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| TimelineParseError::MalformedRating {
            row,
            metric: metric.clone(),
            value: value.to_string(),
        })
}
