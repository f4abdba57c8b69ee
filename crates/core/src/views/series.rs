use tripchart_protocol::{MetricSeries, SeriesPoint};

use super::CompositionError;
use crate::model::Timeline;

/// Read one metric from every record, in timeline order.
///
/// Each record contributes exactly one point; nothing is interpolated or
/// resampled. Curve smoothing is left to the renderer.
pub fn build_metric_series(
    timeline: &Timeline,
    metric: &str,
) -> Result<MetricSeries, CompositionError> {
    let schema = timeline.schema();
    let (index, name) = schema
        .index_of(metric)
        .map(|i| (i, schema.names()[i].clone()))
        .ok_or_else(|| CompositionError::unknown_metric(metric, schema.names()))?;

    let points = timeline
        .records()
        .iter()
        .map(|record| SeriesPoint {
            time: record.time,
            day: record.day,
            value: record.ratings[index],
        })
        .collect();

    Ok(MetricSeries {
        metric: name,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::RawTable;
    use crate::parsers::timeline::parse_timeline;

    fn timeline() -> Timeline {
        let table = RawTable::new(
            vec!["time".into(), "dose".into(), "anxiety".into(), "euphoria".into()],
            vec![
                vec!["10:00".into(), "0".into(), "2".into(), "0".into()],
                vec!["10:15".into(), "MDMA:100".into(), "4".into(), "1".into()],
                vec!["10:15".into(), "0".into(), "4.5".into(), "2".into()],
            ],
        );
        parse_timeline(&table).unwrap()
    }

    #[test]
    fn one_point_per_record() {
        let series = build_metric_series(&timeline(), "anxiety").unwrap();
        assert_eq!(series.metric, "anxiety");
        let values: Vec<f64> = series.points.iter().map(|p| p.value).collect();
        assert_eq!(values, [2.0, 4.0, 4.5]);
    }

    #[test]
    fn unknown_metric_errors() {
        let err = build_metric_series(&timeline(), "nonexistent").unwrap_err();
        assert!(matches!(err, CompositionError::UnknownMetric { ref name, .. } if name == "nonexistent"));
        assert!(err.to_string().contains("anxiety, euphoria"));
    }
}
