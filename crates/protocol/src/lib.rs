pub mod chart;
pub mod commands;
pub mod metric_name;
pub mod theme;
pub mod types;

pub use chart::{
    ChartSet, ChartSpec, DoseEvent, DoseMarkers, MetricSeries, RATING_UPPER_BOUND, SeriesPoint,
    ValueRange,
};
pub use commands::{LineStyle, RenderCommand, TextAlign};
pub use metric_name::{BlankMetricName, MetricName};
pub use theme::{SERIES_PALETTE, SERIES_PALETTE_LEN, ThemeToken};
pub use types::{
    MINUTES_PER_DAY, Point, Rect, TimeWindow, Viewport, minute_of_day, session_minute,
};
