use tripchart_protocol::{
    ChartSpec, Point, Rect, RenderCommand, TextAlign, ThemeToken, TimeWindow, Viewport,
};

use super::markers::render_dose_markers;

const TITLE_HEIGHT: f64 = 16.0;
const GUTTER_WIDTH: f64 = 28.0;
const LABEL_PADDING: f64 = 4.0;
const FONT_SIZE: f64 = 10.0;
const POINT_RADIUS: f64 = 2.5;

/// The plotting area of a chart viewport, below the title and right of the
/// value labels.
pub fn plot_area(viewport: &Viewport) -> Viewport {
    Viewport {
        x: viewport.x + GUTTER_WIDTH,
        y: viewport.y + TITLE_HEIGHT,
        width: (viewport.width - GUTTER_WIDTH).max(0.0),
        height: (viewport.height - TITLE_HEIGHT).max(0.0),
    }
}

/// Render one chart: a filled line-and-marker plot of the series over its
/// value range, with the dose markers overlaid.
///
/// `window` is shared by every chart of a set so their x axes line up.
/// `index` is the chart's position in the set and picks its series color.
pub fn render_chart(
    spec: &ChartSpec,
    viewport: &Viewport,
    window: &TimeWindow,
    index: usize,
) -> Vec<RenderCommand> {
    let plot = plot_area(viewport);
    if plot.width <= 0.0 || plot.height <= 0.0 {
        return Vec::new();
    }

    let range = spec.value_range;
    // A flat range (everything at the upper bound) still needs a scale.
    let span = if range.span() > 0.0 { range.span() } else { 1.0 };
    let bottom = plot.y + plot.height;
    let to_point = |minute: f64, value: f64| {
        let x = plot.x + window.x_for(minute, plot.width);
        let y = bottom - (value - range.min) / span * plot.height;
        Point::new(x, y)
    };

    let mut commands = Vec::with_capacity(spec.series.points.len() + 16);

    commands.push(RenderCommand::BeginGroup {
        id: format!("chart-{}", spec.metric),
        label: Some(spec.metric.to_string()),
    });

    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(viewport.x, viewport.y, viewport.width, viewport.height),
        color: ThemeToken::ChartBackground,
        border_color: Some(ThemeToken::ChartBorder),
    });

    commands.push(RenderCommand::DrawText {
        position: Point::new(viewport.x + LABEL_PADDING, viewport.y + FONT_SIZE + 2.0),
        text: spec.metric.to_string(),
        color: ThemeToken::TextPrimary,
        font_size: FONT_SIZE,
        align: TextAlign::Left,
    });

    for (value, y) in [(range.max, plot.y + FONT_SIZE), (range.min, bottom)] {
        commands.push(RenderCommand::DrawText {
            position: Point::new(plot.x - LABEL_PADDING, y),
            text: format_rating(value),
            color: ThemeToken::TextMuted,
            font_size: FONT_SIZE,
            align: TextAlign::Right,
        });
    }

    commands.push(RenderCommand::SetClip {
        rect: Rect::new(plot.x, plot.y, plot.width, plot.height),
    });

    let points: Vec<Point> = spec
        .series
        .points
        .iter()
        .map(|p| to_point(p.minute(), p.value))
        .collect();

    if !points.is_empty() {
        commands.push(RenderCommand::FillArea {
            points: points.clone(),
            baseline_y: bottom,
            color: ThemeToken::series_fill(index),
        });
        commands.push(RenderCommand::DrawPolyline {
            points: points.clone(),
            color: ThemeToken::series(index),
            width: 1.5,
        });
        commands.extend(points.into_iter().map(|center| RenderCommand::DrawPoint {
            center,
            radius: POINT_RADIUS,
            color: ThemeToken::series(index),
        }));
    }

    commands.extend(render_dose_markers(&spec.dose_markers, &plot, window));

    commands.push(RenderCommand::ClearClip);
    commands.push(RenderCommand::EndGroup);
    commands
}

/// Ratings are usually whole numbers; only show decimals when present.
fn format_rating(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}
