//! SVG renderer: converts `RenderCommand` lists into standalone SVG strings.

use std::fmt::Write;

use tripchart_protocol::{
    ChartSet, LineStyle, Point, RenderCommand, SERIES_PALETTE, TextAlign, ThemeToken, TimeWindow,
    Viewport,
};

use crate::views::chart::{plot_area, render_chart};
use crate::views::time_axis::{AXIS_HEIGHT, render_time_axis};

const CHART_GAP: f64 = 12.0;

/// Render a list of commands as an SVG document string.
///
/// `width` and `height` define the SVG viewBox dimensions.
/// `dark` selects the color palette.
pub fn render_svg(commands: &[RenderCommand], width: f64, height: f64, dark: bool) -> String {
    let mut svg = String::with_capacity(commands.len() * 120);
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}" style="font-family:Lato,system-ui,sans-serif">"#,
    );
    let _ = write!(
        svg,
        r#"<rect width="{width}" height="{height}" fill="{}"/>"#,
        resolve_color(ThemeToken::Background, dark),
    );

    let mut clip_id = 0usize;

    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect {
                rect,
                color,
                border_color,
            } => {
                let _ = write!(
                    svg,
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}""#,
                    rect.x,
                    rect.y,
                    rect.w,
                    rect.h,
                    resolve_color(*color, dark),
                );
                if let Some(border) = border_color {
                    let _ = write!(svg, r#" stroke="{}""#, resolve_color(*border, dark));
                }
                svg.push_str("/>");
            }
            RenderCommand::DrawText {
                position,
                text,
                color,
                font_size,
                align,
            } => {
                let anchor = match align {
                    TextAlign::Left => "start",
                    TextAlign::Center => "middle",
                    TextAlign::Right => "end",
                };
                let _ = write!(
                    svg,
                    r#"<text x="{}" y="{}" fill="{}" font-size="{font_size}" text-anchor="{anchor}">{}</text>"#,
                    position.x,
                    position.y,
                    resolve_color(*color, dark),
                    escape_xml(text),
                );
            }
            RenderCommand::DrawLine {
                from,
                to,
                color,
                width: line_width,
                style,
            } => {
                let _ = write!(
                    svg,
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{line_width}""#,
                    from.x,
                    from.y,
                    to.x,
                    to.y,
                    resolve_color(*color, dark),
                );
                if *style == LineStyle::Dashed {
                    svg.push_str(r#" stroke-dasharray="4 3""#);
                }
                svg.push_str("/>");
            }
            RenderCommand::DrawPolyline {
                points,
                color,
                width: line_width,
            } => {
                let _ = write!(
                    svg,
                    r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="{line_width}" stroke-linejoin="round"/>"#,
                    format_points(points),
                    resolve_color(*color, dark),
                );
            }
            RenderCommand::FillArea {
                points,
                baseline_y,
                color,
            } => {
                let (Some(first), Some(last)) = (points.first(), points.last()) else {
                    continue;
                };
                let mut outline = Vec::with_capacity(points.len() + 2);
                outline.push(Point::new(first.x, *baseline_y));
                outline.extend_from_slice(points);
                outline.push(Point::new(last.x, *baseline_y));
                let _ = write!(
                    svg,
                    r#"<polygon points="{}" fill="{}" stroke="none"/>"#,
                    format_points(&outline),
                    resolve_color(*color, dark),
                );
            }
            RenderCommand::DrawPoint {
                center,
                radius,
                color,
            } => {
                let _ = write!(
                    svg,
                    r#"<circle cx="{}" cy="{}" r="{radius}" fill="{}"/>"#,
                    center.x,
                    center.y,
                    resolve_color(*color, dark),
                );
            }
            RenderCommand::SetClip { rect } => {
                clip_id += 1;
                let _ = write!(
                    svg,
                    r#"<clipPath id="clip{clip_id}"><rect x="{}" y="{}" width="{}" height="{}"/></clipPath><g clip-path="url(#clip{clip_id})">"#,
                    rect.x, rect.y, rect.w, rect.h,
                );
            }
            RenderCommand::BeginGroup { id, .. } => {
                let _ = write!(svg, r#"<g id="{}">"#, escape_xml(id));
            }
            RenderCommand::ClearClip | RenderCommand::EndGroup => svg.push_str("</g>"),
        }
    }

    svg.push_str("</svg>");
    svg
}

/// Render a whole chart set as one SVG: a shared time axis on top and the
/// charts stacked below it, all on the same horizontal scale.
pub fn render_chart_set_svg(
    set: &ChartSet,
    width: f64,
    chart_height: f64,
    dark: bool,
) -> String {
    let height = AXIS_HEIGHT + set.len() as f64 * (chart_height + CHART_GAP);
    let Some(window) = chart_set_window(set) else {
        return render_svg(&[], width, height, dark);
    };

    // The ruler sits over the plot areas, not the value-label gutter.
    let plot = plot_area(&Viewport::new(width, chart_height));
    let ruler = Viewport {
        x: plot.x,
        y: 0.0,
        width: plot.width,
        height: AXIS_HEIGHT,
    };
    let mut commands = render_time_axis(&ruler, &window, height - AXIS_HEIGHT);
    for (index, spec) in set.iter().enumerate() {
        let viewport = Viewport {
            x: 0.0,
            y: AXIS_HEIGHT + index as f64 * (chart_height + CHART_GAP),
            width,
            height: chart_height,
        };
        commands.extend(render_chart(spec, &viewport, &window, index));
    }
    render_svg(&commands, width, height, dark)
}

/// Earliest to latest session minute across every chart of the set.
pub fn chart_set_window(set: &ChartSet) -> Option<TimeWindow> {
    let (start, end) = set
        .iter()
        .filter_map(|spec| spec.series.minute_span())
        .reduce(|(s0, e0), (s1, e1)| (s0.min(s1), e0.max(e1)))?;
    Some(TimeWindow::from_minutes(start, end))
}

fn format_points(points: &[Point]) -> String {
    let mut out = String::with_capacity(points.len() * 16);
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{},{}", p.x, p.y);
    }
    out
}

fn resolve_color(token: ThemeToken, dark: bool) -> String {
    if let ThemeToken::Series(i) | ThemeToken::SeriesFill(i) = token {
        let (r, g, b) = SERIES_PALETTE[usize::from(i) % SERIES_PALETTE.len()];
        return if matches!(token, ThemeToken::SeriesFill(_)) {
            format!("rgba({r},{g},{b},0.25)")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}")
        };
    }

    let hex = if dark {
        match token {
            ThemeToken::Background => "#181818",
            ThemeToken::ChartBackground => "#1e1e2e",
            ThemeToken::ChartBorder => "#303030",
            ThemeToken::GridLine => "#2a2a2a",
            ThemeToken::DoseLine => "rgba(235,235,235,0.9)",
            ThemeToken::DoseText | ThemeToken::TextPrimary => "#ececec",
            ThemeToken::AxisText | ThemeToken::TextMuted => "#9e9e9e",
            _ => "#616161",
        }
    } else {
        match token {
            ThemeToken::Background => "#ffffff",
            ThemeToken::ChartBackground => "#fafafa",
            ThemeToken::ChartBorder => "#dee2e6",
            ThemeToken::GridLine => "#eeeeee",
            ThemeToken::DoseLine => "rgba(20,20,20,0.9)",
            ThemeToken::DoseText | ThemeToken::TextPrimary => "#1a1a2e",
            ThemeToken::AxisText | ThemeToken::TextMuted => "#666677",
            _ => "#999999",
        }
    };
    hex.to_string()
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use tripchart_protocol::{
        ChartSpec, DoseEvent, DoseMarkers, MetricName, MetricSeries, Rect, SeriesPoint,
        ValueRange,
    };

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn spec_over(metric: &str, doses: &DoseMarkers, points: Vec<SeriesPoint>) -> ChartSpec {
        let metric: MetricName = metric.parse().unwrap();
        ChartSpec {
            metric: metric.clone(),
            series: MetricSeries { metric, points },
            dose_markers: doses.clone(),
            value_range: ValueRange { min: 2.0, max: 10.0 },
        }
    }

    fn spec(metric: &str, doses: &DoseMarkers) -> ChartSpec {
        spec_over(
            metric,
            doses,
            vec![
                SeriesPoint { time: at(10, 0), day: 0, value: 2.0 },
                SeriesPoint { time: at(11, 0), day: 0, value: 6.0 },
            ],
        )
    }

    #[test]
    fn basic_svg_output() {
        let commands = vec![RenderCommand::DrawRect {
            rect: Rect::new(10.0, 20.0, 100.0, 18.0),
            color: ThemeToken::Series(0),
            border_color: None,
        }];
        let svg = render_svg(&commands, 800.0, 400.0, false);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("#fd3216"));
    }

    #[test]
    fn escapes_xml_entities() {
        let commands = vec![RenderCommand::DrawText {
            position: Point::new(0.0, 10.0),
            text: "LSD : 1/2 <tab> & more".into(),
            color: ThemeToken::DoseText,
            font_size: 8.0,
            align: TextAlign::Left,
        }];
        let svg = render_svg(&commands, 400.0, 100.0, false);
        assert!(svg.contains("LSD : 1/2 &lt;tab&gt; &amp; more"));
    }

    #[test]
    fn chart_set_svg_stacks_every_chart() {
        let doses = DoseMarkers::new(vec![DoseEvent {
            time: at(10, 30),
            day: 0,
            substance: "6-APB".into(),
            amount: "75".into(),
        }]);
        let set = ChartSet::new(vec![spec("intensity", &doses), spec("anxiety", &doses)]);
        let svg = render_chart_set_svg(&set, 600.0, 150.0, true);

        assert!(svg.contains(r#"<g id="chart-intensity">"#));
        assert!(svg.contains(r#"<g id="chart-anxiety">"#));
        assert_eq!(svg.matches("6-APB : 75mg").count(), 2);
        assert_eq!(svg.matches("stroke-dasharray").count(), 2);
        assert_eq!(svg.matches("<g").count(), svg.matches("</g>").count());
    }

    #[test]
    fn empty_chart_set_is_a_blank_document() {
        let svg = render_chart_set_svg(&ChartSet::default(), 600.0, 150.0, false);
        assert!(svg.starts_with("<svg"));
        assert!(!svg.contains("<polyline"));
    }

    #[test]
    fn window_covers_all_series() {
        let doses = DoseMarkers::default();
        let set = ChartSet::new(vec![spec("intensity", &doses)]);
        let window = chart_set_window(&set).unwrap();
        assert_eq!(window, TimeWindow::new(at(10, 0), at(11, 0)));
    }

    #[test]
    fn window_spans_midnight() {
        let doses = DoseMarkers::default();
        let set = ChartSet::new(vec![spec_over(
            "anxiety",
            &doses,
            vec![
                SeriesPoint { time: at(22, 0), day: 0, value: 2.0 },
                SeriesPoint { time: at(0, 30), day: 1, value: 4.0 },
            ],
        )]);
        let window = chart_set_window(&set).unwrap();
        assert_eq!(window, TimeWindow::new(at(22, 0), at(0, 30)));
        assert_eq!(window.duration(), 150.0);
    }
}
