use tripchart_protocol::{
    LineStyle, MINUTES_PER_DAY, Point, Rect, RenderCommand, TextAlign, ThemeToken, TimeWindow,
    Viewport,
};

pub const AXIS_HEIGHT: f64 = 20.0;
const MAJOR_TICK_HEIGHT: f64 = 6.0;
const MINOR_TICK_HEIGHT: f64 = 3.0;
const FONT_SIZE: f64 = 10.0;
const LABEL_Y: f64 = 16.0;
const MIN_MAJOR_SPACING_PX: f64 = 70.0;

/// Render an `HH:MM` ruler for `window` along the top of `viewport`, plus
/// vertical gridlines reaching `grid_height` below it.
pub fn render_time_axis(
    viewport: &Viewport,
    window: &TimeWindow,
    grid_height: f64,
) -> Vec<RenderCommand> {
    let duration = window.duration();
    if duration <= 0.0 || viewport.width <= 0.0 {
        return Vec::new();
    }

    let x_scale = viewport.width / duration;
    let mut commands = Vec::with_capacity(32);

    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(viewport.x, viewport.y, viewport.width, AXIS_HEIGHT),
        color: ThemeToken::Background,
        border_color: Some(ThemeToken::ChartBorder),
    });

    let (major, subdivisions) = nice_interval(duration, viewport.width);
    let minor = major / f64::from(subdivisions);
    let bottom = viewport.y + AXIS_HEIGHT;

    let mut t = (window.start / minor).ceil() * minor;
    while t <= window.end {
        let x = viewport.x + (t - window.start) * x_scale;
        let is_major = is_aligned(t, major);
        let tick = if is_major {
            MAJOR_TICK_HEIGHT
        } else {
            MINOR_TICK_HEIGHT
        };

        commands.push(RenderCommand::DrawLine {
            from: Point::new(x, bottom - tick),
            to: Point::new(x, bottom),
            color: ThemeToken::AxisText,
            width: if is_major { 1.0 } else { 0.5 },
            style: LineStyle::Solid,
        });

        if is_major {
            commands.push(RenderCommand::DrawText {
                position: Point::new(x + 3.0, viewport.y + LABEL_Y - 6.0),
                text: format_clock(t),
                color: ThemeToken::AxisText,
                font_size: FONT_SIZE,
                align: TextAlign::Left,
            });

            if grid_height > 0.0 {
                commands.push(RenderCommand::DrawLine {
                    from: Point::new(x, bottom),
                    to: Point::new(x, bottom + grid_height),
                    color: ThemeToken::GridLine,
                    width: 0.5,
                    style: LineStyle::Solid,
                });
            }
        }
        t += minor;
    }

    commands
}

fn is_aligned(minute: f64, interval: f64) -> bool {
    let offset = minute / interval;
    (offset - offset.round()).abs() < 0.001
}

/// Pick a major tick interval in minutes so that ticks land roughly every
/// `MIN_MAJOR_SPACING_PX` pixels. Returns `(major_minutes, subdivisions)`.
fn nice_interval(duration_min: f64, width_px: f64) -> (f64, u32) {
    let target_count = (width_px / MIN_MAJOR_SPACING_PX).max(2.0);
    let raw = duration_min / target_count;

    let nice: &[(f64, u32)] = &[
        (1.0, 1),
        (2.0, 2),
        (5.0, 5),
        (10.0, 2),
        (15.0, 3),
        (30.0, 2),
        (60.0, 4),
        (120.0, 4),
        (180.0, 3),
        (360.0, 6),
        (720.0, 4),
    ];

    for &(interval, subs) in nice {
        if interval >= raw {
            return (interval, subs);
        }
    }
    (MINUTES_PER_DAY, 4)
}

/// Session minutes as a wall-clock `HH:MM`.
pub fn format_clock(minute: f64) -> String {
    let total = minute.round().rem_euclid(MINUTES_PER_DAY) as u32;
    format!("{:02}:{:02}", total / 60, total % 60)
}
