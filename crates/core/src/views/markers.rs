use tripchart_protocol::{
    DoseEvent, LineStyle, Point, RenderCommand, TextAlign, ThemeToken, TimeWindow, Viewport,
};

const FONT_SIZE: f64 = 8.0;
const LABEL_OFFSET_Y: f64 = 10.0;
const LABEL_ROW_HEIGHT: f64 = 10.0;
/// Labels closer than this (px) to the previous one move down a row.
const MIN_LABEL_SPACING: f64 = 70.0;
const MAX_LABEL_ROWS: usize = 3;

/// Render dose events as dashed vertical lines spanning the viewport, each
/// annotated with `substance : amount` at its top right.
///
/// Doses logged close together stack their labels on successive rows
/// instead of overprinting each other.
pub fn render_dose_markers(
    doses: &[DoseEvent],
    viewport: &Viewport,
    window: &TimeWindow,
) -> Vec<RenderCommand> {
    if doses.is_empty() || viewport.width <= 0.0 {
        return Vec::new();
    }

    let mut commands = Vec::with_capacity(doses.len() * 2 + 2);
    commands.push(RenderCommand::BeginGroup {
        id: "dose-markers".into(),
        label: Some("Doses".into()),
    });

    let mut last_label_x = f64::NEG_INFINITY;
    let mut row = 0;

    for dose in doses {
        let minute = dose.minute();
        if !window.contains(minute) {
            continue;
        }

        let x = viewport.x + window.x_for(minute, viewport.width);

        commands.push(RenderCommand::DrawLine {
            from: Point::new(x, viewport.y),
            to: Point::new(x, viewport.y + viewport.height),
            color: ThemeToken::DoseLine,
            width: 1.0,
            style: LineStyle::Dashed,
        });

        row = if x - last_label_x < MIN_LABEL_SPACING {
            (row + 1) % MAX_LABEL_ROWS
        } else {
            0
        };
        last_label_x = x;

        commands.push(RenderCommand::DrawText {
            position: Point::new(
                x + 2.0,
                viewport.y + LABEL_OFFSET_Y + row as f64 * LABEL_ROW_HEIGHT,
            ),
            text: dose.label(),
            color: ThemeToken::DoseText,
            font_size: FONT_SIZE,
            align: TextAlign::Left,
        });
    }

    commands.push(RenderCommand::EndGroup);
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn dose(time: NaiveTime, substance: &str, amount: &str) -> DoseEvent {
        DoseEvent {
            time,
            day: 0,
            substance: substance.into(),
            amount: amount.into(),
        }
    }

    fn texts(cmds: &[RenderCommand]) -> Vec<(&str, Point)> {
        cmds.iter()
            .filter_map(|c| match c {
                RenderCommand::DrawText { text, position, .. } => Some((text.as_str(), *position)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn one_line_and_label_per_dose() {
        let doses = [
            dose(at(10, 15), "MDMA", "100"),
            dose(at(12, 0), "MDMA", "50"),
        ];
        let vp = Viewport::new(600.0, 300.0);
        let window = TimeWindow::new(at(10, 0), at(13, 0));
        let cmds = render_dose_markers(&doses, &vp, &window);

        let lines: Vec<_> = cmds
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    RenderCommand::DrawLine {
                        style: LineStyle::Dashed,
                        ..
                    }
                )
            })
            .collect();
        assert_eq!(lines.len(), 2);

        let labels = texts(&cmds);
        assert_eq!(labels[0].0, "MDMA : 100mg");
        // 10:15 is 15 of 180 minutes into the window.
        assert!((labels[0].1.x - (50.0 + 2.0)).abs() < 1e-9);
    }

    #[test]
    fn close_labels_stack() {
        let doses = [
            dose(at(10, 0), "MDMA", "100"),
            dose(at(10, 1), "Cannabis", "1 joint"),
        ];
        let vp = Viewport::new(600.0, 300.0);
        let window = TimeWindow::new(at(10, 0), at(13, 0));
        let rendered = render_dose_markers(&doses, &vp, &window);
        let labels = texts(&rendered);
        assert_eq!(labels.len(), 2);
        assert!(labels[1].1.y > labels[0].1.y);
    }

    #[test]
    fn markers_respect_viewport_offset() {
        let doses = [dose(at(10, 0), "MDMA", "100")];
        let vp = Viewport {
            x: 20.0,
            y: 100.0,
            width: 200.0,
            height: 50.0,
        };
        let window = TimeWindow::new(at(10, 0), at(11, 0));
        let cmds = render_dose_markers(&doses, &vp, &window);
        let line = cmds.iter().find_map(|c| match c {
            RenderCommand::DrawLine { from, to, .. } => Some((*from, *to)),
            _ => None,
        });
        assert_eq!(
            line,
            Some((Point::new(20.0, 100.0), Point::new(20.0, 150.0)))
        );
    }

    #[test]
    fn doses_after_midnight_stay_inside_the_window() {
        let late = DoseEvent {
            day: 1,
            ..dose(at(0, 15), "MDMA", "50")
        };
        let doses = [dose(at(22, 0), "6-APB", "75"), late];
        let vp = Viewport::new(150.0, 100.0);
        let window = TimeWindow::new(at(22, 0), at(0, 30));
        let rendered = render_dose_markers(&doses, &vp, &window);
        let labels = texts(&rendered);
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].0, "6-APB : 75mg");
        assert_eq!(labels[1].0, "MDMA : 50mg");
        // 00:15 is 135 of 150 minutes into the window.
        assert!((labels[1].1.x - (135.0 + 2.0)).abs() < 1e-9);
    }

    #[test]
    fn no_doses_no_commands() {
        let window = TimeWindow::new(at(10, 0), at(11, 0));
        assert!(render_dose_markers(&[], &Viewport::new(100.0, 100.0), &window).is_empty());
    }
}
