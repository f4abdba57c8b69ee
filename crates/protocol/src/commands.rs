use serde::{Deserialize, Serialize};

use crate::theme::ThemeToken;
use crate::types::{Point, Rect};

/// A single, stateless render instruction.
///
/// Chart views emit a `Vec<RenderCommand>`; renderers (SVG, terminal) consume
/// the list in order. Each command carries everything it needs to be drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Draw a filled rectangle.
    DrawRect {
        rect: Rect,
        color: ThemeToken,
        border_color: Option<ThemeToken>,
    },

    /// Draw a text string at a position.
    DrawText {
        position: Point,
        text: String,
        color: ThemeToken,
        font_size: f64,
        align: TextAlign,
    },

    /// Draw a line segment.
    DrawLine {
        from: Point,
        to: Point,
        color: ThemeToken,
        width: f64,
        style: LineStyle,
    },

    /// Draw connected line segments through `points`.
    DrawPolyline {
        points: Vec<Point>,
        color: ThemeToken,
        width: f64,
    },

    /// Fill the region between `points` and the horizontal line at `baseline_y`.
    FillArea {
        points: Vec<Point>,
        baseline_y: f64,
        color: ThemeToken,
    },

    /// Draw a small filled circle (a data point marker).
    DrawPoint {
        center: Point,
        radius: f64,
        color: ThemeToken,
    },

    /// Restrict subsequent drawing to a rectangular region.
    SetClip { rect: Rect },

    /// Remove the active clip region.
    ClearClip,

    /// Begin a logical group (one chart, the marker overlay, ...).
    BeginGroup { id: String, label: Option<String> },

    /// End the current group.
    EndGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStyle {
    Solid,
    Dashed,
}
