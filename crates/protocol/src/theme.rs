use serde::{Deserialize, Serialize};

/// Semantic color tokens resolved by the renderer's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    /// Line/marker color of the n-th chart, cycling through the palette.
    Series(u8),
    /// Translucent fill under the n-th chart's curve.
    SeriesFill(u8),

    ChartBackground,
    ChartBorder,
    GridLine,

    DoseLine,
    DoseText,

    AxisText,
    TextPrimary,
    TextMuted,

    Background,
}

/// Number of distinct series colors before the palette repeats.
pub const SERIES_PALETTE_LEN: u8 = 24;

impl ThemeToken {
    /// Series color for the chart at `index` in display order.
    pub fn series(index: usize) -> Self {
        Self::Series((index % SERIES_PALETTE_LEN as usize) as u8)
    }

    pub fn series_fill(index: usize) -> Self {
        Self::SeriesFill((index % SERIES_PALETTE_LEN as usize) as u8)
    }
}

/// The 24-color qualitative palette series colors are drawn from, as RGB.
pub const SERIES_PALETTE: [(u8, u8, u8); SERIES_PALETTE_LEN as usize] = [
    (0xFD, 0x32, 0x16),
    (0x00, 0xFE, 0x35),
    (0x6A, 0x76, 0xFC),
    (0xFE, 0xD4, 0xC4),
    (0xFE, 0x00, 0xCE),
    (0x0D, 0xF9, 0xFF),
    (0xF6, 0xF9, 0x26),
    (0xFF, 0x96, 0x16),
    (0x47, 0x9B, 0x55),
    (0xEE, 0xA6, 0xFB),
    (0xDC, 0x58, 0x7D),
    (0xD6, 0x26, 0xFF),
    (0x6E, 0x89, 0x9C),
    (0x00, 0xB5, 0xF7),
    (0xB6, 0x8E, 0x00),
    (0xC9, 0xFB, 0xE5),
    (0xFF, 0x00, 0x92),
    (0x22, 0xFF, 0xA7),
    (0xE3, 0xEE, 0x9E),
    (0x86, 0xCE, 0x00),
    (0xBC, 0x71, 0x96),
    (0x7E, 0x7D, 0xCD),
    (0xFC, 0x65, 0x65),
    (0xC7, 0x5D, 0xAB),
];
