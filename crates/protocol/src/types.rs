use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
}

/// The area a view renders into, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }
}

pub const MINUTES_PER_DAY: f64 = 1440.0;

/// Minutes since midnight.
pub fn minute_of_day(time: NaiveTime) -> f64 {
    f64::from(time.num_seconds_from_midnight()) / 60.0
}

/// Minutes since midnight of the session's first day, the unit of every
/// horizontal axis. `day` counts midnights crossed since the first record.
pub fn session_minute(day: u32, time: NaiveTime) -> f64 {
    f64::from(day) * MINUTES_PER_DAY + minute_of_day(time)
}

/// Horizontal window of a chart, in session minutes (see [`session_minute`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    /// Window between two times of day. An `end` earlier than `start` falls
    /// on the next day.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        let start = minute_of_day(start);
        let mut end = minute_of_day(end);
        if end < start {
            end += MINUTES_PER_DAY;
        }
        Self { start, end }
    }

    pub fn from_minutes(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, minute: f64) -> bool {
        minute >= self.start && minute <= self.end
    }

    /// Map a session minute onto `[0, width]`.
    pub fn x_for(&self, minute: f64, width: f64) -> f64 {
        let duration = self.duration();
        if duration <= 0.0 {
            return width / 2.0;
        }
        (minute - self.start) * width / duration
    }
}
