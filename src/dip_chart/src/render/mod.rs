//! What a chart view needs from the bar store, without any drawing.
//!
//! [`SeriesProjection::project`] maps the series onto a viewport: x is
//! linear in bar index, y is linear in close price between the series'
//! min and max close (inverted, so higher prices sit higher). Hover maps a
//! pixel offset back to the nearest index. [`label_indices`] picks evenly
//! spaced bars for axis labels.

pub mod format;
pub mod labels;

use std::fmt::Write as _;

use crate::models::{bar::Bar, range::LabelMode};

use self::{format::sign, labels::format_label};

/// Number of x-axis labels a chart shows.
pub const AXIS_LABEL_COUNT: usize = 5;
pub const TOOLTIP_WIDTH: f64 = 88.0;
pub const TOOLTIP_HEIGHT: f64 = 44.0;
/// Minimum distance between the tooltip and the viewport edge.
pub const TOOLTIP_MARGIN: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// One bar placed on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedBar {
    pub x: f64,
    pub y: f64,
    pub timestamp: i64,
    pub close: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesProjection {
    viewport: Viewport,
    min_close: f64,
    max_close: f64,
    points: Vec<ProjectedBar>,
}

impl SeriesProjection {
    /// Projects `bars` onto `viewport`.
    ///
    /// Returns `None` when nothing can be drawn: a non-positive width or
    /// fewer than two bars. A flat series is drawn along the bottom edge.
    pub fn project(bars: &[Bar], viewport: Viewport) -> Option<Self> {
        if !(viewport.width > 0.0) || bars.len() < 2 {
            return None;
        }

        let (min_close, max_close) = bars
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), bar| {
                (lo.min(bar.close), hi.max(bar.close))
            });
        let span = match max_close - min_close {
            s if s == 0.0 => 1.0,
            s => s,
        };
        let last = (bars.len() - 1) as f64;

        let points = bars
            .iter()
            .enumerate()
            .map(|(index, bar)| ProjectedBar {
                x: index as f64 / last * viewport.width,
                y: viewport.height - (bar.close - min_close) / span * viewport.height,
                timestamp: bar.timestamp,
                close: bar.close,
            })
            .collect();

        Some(Self {
            viewport,
            min_close,
            max_close,
            points,
        })
    }

    pub fn points(&self) -> &[ProjectedBar] {
        &self.points
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn min_close(&self) -> f64 {
        self.min_close
    }

    pub fn max_close(&self) -> f64 {
        self.max_close
    }

    /// Polyline points, `"x,y x,y ..."` with two decimals.
    pub fn line_points(&self) -> String {
        join_points(self.points.iter().map(|p| Point { x: p.x, y: p.y }))
    }

    /// The line closed down to the bottom edge, for a filled area.
    pub fn area_points(&self) -> String {
        let bottom = self.viewport.height;
        let first_x = self.points.first().map_or(0.0, |p| p.x);
        let last_x = self.points.last().map_or(self.viewport.width, |p| p.x);
        join_points(
            self.points
                .iter()
                .map(|p| Point { x: p.x, y: p.y })
                .chain([
                    Point {
                        x: last_x,
                        y: bottom,
                    },
                    Point {
                        x: first_x,
                        y: bottom,
                    },
                ]),
        )
    }

    /// Nearest bar index for horizontal offset `x`, clamped to the series.
    pub fn hover_index(&self, x: f64) -> usize {
        let ratio = (clamp(x, 0.0, self.viewport.width) / self.viewport.width).clamp(0.0, 1.0);
        let last = self.points.len() - 1;
        ((ratio * last as f64).round() as usize).min(last)
    }

    /// Hover details for offset `x`, with labels in `mode`.
    pub fn hover(&self, x: f64, mode: LabelMode) -> HoverState {
        let index = self.hover_index(x);
        let point = self.points[index];
        let Viewport { width, height } = self.viewport;

        let tooltip = Point {
            x: clamp(
                point.x - TOOLTIP_WIDTH / 2.0,
                TOOLTIP_MARGIN,
                (width - TOOLTIP_WIDTH).max(TOOLTIP_MARGIN),
            ),
            y: clamp(
                point.y - TOOLTIP_HEIGHT,
                TOOLTIP_MARGIN,
                (height - TOOLTIP_HEIGHT).max(TOOLTIP_MARGIN),
            ),
        };

        HoverState {
            index,
            point,
            tooltip,
            time_label: format_label(point.timestamp, mode),
            price_label: format!("{:.2}", point.close),
        }
    }
}

/// The bar under the pointer and where its tooltip goes.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverState {
    pub index: usize,
    pub point: ProjectedBar,
    /// Top-left corner of the tooltip box.
    pub tooltip: Point,
    pub time_label: String,
    pub price_label: String,
}

/// Up to `count` evenly spaced indices over `0..len`, always including the
/// first and last. Empty for `len <= 1`.
pub fn label_indices(len: usize, count: usize) -> Vec<usize> {
    if len <= 1 || count == 0 {
        return Vec::new();
    }
    if len <= count {
        return (0..len).collect();
    }

    let mut indices = vec![0, len - 1];
    if count > 2 {
        let step = (len - 1) as f64 / (count - 1) as f64;
        indices.extend((1..count - 1).map(|i| (step * i as f64).round() as usize));
    }
    indices.sort_unstable();
    indices.dedup();
    indices
}

/// Axis label text for `bars` in `mode`.
pub fn axis_labels(bars: &[Bar], mode: LabelMode) -> Vec<String> {
    if mode == LabelMode::None {
        return Vec::new();
    }
    label_indices(bars.len(), AXIS_LABEL_COUNT)
        .into_iter()
        .map(|i| format_label(bars[i].timestamp, mode))
        .collect()
}

/// Change from the first to the last close of a series.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeInfo {
    pub delta: f64,
    pub percent: f64,
    /// e.g. `+1.25 (+2.50%)`
    pub text: String,
}

impl ChangeInfo {
    /// `None` with fewer than two bars or a zero first close.
    pub fn from_bars(bars: &[Bar]) -> Option<Self> {
        let [first, .., last] = bars else {
            return None;
        };
        if first.close == 0.0 {
            return None;
        }

        let delta = last.close - first.close;
        let percent = delta / first.close * 100.0;
        let text = format!("{s}{delta:.2} ({s}{percent:.2}%)", s = sign(delta));
        Some(Self {
            delta,
            percent,
            text,
        })
    }

    pub fn is_negative(&self) -> bool {
        self.delta < 0.0
    }
}

fn join_points(points: impl Iterator<Item = Point>) -> String {
    let mut out = String::new();
    for (i, p) in points.enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{:.2},{:.2}", p.x, p.y);
    }
    out
}

fn clamp(value: f64, min: f64, max: f64) -> f64 {
    max.min(min.max(value))
}
