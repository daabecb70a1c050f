//! Sparkline: axis-less trend line in a 0–100 square, with one bit of UI
//! state (the hovered point). Zero-range input is drawn flat at mid-height
//! (y = 50), matching the benchmark line chart.

use serde::Serialize;

use super::{fmt_num, min_max_range, svg_open};

/// Drawn when there is nothing to normalize.
pub const FLAT_PATH: &str = "M0,50 L100,50";

const POSITIVE_COLOR: &str = "rgb(34, 197, 94)";
const NEGATIVE_COLOR: &str = "rgb(244, 63, 94)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    pub fn color(self) -> &'static str {
        match self {
            Direction::Positive => POSITIVE_COLOR,
            Direction::Negative => NEGATIVE_COLOR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SparkPoint {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sparkline {
    pub points: Vec<SparkPoint>,
    pub path: String,
    pub area: String,
    pub direction: Direction,
    hovered: Option<usize>,
}

pub fn render_sparkline(data: &[f64]) -> Sparkline {
    let direction = match (data.first(), data.last()) {
        (Some(first), Some(last)) if last < first => Direction::Negative,
        _ => Direction::Positive,
    };

    let points: Vec<SparkPoint> = match (data.len(), min_max_range(data)) {
        (0, _) | (_, None) => Vec::new(),
        (1, _) => vec![SparkPoint {
            x: 50.0,
            y: 50.0,
            value: data[0],
        }],
        (n, Some((min, max, range))) => data
            .iter()
            .enumerate()
            .map(|(i, &value)| SparkPoint {
                x: i as f64 / (n - 1) as f64 * 100.0,
                y: if max == min {
                    50.0
                } else {
                    100.0 - (value - min) / range * 100.0
                },
                value,
            })
            .collect(),
    };

    let (path, area) = if points.len() < 2 {
        let area = if points.is_empty() {
            String::new()
        } else {
            format!("M0,100 L{FLAT_PATH_BODY} L100,100 Z")
        };
        (FLAT_PATH.to_string(), area)
    } else {
        let line = points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                format!(
                    "{}{},{}",
                    if i == 0 { 'M' } else { 'L' },
                    fmt_num(p.x),
                    fmt_num(p.y)
                )
            })
            .collect::<Vec<_>>()
            .join(" ");
        let body = line.trim_start_matches('M');
        (line.clone(), format!("M0,100 L{body} L100,100 Z"))
    };

    Sparkline {
        points,
        path,
        area,
        direction,
        hovered: None,
    }
}

/// `FLAT_PATH` without its leading move-to.
const FLAT_PATH_BODY: &str = "0,50 L100,50";

impl Sparkline {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Pointer entered the hit region of point `index`; out-of-range is ignored.
    pub fn hover(&mut self, index: usize) {
        if index < self.points.len() {
            self.hovered = Some(index);
        }
    }

    /// Pointer left the chart.
    pub fn leave(&mut self) {
        self.hovered = None;
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    /// `(index, original value)` of the hovered point.
    pub fn tooltip(&self) -> Option<(usize, f64)> {
        let i = self.hovered?;
        self.points.get(i).map(|p| (i, p.value))
    }

    pub fn to_svg(&self, title: Option<&str>) -> String {
        let color = self.direction.color();
        let mut out = svg_open(r#"viewBox="0 0 100 100" preserveAspectRatio="none""#, title);
        if !self.area.is_empty() {
            out.push_str(&format!(
                r#"<path d="{}" fill="{color}" fill-opacity="0.2"/>"#,
                self.area
            ));
        }
        out.push_str(&format!(
            r#"<path d="{}" fill="none" stroke="{color}" stroke-width="1.5" stroke-linecap="round" stroke-linejoin="round"/>"#,
            self.path
        ));
        for (i, p) in self.points.iter().enumerate() {
            let r = if self.hovered == Some(i) { 3 } else { 0 };
            out.push_str(&format!(
                r#"<circle data-index="{i}" cx="{}" cy="{}" r="{r}" fill="{color}"><title>{:.1}</title></circle>"#,
                fmt_num(p.x),
                fmt_num(p.y),
                p.value
            ));
        }
        out.push_str("</svg>");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_into_unit_square() {
        let s = render_sparkline(&[15.0, 18.0, 22.0, 26.0, 30.0, 32.0, 32.0]);
        assert_eq!(s.points[0].x, 0.0);
        assert_eq!(s.points[6].x, 100.0);
        assert_eq!(s.points[0].y, 100.0);
        assert_eq!(s.points[5].y, 0.0);
        assert_eq!(s.direction, Direction::Positive);
        assert!(s.area.starts_with("M0,100 L0,100 "));
        assert!(s.area.ends_with(" L100,100 Z"));
    }

    #[test]
    fn falling_series_is_negative() {
        let s = render_sparkline(&[40.0, 35.0, 30.0]);
        assert_eq!(s.direction, Direction::Negative);
        assert!(s.to_svg(None).contains(NEGATIVE_COLOR));
    }

    #[test]
    fn equal_endpoints_count_as_positive() {
        assert_eq!(render_sparkline(&[5.0, 1.0, 5.0]).direction, Direction::Positive);
    }

    #[test]
    fn flat_series_sits_mid_height() {
        let s = render_sparkline(&[7.0, 7.0, 7.0]);
        assert!(s.points.iter().all(|p| p.y == 50.0));
    }

    #[test]
    fn hover_state_tracks_pointer() {
        let mut s = render_sparkline(&[1.0, 2.0, 3.0]);
        assert_eq!(s.tooltip(), None);
        s.hover(1);
        assert_eq!(s.tooltip(), Some((1, 2.0)));
        assert!(s.to_svg(None).contains(r#"data-index="1" cx="50" cy="50" r="3""#));
        s.hover(99);
        assert_eq!(s.hovered(), Some(1));
        s.leave();
        assert_eq!(s.hovered(), None);
    }
}
