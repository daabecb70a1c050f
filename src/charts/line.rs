// src/charts/line.rs
use serde::Serialize;

use super::{fmt_num, min_max_range, svg_open};

/// Plot box for a benchmark line. `height` is the baseline; values are drawn
/// between `padding_top` and `height`. A series with zero range (including a
/// single point) sits at mid-plot height, the same convention as sparklines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineLayout {
    pub width: f64,
    pub height: f64,
    pub padding_x: f64,
    pub padding_top: f64,
}

impl Default for LineLayout {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 50.0,
            padding_x: 20.0,
            padding_top: 15.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinePoint {
    pub x: f64,
    pub y: f64,
    /// Unscaled input, for tooltips.
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub points: Vec<LinePoint>,
    /// `M x y L x y …`
    pub path: String,
    /// `path` closed down to the baseline, for fill-under-line.
    pub area: String,
    #[serde(skip)]
    pub layout: LineLayout,
}

pub fn render_line_series(points: &[f64]) -> LineSeries {
    render_line_series_with(points, LineLayout::default())
}

pub fn render_line_series_with(points: &[f64], layout: LineLayout) -> LineSeries {
    let Some((min, max, range)) = min_max_range(points) else {
        return LineSeries {
            points: Vec::new(),
            path: String::new(),
            area: String::new(),
            layout,
        };
    };

    let n = points.len();
    let plot_w = (layout.width - 2.0 * layout.padding_x).max(0.0);
    let plot_h = (layout.height - layout.padding_top).max(0.0);

    let pts: Vec<LinePoint> = points
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let x = if n == 1 {
                layout.width / 2.0
            } else {
                layout.padding_x + plot_w * i as f64 / (n - 1) as f64
            };
            let y = if max == min {
                layout.height - plot_h / 2.0
            } else {
                layout.height - (value - min) / range * plot_h
            };
            LinePoint { x, y, value }
        })
        .collect();

    let path = pts
        .iter()
        .enumerate()
        .map(|(i, p)| {
            format!(
                "{} {} {}",
                if i == 0 { 'M' } else { 'L' },
                fmt_num(p.x),
                fmt_num(p.y)
            )
        })
        .collect::<Vec<_>>()
        .join(" ");

    // pts is non-empty here
    let first = pts[0];
    let last = pts[pts.len() - 1];
    let baseline = fmt_num(layout.height);
    let area = format!(
        "{path} L {} {baseline} L {} {baseline} Z",
        fmt_num(last.x),
        fmt_num(first.x)
    );

    LineSeries {
        points: pts,
        path,
        area,
        layout,
    }
}

impl LineSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Line, fill and hoverable points (value shown via `<title>`).
    pub fn to_svg(&self, title: Option<&str>) -> String {
        let l = self.layout;
        let mut out = svg_open(
            &format!(
                r#"viewBox="0 0 {w} {h}" width="{w}" height="{h}""#,
                w = fmt_num(l.width),
                h = fmt_num(l.height + l.padding_top.min(20.0))
            ),
            title,
        );
        if !self.is_empty() {
            out.push_str(&format!(
                r#"<path d="{}" fill="currentColor" opacity="0.1"/><path d="{}" fill="none" stroke="currentColor" stroke-width="2"/>"#,
                self.area, self.path
            ));
            for p in &self.points {
                out.push_str(&format!(
                    r#"<circle cx="{}" cy="{}" r="3" fill="currentColor"><title>{:.1}%</title></circle>"#,
                    fmt_num(p.x),
                    fmt_num(p.y),
                    p.value
                ));
            }
        }
        out.push_str("</svg>");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_weeks_span_the_padded_width() {
        let s = render_line_series(&[22.0, 24.0, 26.0, 28.0]);
        let xs: Vec<f64> = s.points.iter().map(|p| p.x).collect();
        assert_eq!(xs.first(), Some(&20.0));
        assert_eq!(xs.last(), Some(&180.0));
        assert_eq!(s.points[0].y, 50.0);
        assert_eq!(s.points[3].y, 15.0);
        assert!(s.path.starts_with("M 20 50 L "));
        assert!(s.area.ends_with("L 180 50 L 20 50 Z"));
    }

    #[test]
    fn higher_values_sit_higher() {
        let s = render_line_series(&[15.0, 32.0, 22.0]);
        assert!(s.points[1].y < s.points[2].y);
        assert!(s.points[2].y < s.points[0].y);
        assert_eq!(s.points[1].value, 32.0);
    }

    #[test]
    fn empty_input_yields_empty_series() {
        let s = render_line_series(&[]);
        assert!(s.is_empty() && s.path.is_empty() && s.area.is_empty());
        assert_eq!(s.to_svg(None).matches("<circle").count(), 0);
    }

    #[test]
    fn single_point_is_centred() {
        let s = render_line_series(&[42.0]);
        assert_eq!(s.points[0].x, 100.0);
        assert_eq!(s.path, "M 100 32.5");
    }
}
