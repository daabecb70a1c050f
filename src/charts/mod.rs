//! # Charts
//!
//! Pure geometry for the dashboard's inline charts plus minimal SVG markup.
//! Nothing here allocates global state; identical inputs give bit-identical
//! output.

pub mod bar;
pub mod line;
pub mod sparkline;

pub use bar::{render_bar_series, Bar, BarLayout, BarSeries, DAY_LABELS};
pub use line::{render_line_series, render_line_series_with, LineLayout, LinePoint, LineSeries};
pub use sparkline::{render_sparkline, Direction, SparkPoint, Sparkline};

/// Sum of the key's character codes.
pub fn seed(key: &str) -> u64 {
    key.chars().map(|c| c as u64).sum()
}

/// Stateless hash of `(seed, index)` into `[0, 1)`.
pub fn pseudo_random(seed: u64, index: usize) -> f64 {
    let x = ((seed as f64) * 12.9898 + (index as f64 + 1.0) * 78.233).sin() * 43_758.545_3;
    let r = x - x.floor();
    // guards the rounding edge where a tiny negative x yields exactly 1.0
    if (0.0..1.0).contains(&r) {
        r
    } else {
        0.0
    }
}

/// Compact coordinate formatting for SVG path data (max two decimals).
pub(crate) fn fmt_num(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Opening `<svg>` tag plus an optional escaped accessible title.
pub(crate) fn svg_open(attrs: &str, title: Option<&str>) -> String {
    let mut out = format!(r#"<svg xmlns="http://www.w3.org/2000/svg" {attrs} role="img">"#);
    if let Some(t) = title {
        out.push_str("<title>");
        out.push_str(&html_escape::encode_text(t));
        out.push_str("</title>");
    }
    out
}

/// `(min, max, range)` with a zero range replaced by 1.
pub(crate) fn min_max_range(values: &[f64]) -> Option<(f64, f64, f64)> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return None;
    }
    let range = max - min;
    Some((min, max, if range == 0.0 { 1.0 } else { range }))
}
