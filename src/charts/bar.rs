//! Seven-day bar series for a search term.
//!
//! Values are synthesized from the term's growth figure: the expectation rises
//! linearly from `BASE` to `BASE * (1 + growth/100)` over the week, each day
//! gets ±15% seeded noise, and nothing drops below 70% of `BASE`.

use serde::Serialize;

use super::{fmt_num, pseudo_random, seed, svg_open};

pub const DAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

const BASE: f64 = 100.0;
const NOISE: f64 = 0.15;
const FLOOR: f64 = 0.7;
const BAR_WIDTH: f64 = 20.0;
const BAR_GAP: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BarLayout {
    pub min_height: f64,
    pub max_height: f64,
}

impl Default for BarLayout {
    fn default() -> Self {
        Self {
            min_height: 8.0,
            max_height: 64.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub day_label: &'static str,
    pub height: f64,
    pub raw_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    pub bars: Vec<Bar>,
    #[serde(skip)]
    pub layout: BarLayout,
}

pub fn render_bar_series(seed_key: &str, growth_percent: f64) -> BarSeries {
    render_bar_series_with(seed_key, growth_percent, BarLayout::default())
}

pub fn render_bar_series_with(seed_key: &str, growth_percent: f64, layout: BarLayout) -> BarSeries {
    let s = seed(seed_key);
    let growth = if growth_percent.is_finite() {
        growth_percent / 100.0
    } else {
        0.0
    };
    let last = (DAY_LABELS.len() - 1) as f64;

    let values: Vec<f64> = (0..DAY_LABELS.len())
        .map(|i| {
            let expected = BASE * (1.0 + growth * i as f64 / last);
            let noise = (2.0 * pseudo_random(s, i) - 1.0) * NOISE * expected.abs();
            (expected + noise).max(FLOOR * BASE)
        })
        .collect();

    let heights = scale_heights(&values, layout);
    let bars = DAY_LABELS
        .iter()
        .copied()
        .zip(values)
        .zip(heights)
        .map(|((label, raw_value), height)| Bar {
            day_label: label,
            height,
            raw_value,
        })
        .collect();

    BarSeries { bars, layout }
}

/// Scale values into `[min_height, max_height]` against the series maximum.
/// A series whose values are all equal gets a uniform mid-height.
pub fn scale_heights(values: &[f64], layout: BarLayout) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::MIN, f64::max);
    let min = values.iter().copied().fold(f64::MAX, f64::min);
    let span = layout.max_height - layout.min_height;
    if (max - min).abs() < f64::EPSILON || max <= 0.0 {
        return vec![layout.min_height + span / 2.0; values.len()];
    }
    values
        .iter()
        .map(|v| layout.min_height + (v / max) * span)
        .collect()
}

impl BarSeries {
    pub fn max_value(&self) -> f64 {
        self.bars
            .iter()
            .map(|b| b.raw_value)
            .fold(f64::MIN, f64::max)
    }

    pub fn to_svg(&self, title: Option<&str>) -> String {
        let width = self.bars.len() as f64 * (BAR_WIDTH + BAR_GAP) - BAR_GAP;
        let height = self.layout.max_height;
        let mut out = svg_open(
            &format!(
                r#"viewBox="0 0 {w} {h}" width="{w}" height="{h}""#,
                w = fmt_num(width.max(0.0)),
                h = fmt_num(height)
            ),
            title,
        );
        for (i, b) in self.bars.iter().enumerate() {
            let x = i as f64 * (BAR_WIDTH + BAR_GAP);
            out.push_str(&format!(
                r#"<rect x="{}" y="{}" width="{}" height="{}" rx="2"><title>{}: {:.1}</title></rect>"#,
                fmt_num(x),
                fmt_num(height - b.height),
                fmt_num(BAR_WIDTH),
                fmt_num(b.height),
                b.day_label,
                b.raw_value
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
    fn seven_labeled_bars_within_layout() {
        let s = render_bar_series("personalization engine", 156.2);
        let labels: Vec<_> = s.bars.iter().map(|b| b.day_label).collect();
        assert_eq!(labels, DAY_LABELS.to_vec());
        for b in &s.bars {
            assert!(b.height >= 8.0 && b.height <= 64.0, "height {}", b.height);
            assert!(b.raw_value >= 70.0);
        }
        let tallest = s.bars.iter().map(|b| b.height).fold(0.0, f64::max);
        assert_eq!(tallest, 64.0);
    }

    #[test]
    fn strong_growth_ends_higher_than_it_starts() {
        let s = render_bar_series("conversion optimization", 400.0);
        assert!(s.bars[6].raw_value > s.bars[0].raw_value);
    }

    #[test]
    fn collapse_is_floored() {
        let s = render_bar_series("x", -500.0);
        assert!(s.bars.iter().all(|b| b.raw_value >= 70.0));
    }

    #[test]
    fn all_equal_values_get_mid_height() {
        let layout = BarLayout {
            min_height: 10.0,
            max_height: 50.0,
        };
        assert_eq!(scale_heights(&[42.0; 7], layout), vec![30.0; 7]);
        assert!(scale_heights(&[], layout).is_empty());
    }

    #[test]
    fn svg_has_one_rect_and_tooltip_per_day() {
        let svg = render_bar_series("AI marketing automation", 247.3).to_svg(Some("AI marketing automation"));
        assert_eq!(svg.matches("<rect").count(), 7);
        assert!(svg.contains("<title>Sun: "));
    }
}
