// tests/charts.rs
//
// Chart geometry through the public API: determinism and degenerate inputs.

use market_intel_dashboard::charts::{
    render_bar_series, render_line_series, render_sparkline, sparkline::FLAT_PATH, Direction,
};

#[test]
fn bar_series_is_bit_identical_across_renders() {
    let a = render_bar_series("AI marketing automation", 247.3);
    let b = render_bar_series("AI marketing automation", 247.3);

    assert_eq!(a.bars.len(), 7);
    for (x, y) in a.bars.iter().zip(&b.bars) {
        assert_eq!(x.day_label, y.day_label);
        assert_eq!(x.raw_value.to_bits(), y.raw_value.to_bits());
        assert_eq!(x.height.to_bits(), y.height.to_bits());
    }
    assert_eq!(a.to_svg(None), b.to_svg(None));
}

#[test]
fn bar_series_differs_per_term() {
    let a = render_bar_series("AI marketing automation", 247.3);
    let b = render_bar_series("marketing attribution", 247.3);
    assert!(a
        .bars
        .iter()
        .zip(&b.bars)
        .any(|(x, y)| x.raw_value != y.raw_value));
}

#[test]
fn bar_series_follows_growth() {
    let s = render_bar_series("AI marketing automation", 247.3);
    // Day 0 is at most BASE+15%, day 6 at least 85% of BASE*3.473.
    assert!(s.bars[6].raw_value > s.bars[0].raw_value);
    assert!(s.max_value() >= s.bars[6].raw_value);
}

#[test]
fn bar_svg_escapes_title() {
    let svg = render_bar_series("R&D <tools>", 10.0).to_svg(Some("R&D <tools>"));
    assert!(svg.contains("<title>R&amp;D &lt;tools&gt;</title>"));
}

#[test]
fn flat_line_series_stays_finite() {
    let s = render_line_series(&[10.0, 10.0, 10.0]);
    assert_eq!(s.points.len(), 3);
    for p in &s.points {
        assert!(p.x.is_finite() && p.y.is_finite());
        assert_eq!(p.y, 32.5, "flat series sits at mid-plot height");
    }
    assert!(!s.path.contains("NaN"));
    assert_eq!(s.path, "M 20 32.5 L 100 32.5 L 180 32.5");
}

#[test]
fn flat_line_and_flat_sparkline_share_mid_height() {
    let line = render_line_series(&[7.0, 7.0]);
    let spark = render_sparkline(&[7.0, 7.0]);
    let layout = line.layout;
    let line_mid = (line.points[0].y - layout.padding_top) / (layout.height - layout.padding_top);
    let spark_mid = spark.points[0].y / 100.0;
    assert_eq!(line_mid, 0.5);
    assert_eq!(spark_mid, 0.5);
}

#[test]
fn empty_sparkline_draws_flat_line_without_points() {
    let s = render_sparkline(&[]);
    assert!(s.points.is_empty());
    assert_eq!(s.path, FLAT_PATH);
    assert!(s.area.is_empty());
    assert_eq!(s.direction, Direction::Positive);
    assert_eq!(s.to_svg(None).matches("<circle").count(), 0);
}

#[test]
fn single_value_sparkline_is_centred() {
    let s = render_sparkline(&[5.0]);
    assert_eq!(s.points.len(), 1);
    assert_eq!((s.points[0].x, s.points[0].y), (50.0, 50.0));
    assert_eq!(s.path, FLAT_PATH);
    assert_eq!(s.area, "M0,100 L0,50 L100,50 L100,100 Z");
}

#[test]
fn sparkline_hover_and_leave() {
    let mut s = render_sparkline(&[24.0, 23.5, 22.0, 21.0]);
    assert_eq!(s.direction, Direction::Negative);

    s.hover(3);
    assert_eq!(s.tooltip(), Some((3, 21.0)));
    assert_eq!(s.to_svg(None).matches(r#"r="3""#).count(), 1);

    s.leave();
    assert_eq!(s.tooltip(), None);
    assert_eq!(s.to_svg(None).matches(r#"r="3""#).count(), 0);
}
