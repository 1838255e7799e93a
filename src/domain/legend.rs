use crate::domain::style::ColorToken;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendInterval {
    pub lower_bound: f64,
    pub color: ColorToken,
}

/// Depth legend, lower bounds in km. Each color matches what
/// [`depth_color`](crate::domain::style::depth_color) returns above that bound.
pub const DEPTH_LEGEND: [LegendInterval; 6] = [
    LegendInterval { lower_bound: -10.0, color: ColorToken::Green },
    LegendInterval { lower_bound: 10.0, color: ColorToken::Lime },
    LegendInterval { lower_bound: 30.0, color: ColorToken::Amber },
    LegendInterval { lower_bound: 50.0, color: ColorToken::Orange },
    LegendInterval { lower_bound: 70.0, color: ColorToken::RedOrange },
    LegendInterval { lower_bound: 90.0, color: ColorToken::Red },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendLabel {
    pub color: ColorToken,
    pub label: String,
}

pub fn legend_labels(intervals: &[LegendInterval]) -> Vec<LegendLabel> {
    intervals
        .iter()
        .enumerate()
        .map(|(i, interval)| {
            let label = match intervals.get(i + 1) {
                Some(next) => format!("{}\u{2013}{}", interval.lower_bound, next.lower_bound),
                None => format!("{}+", interval.lower_bound),
            };
            LegendLabel {
                color: interval.color,
                label,
            }
        })
        .collect()
}

/// Inner HTML of the legend widget: one swatch and range per line.
pub fn legend_html(labels: &[LegendLabel]) -> String {
    labels
        .iter()
        .map(|entry| format!("<i style='background: {}'></i> {}", entry.color, entry.label))
        .collect::<Vec<_>>()
        .join("<br>")
}
