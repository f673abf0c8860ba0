//! Depth legend.
//!
//! The legend is derived once from fixed band bounds and shared read-only
//! for the life of the process.

use std::sync::LazyLock;

use serde::Serialize;

use crate::style::{DepthBand, depth_color};

/// Lower bounds (km) of the depth bands, ascending.
pub const LEGEND_BOUNDS: [f64; 4] = [
    DepthBand::Shallow.lower_bound(),
    DepthBand::Intermediate.lower_bound(),
    DepthBand::Deep.lower_bound(),
    DepthBand::VeryDeep.lower_bound(),
];

/// Offset from a band's lower edge to a depth strictly inside it.
const BAND_SAMPLE_OFFSET: f64 = 1.0;

static LEGEND: LazyLock<Vec<LegendEntry>> = LazyLock::new(|| build_legend(&LEGEND_BOUNDS));

/// One legend row: a depth range and its marker color.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub lower_bound: f64,
    /// `None` for the open-ended deepest band
    pub upper_bound: Option<f64>,
    pub color: &'static str,
}

impl LegendEntry {
    /// Range label: `"10–30"`, or `"50+"` for the open band.
    #[must_use]
    pub fn label(&self) -> String {
        match self.upper_bound {
            Some(upper) => format!("{}–{}", self.lower_bound, upper),
            None => format!("{}+", self.lower_bound),
        }
    }
}

/// Build legend entries from ascending lower bounds.
///
/// Each entry takes the color of a depth just inside its band.
#[must_use]
pub fn build_legend(bounds: &[f64]) -> Vec<LegendEntry> {
    bounds
        .iter()
        .enumerate()
        .map(|(i, &lower_bound)| LegendEntry {
            lower_bound,
            upper_bound: bounds.get(i + 1).copied(),
            color: depth_color(lower_bound + BAND_SAMPLE_OFFSET),
        })
        .collect()
}

/// The process-wide depth legend.
#[must_use]
pub fn legend() -> &'static [LegendEntry] {
    &LEGEND
}

/// Legend control body: one color swatch and range label per line.
#[must_use]
pub fn legend_html(entries: &[LegendEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            let label = match entry.upper_bound {
                Some(upper) => format!("{}&ndash;{}<br>", entry.lower_bound, upper),
                None => format!("{}+", entry.lower_bound),
            };
            format!(r#"<i style="background:{}"></i> {label}"#, entry.color)
        })
        .collect()
}

/// Plain-text legend for the terminal.
#[must_use]
pub fn legend_table(entries: &[LegendEntry]) -> String {
    let rows: String = entries
        .iter()
        .map(|entry| format!("{:<10}  {}\n", entry.label(), entry.color))
        .collect();
    format!("Depth (km)  Color\n{rows}")
}
