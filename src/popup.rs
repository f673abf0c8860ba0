//! Popup markup for earthquake markers.

use crate::models::EarthquakeFeature;

/// Build the popup shown when a marker is clicked.
///
/// Magnitude and depth are written with their shortest decimal form, so the
/// feed's `4.2` and `12` come out unchanged. The place name comes from the
/// feed and is escaped before being placed in markup.
#[must_use]
pub fn format_popup(quake: &EarthquakeFeature) -> String {
    format!(
        "<h3>{}</h3><hr><p>Magnitude: {}</p><p>Depth: {}</p>",
        escape_html(&quake.place),
        quake.magnitude,
        quake.depth
    )
}

/// Escape text for use inside HTML elements and quoted attributes.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
