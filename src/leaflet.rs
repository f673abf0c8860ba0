//! Leaflet renderer.
//!
//! [`LeafletPage`] records what the pipeline draws and renders it as a
//! standalone HTML page that loads Leaflet from a CDN. Map data is embedded
//! as a JSON literal, never spliced into script text.

use std::io::Write;

use serde::Serialize;

use crate::errors::QuakemapError;
use crate::map::{ControlPosition, LatLng, MapWidget, PopupFn, StyleFn, TileLayer, DEFAULT_ZOOM};
use crate::models::EarthquakeFeature;
use crate::popup::escape_html;
use crate::style::MarkerStyle;

/// A circle marker placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    pub style: MarkerStyle,
    pub popup: String,
}

/// A legend control.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendControl {
    pub position: &'static str,
    pub html: String,
}

#[derive(Serialize)]
struct TileData<'a> {
    url: &'a str,
    attribution: &'a str,
}

/// Everything the page script needs, serialized as one JSON object.
#[derive(Serialize)]
struct PageData<'a> {
    center: [f64; 2],
    zoom: u8,
    tiles: Vec<TileData<'a>>,
    markers: Vec<Marker>,
    legend: Option<&'a LegendControl>,
}

/// An HTML page backed by Leaflet.
#[derive(Debug, Clone, Default)]
pub struct LeafletPage {
    title: String,
    subtitle: Option<String>,
    view: Option<(LatLng, u8)>,
    tiles: Vec<TileLayer>,
    markers: Vec<Marker>,
    legend: Option<LegendControl>,
}

impl LeafletPage {
    /// Create an empty page.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Replace the page title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Set a line of text shown under the title.
    pub fn set_subtitle(&mut self, subtitle: impl Into<String>) {
        self.subtitle = Some(subtitle.into());
    }

    /// Markers drawn so far.
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Render the page to HTML.
    ///
    /// # Errors
    ///
    /// Returns an error if the map data cannot be serialized.
    pub fn render(&self) -> Result<String, QuakemapError> {
        let (center, zoom) = self.view.unwrap_or((LatLng::default(), DEFAULT_ZOOM));

        let data = PageData {
            center: [center.lat, center.lon],
            zoom,
            tiles: self
                .tiles
                .iter()
                .map(|t| TileData {
                    url: &t.url_template,
                    attribution: &t.attribution,
                })
                .collect(),
            markers: self
                .markers
                .iter()
                .cloned()
                .map(|mut m| {
                    // Leaflet cannot draw a negative radius
                    m.style.radius = m.style.radius.max(0.0);
                    m
                })
                .collect(),
            legend: self.legend.as_ref(),
        };

        let json = script_safe(&serde_json::to_string(&data)?);
        let subtitle = self
            .subtitle
            .as_deref()
            .map(|s| format!(r#"<p class="subtitle">{}</p>"#, escape_html(s)))
            .unwrap_or_default();

        Ok(PAGE_TEMPLATE
            .replace("{{title}}", &escape_html(&self.title))
            .replace("{{subtitle}}", &subtitle)
            .replace("{{data}}", &json))
    }

    /// Render the page and write it out.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), QuakemapError> {
        let html = self.render()?;
        writer.write_all(html.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

impl MapWidget for LeafletPage {
    fn set_view(&mut self, center: LatLng, zoom: u8) {
        self.view = Some((center, zoom));
    }

    fn add_tile_layer(&mut self, layer: &TileLayer) {
        self.tiles.push(layer.clone());
    }

    fn add_geojson_layer(
        &mut self,
        features: &[EarthquakeFeature],
        style: StyleFn<'_>,
        popup: PopupFn<'_>,
    ) {
        self.markers.extend(features.iter().map(|quake| Marker {
            lat: quake.latitude,
            lon: quake.longitude,
            style: style(quake),
            popup: popup(quake),
        }));
    }

    fn add_legend(&mut self, position: ControlPosition, content: &dyn Fn() -> String) {
        self.legend = Some(LegendControl {
            position: position.as_str(),
            html: content(),
        });
    }
}

/// Keep embedded JSON from closing the surrounding `<script>` element.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

const PAGE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{title}}</title>

    <!-- Leaflet -->
    <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
    <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>

    <style>
        html, body { margin: 0; height: 100%; font-family: sans-serif; }
        header { padding: 8px 16px; background: #1f2937; color: #f9fafb; }
        header h1 { margin: 0; font-size: 18px; }
        header .subtitle { margin: 2px 0 0; font-size: 12px; color: #9ca3af; }
        #map { position: absolute; top: 56px; bottom: 0; left: 0; right: 0; }
        .info.legend {
            background: rgba(255, 255, 255, 0.9);
            padding: 6px 8px;
            line-height: 18px;
            color: #374151;
            border-radius: 4px;
            box-shadow: 0 0 15px rgba(0, 0, 0, 0.2);
        }
        .legend i {
            width: 18px;
            height: 18px;
            float: left;
            margin-right: 8px;
            opacity: 0.8;
        }
    </style>
</head>
<body>
    <header>
        <h1>{{title}}</h1>
        {{subtitle}}
    </header>
    <div id="map"></div>

    <script>
        const data = {{data}};
        const map = L.map('map').setView(data.center, data.zoom);

        data.tiles.forEach(function (t) {
            L.tileLayer(t.url, { attribution: t.attribution }).addTo(map);
        });

        data.markers.forEach(function (m) {
            L.circleMarker([m.lat, m.lon], m.style).bindPopup(m.popup).addTo(map);
        });

        if (data.legend) {
            const legend = L.control({ position: data.legend.position });
            legend.onAdd = function () {
                const div = L.DomUtil.create('div', 'info legend');
                div.innerHTML = data.legend.html;
                return div;
            };
            legend.addTo(map);
        }
    </script>
</body>
</html>
"##;
