//! Map widget contract and map configuration.
//!
//! The pipeline draws through [`MapWidget`] and never touches a concrete
//! renderer, so a map value is passed in explicitly by whoever owns it.

use crate::models::EarthquakeFeature;
use crate::style::MarkerStyle;

/// Default OpenStreetMap tile URL template.
pub const OSM_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Attribution required by the OpenStreetMap tile servers.
pub const OSM_ATTRIBUTION: &str =
    r#"&copy; <a href="https://www.openstreetmap.org/copyright">OpenStreetMap</a> contributors"#;

/// Default zoom: the whole world.
pub const DEFAULT_ZOOM: u8 = 2;

/// Maximum zoom accepted on the command line.
pub const MAX_ZOOM: u8 = 19;

/// A geographic point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatLng {
    pub lat: f64,
    pub lon: f64,
}

impl std::str::FromStr for LatLng {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 2 {
            return Err(format!(
                "center requires 2 values (lat,lon), got {}",
                parts.len()
            ));
        }

        let vals: Result<Vec<f64>, _> = parts.iter().map(|p| p.trim().parse::<f64>()).collect();
        let vals = vals.map_err(|e| format!("invalid number in center: {e}"))?;

        let point = Self {
            lat: vals[0],
            lon: vals[1],
        };

        if !(-90.0..=90.0).contains(&point.lat) {
            return Err(format!("latitude {} out of range [-90, 90]", point.lat));
        }
        if !(-180.0..=180.0).contains(&point.lon) {
            return Err(format!("longitude {} out of range [-180, 180]", point.lon));
        }

        Ok(point)
    }
}

/// Corner of the map a control is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

impl ControlPosition {
    /// Leaflet's name for this position.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TopLeft => "topleft",
            Self::TopRight => "topright",
            Self::BottomLeft => "bottomleft",
            Self::BottomRight => "bottomright",
        }
    }
}

impl std::str::FromStr for ControlPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "topleft" => Ok(Self::TopLeft),
            "topright" => Ok(Self::TopRight),
            "bottomleft" => Ok(Self::BottomLeft),
            "bottomright" => Ok(Self::BottomRight),
            _ => Err(format!(
                "unknown position: {s} (expected: topleft, topright, bottomleft, bottomright)"
            )),
        }
    }
}

/// When the legend is added relative to the feed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegendPolicy {
    /// Only once the feed has been fetched and drawn
    #[default]
    OnSuccess,
    /// Regardless of the fetch outcome
    Always,
}

impl std::str::FromStr for LegendPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "on-success" | "on_success" => Ok(Self::OnSuccess),
            "always" => Ok(Self::Always),
            _ => Err(format!("unknown legend policy: {s} (expected: on-success, always)")),
        }
    }
}

/// Background tile layer.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    /// URL template with `{s}`, `{z}`, `{x}`, `{y}` placeholders
    pub url_template: String,
    /// Attribution markup shown in the map corner
    pub attribution: String,
}

impl Default for TileLayer {
    fn default() -> Self {
        Self {
            url_template: OSM_TILE_URL.to_string(),
            attribution: OSM_ATTRIBUTION.to_string(),
        }
    }
}

/// Map setup and legend placement.
#[derive(Debug, Clone, Default)]
pub struct MapConfig {
    pub center: LatLng,
    pub zoom: u8,
    pub tiles: TileLayer,
    pub legend_position: ControlPosition,
    pub legend_policy: LegendPolicy,
}

impl MapConfig {
    /// World view with OpenStreetMap tiles and a bottom-right legend.
    #[must_use]
    pub fn world() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            ..Self::default()
        }
    }
}

/// Per-feature marker style callback.
pub type StyleFn<'a> = &'a dyn Fn(&EarthquakeFeature) -> MarkerStyle;

/// Per-feature popup callback.
pub type PopupFn<'a> = &'a dyn Fn(&EarthquakeFeature) -> String;

/// The operations the pipeline needs from a map.
pub trait MapWidget {
    /// Center the map and set its zoom level.
    fn set_view(&mut self, center: LatLng, zoom: u8);

    /// Add a background tile layer.
    fn add_tile_layer(&mut self, layer: &TileLayer);

    /// Add one circle marker per feature, styled and bound to a popup by
    /// the given callbacks.
    fn add_geojson_layer(
        &mut self,
        features: &[EarthquakeFeature],
        style: StyleFn<'_>,
        popup: PopupFn<'_>,
    );

    /// Add a legend control whose body is produced by `content`.
    fn add_legend(&mut self, position: ControlPosition, content: &dyn Fn() -> String);
}
