//! Marker styling: magnitude scaling and depth classification.
//!
//! Depth bands are half-open ranges `[0,10) [10,30) [30,50) [50,∞)`.
//! A depth sitting exactly on a boundary belongs to the deeper band.

use serde::Serialize;

use crate::models::EarthquakeFeature;

/// Marker radius (pixels) per unit of magnitude.
const RADIUS_PER_MAGNITUDE: f64 = 5.0;

// Circle marker stroke, shared by every marker
const STROKE_COLOR: &str = "#000";
const STROKE_WEIGHT: u32 = 1;
const STROKE_OPACITY: f64 = 1.0;
const FILL_OPACITY: f64 = 0.8;

/// Scale a magnitude to a marker radius.
///
/// Zero and negative magnitudes are passed through unclamped; flooring is
/// left to the renderer.
#[must_use]
pub fn marker_radius(magnitude: f64) -> f64 {
    magnitude * RADIUS_PER_MAGNITUDE
}

/// Depth severity band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthBand {
    /// 0-10 km
    Shallow,
    /// 10-30 km
    Intermediate,
    /// 30-50 km
    Deep,
    /// 50+ km
    VeryDeep,
}

impl DepthBand {
    /// All bands, ordered by ascending lower bound.
    pub const ALL: [DepthBand; 4] = [
        DepthBand::Shallow,
        DepthBand::Intermediate,
        DepthBand::Deep,
        DepthBand::VeryDeep,
    ];

    /// Classify a depth in kilometers.
    ///
    /// Total over all inputs: negative depths fall into [`DepthBand::Shallow`]
    /// like any other depth under 10 km.
    #[must_use]
    pub fn classify(depth_km: f64) -> Self {
        Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|band| depth_km >= band.lower_bound())
            .unwrap_or(Self::Shallow)
    }

    /// Inclusive lower bound of the band (km).
    #[must_use]
    pub const fn lower_bound(self) -> f64 {
        match self {
            Self::Shallow => 0.0,
            Self::Intermediate => 10.0,
            Self::Deep => 30.0,
            Self::VeryDeep => 50.0,
        }
    }

    /// Fill color for markers in this band.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Shallow => "#00FF00",
            Self::Intermediate => "#FFFF00",
            Self::Deep => "#FFA500",
            Self::VeryDeep => "#FF0000",
        }
    }

    /// Color name for terminal output.
    #[must_use]
    pub const fn color_name(self) -> &'static str {
        match self {
            Self::Shallow => "green",
            Self::Intermediate => "yellow",
            Self::Deep => "orange",
            Self::VeryDeep => "red",
        }
    }
}

/// Fill color for a depth in kilometers.
#[must_use]
pub fn depth_color(depth_km: f64) -> &'static str {
    DepthBand::classify(depth_km).color()
}

/// Circle marker options, serialized with Leaflet's option names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerStyle {
    pub radius: f64,
    pub fill_color: &'static str,
    pub color: &'static str,
    pub weight: u32,
    pub opacity: f64,
    pub fill_opacity: f64,
}

impl MarkerStyle {
    /// Style for one earthquake: size from magnitude, fill from depth.
    #[must_use]
    pub fn for_feature(quake: &EarthquakeFeature) -> Self {
        Self {
            radius: marker_radius(quake.magnitude),
            fill_color: depth_color(quake.depth),
            color: STROKE_COLOR,
            weight: STROKE_WEIGHT,
            opacity: STROKE_OPACITY,
            fill_opacity: FILL_OPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_radius() {
        assert!((marker_radius(6.0) - 30.0).abs() < f64::EPSILON);
        assert!((marker_radius(4.2) - 21.0).abs() < 1e-9);
        assert!(marker_radius(0.0).abs() < f64::EPSILON);
        assert!((marker_radius(-1.0) - (-5.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_depth_boundaries() {
        let cases = [
            (9.99, "#00FF00"),
            (10.0, "#FFFF00"),
            (29.99, "#FFFF00"),
            (30.0, "#FFA500"),
            (49.99, "#FFA500"),
            (50.0, "#FF0000"),
            (1000.0, "#FF0000"),
            (-5.0, "#00FF00"),
        ];

        for (depth, expected) in cases {
            assert_eq!(depth_color(depth), expected, "depth {depth}");
        }
    }

    #[test]
    fn test_band_lower_bounds_are_inclusive() {
        for band in DepthBand::ALL {
            assert_eq!(DepthBand::classify(band.lower_bound()), band);
        }
        assert_eq!(DepthBand::classify(-0.5), DepthBand::Shallow);
    }

    #[test]
    fn test_marker_style_for_feature() {
        let quake = EarthquakeFeature {
            place: "X".into(),
            magnitude: 6.0,
            depth: 5.0,
            latitude: 0.0,
            longitude: 0.0,
            time: None,
        };
        let style = MarkerStyle::for_feature(&quake);

        assert!((style.radius - 30.0).abs() < f64::EPSILON);
        assert_eq!(style.fill_color, "#00FF00");
        assert_eq!(style.color, "#000");
        assert_eq!(style.weight, 1);
        assert!((style.fill_opacity - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_marker_style_serializes_leaflet_options() {
        let quake = EarthquakeFeature {
            place: "X".into(),
            magnitude: 2.0,
            depth: 60.0,
            latitude: 0.0,
            longitude: 0.0,
            time: None,
        };
        let json = serde_json::to_value(MarkerStyle::for_feature(&quake)).unwrap();

        assert_eq!(json["fillColor"], "#FF0000");
        assert_eq!(json["fillOpacity"], 0.8);
        assert_eq!(json["radius"], 10.0);
    }
}
