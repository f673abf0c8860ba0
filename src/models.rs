//! Data models for the USGS earthquake GeoJSON feed.
//!
//! The feed structures are deliberately lenient: only the collection type is
//! required, so one malformed event never rejects the whole document. Nulls
//! and wrongly typed values inside a feature read as absent.
//! [`EarthquakeFeature`] is the validated view the map pipeline works with.

use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::errors::QuakemapError;

/// Top-level GeoJSON response from USGS feeds.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    /// Always "FeatureCollection"
    #[serde(rename = "type")]
    pub type_: String,

    /// Feed metadata
    #[serde(default, deserialize_with = "lenient")]
    pub metadata: Option<Metadata>,

    /// Earthquake events
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Validate the response structure.
    pub fn validate(&self) -> Result<(), QuakemapError> {
        if self.type_ != "FeatureCollection" {
            return Err(QuakemapError::InvalidResponse(format!(
                "expected type 'FeatureCollection', got '{}'",
                self.type_
            )));
        }
        Ok(())
    }

    /// When the feed was generated, if the metadata says so.
    #[must_use]
    pub fn generated(&self) -> Option<DateTime<Utc>> {
        let millis = self.metadata.as_ref()?.generated?;
        Utc.timestamp_millis_opt(millis).single()
    }

    /// Feed title from the metadata.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.metadata.as_ref()?.title.as_deref()
    }
}

/// Metadata about the feed response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Metadata {
    /// When this feed was generated (ms since epoch)
    #[serde(default, deserialize_with = "lenient_i64")]
    pub generated: Option<i64>,

    /// Human-readable title
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,

    /// Number of events in response
    #[serde(default, deserialize_with = "lenient")]
    pub count: Option<usize>,
}

/// A single earthquake event as it appears in the feed.
#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    /// Unique event ID
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,

    /// Geographic location
    #[serde(default, deserialize_with = "lenient")]
    pub geometry: Option<Geometry>,

    /// Event properties; `null` reads as empty
    #[serde(default, deserialize_with = "lenient")]
    pub properties: Properties,
}

impl Feature {
    /// Event ID, or a placeholder for logging when the feed omits it.
    #[must_use]
    pub fn id_or_unknown(&self) -> &str {
        self.id.as_deref().unwrap_or("<unknown>")
    }

    /// Coordinate at `index` of `[longitude, latitude, depth_km]`.
    fn coordinate(&self, index: usize) -> Option<f64> {
        self.geometry.as_ref()?.coordinates.get(index).copied().flatten()
    }

    /// Event time as a `DateTime<Utc>`.
    #[must_use]
    pub fn time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.properties.time?).single()
    }
}

/// Geographic geometry for an event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Geometry {
    /// Coordinates: [longitude, latitude, depth_km]; non-numbers read as `None`
    #[serde(default, deserialize_with = "lenient_coordinates")]
    pub coordinates: Vec<Option<f64>>,
}

/// Event properties used for mapping.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Properties {
    /// Magnitude value
    #[serde(default, deserialize_with = "lenient_f64")]
    pub mag: Option<f64>,

    /// Human-readable place description
    #[serde(default, deserialize_with = "lenient_string")]
    pub place: Option<String>,

    /// Event time (ms since epoch)
    #[serde(default, deserialize_with = "lenient_i64")]
    pub time: Option<i64>,
}

/// Deserialize `T`, falling back to its default when the value has the
/// wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_f64())
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_i64())
}

fn lenient_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

fn lenient_coordinates<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<Option<f64>>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Array(values) => Ok(values.iter().map(Value::as_f64).collect()),
        _ => Ok(Vec::new()),
    }
}

/// A feed event with every field the map needs.
///
/// Built once from a [`Feature`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct EarthquakeFeature {
    pub place: String,
    pub magnitude: f64,
    /// Depth in kilometers (positive down)
    pub depth: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Origin time, when the feed reports one
    pub time: Option<DateTime<Utc>>,
}

impl TryFrom<&Feature> for EarthquakeFeature {
    type Error = QuakemapError;

    fn try_from(feature: &Feature) -> Result<Self, Self::Error> {
        let invalid = |reason: &str| QuakemapError::InvalidFeature {
            id: feature.id_or_unknown().to_string(),
            reason: reason.to_string(),
        };

        let place = feature
            .properties
            .place
            .clone()
            .ok_or_else(|| invalid("missing place"))?;
        let magnitude = feature
            .properties
            .mag
            .ok_or_else(|| invalid("missing magnitude"))?;
        let longitude = feature
            .coordinate(0)
            .ok_or_else(|| invalid("missing longitude"))?;
        let latitude = feature
            .coordinate(1)
            .ok_or_else(|| invalid("missing latitude"))?;
        let depth = feature
            .coordinate(2)
            .ok_or_else(|| invalid("missing depth"))?;

        if ![magnitude, depth, latitude, longitude]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(invalid("non-finite numeric field"));
        }

        Ok(Self {
            place,
            magnitude,
            depth,
            latitude,
            longitude,
            time: feature.time(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_feed() -> FeatureCollection {
        let json = include_str!("../tools/sample_feed.json");
        serde_json::from_str(json).expect("failed to parse sample feed")
    }

    #[test]
    fn test_parse_sample_feed() {
        let feed = sample_feed();

        feed.validate().expect("invalid feed");
        assert_eq!(feed.features.len(), 7);
        assert_eq!(feed.title(), Some("USGS All Earthquakes, Past Week"));
        assert!(feed.generated().is_some());
    }

    #[test]
    fn test_rejects_wrong_collection_type() {
        let feed: FeatureCollection =
            serde_json::from_str(r#"{"type": "Feature", "features": []}"#).unwrap();
        assert!(matches!(
            feed.validate(),
            Err(QuakemapError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_earthquake_feature_from_complete_event() {
        let feed = sample_feed();
        let quake = EarthquakeFeature::try_from(&feed.features[0]).unwrap();

        assert_eq!(quake.place, "10km NE of Nowhere, CA");
        assert!((quake.magnitude - 4.2).abs() < f64::EPSILON);
        assert!((quake.depth - 12.0).abs() < f64::EPSILON);
        assert!((quake.latitude - 37.5).abs() < f64::EPSILON);
        assert!((quake.longitude - (-121.9)).abs() < f64::EPSILON);

        let time = quake.time.unwrap();
        assert_eq!(time.timestamp_millis(), 1_760_798_000_000);
        assert_eq!(time.format("%Y-%m-%d %H:%M:%S").to_string(), "2025-10-18 14:33:20");
    }

    #[test]
    fn test_earthquake_feature_missing_fields() {
        let feed = sample_feed();

        // Null magnitude
        let err = EarthquakeFeature::try_from(&feed.features[2]).unwrap_err();
        assert!(err.to_string().contains("missing magnitude"));

        // Only two coordinates
        let err = EarthquakeFeature::try_from(&feed.features[3]).unwrap_err();
        assert!(err.to_string().contains("missing depth"));
    }

    #[test]
    fn test_malformed_values_do_not_reject_the_document() {
        let feed = sample_feed();

        // Null depth coordinate
        assert_eq!(feed.features[4].geometry.as_ref().unwrap().coordinates.len(), 3);
        let err = EarthquakeFeature::try_from(&feed.features[4]).unwrap_err();
        assert!(err.to_string().contains("missing depth"));

        // Null properties
        assert!(feed.features[5].properties.place.is_none());
        let err = EarthquakeFeature::try_from(&feed.features[5]).unwrap_err();
        assert!(err.to_string().contains("missing place"));

        // String magnitude
        assert!(feed.features[6].properties.mag.is_none());
        let err = EarthquakeFeature::try_from(&feed.features[6]).unwrap_err();
        assert!(err.to_string().contains("missing magnitude"));
    }

    #[test]
    fn test_wrongly_typed_feature_members() {
        let json = r#"{
            "type": "FeatureCollection",
            "metadata": null,
            "features": [
                {"id": 7, "properties": "oops", "geometry": {"coordinates": "x"}},
                {"properties": {"place": "ok", "mag": 1.0, "time": "soon"},
                 "geometry": {"coordinates": [1.0, 2.0, 3.0]}}
            ]
        }"#;
        let feed: FeatureCollection = serde_json::from_str(json).unwrap();

        assert!(feed.metadata.is_none());
        assert!(feed.features[0].id.is_none());
        assert!(feed.features[0].geometry.as_ref().unwrap().coordinates.is_empty());

        let quake = EarthquakeFeature::try_from(&feed.features[1]).unwrap();
        assert!(quake.time.is_none());
    }
}
