use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::geojson::{point_coordinates, FeatureCollection};

/// Property keys written by the scorer; anything else is passed through.
pub const SCORER_KEYS: [&str; 4] = ["p", "dist_km", "score", "color"];

#[derive(Debug, Clone, PartialEq)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub raw_probability: f64, // always within 0..=1
    pub extra_properties: Map<String, Value>,
    /// Every feature member except `properties`, geometry included as read.
    pub feature_members: Map<String, Value>,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64, raw_probability: f64) -> Self {
        Self {
            longitude,
            latitude,
            raw_probability,
            extra_properties: Map::new(),
            feature_members: Map::new(),
        }
    }

    /// Read a point from a raw export feature. A feature without a usable
    /// longitude and latitude is handed back unchanged.
    pub fn from_feature(feature: Value) -> Result<Self, Value> {
        let Some((longitude, latitude)) = point_coordinates(&feature) else {
            return Err(feature);
        };
        let mut members = match feature {
            Value::Object(members) => members,
            other => return Err(other),
        };

        let mut properties = match members.remove("properties") {
            Some(Value::Object(properties)) => properties,
            _ => Map::new(),
        };
        let raw_probability = coerce_probability(properties.get("p"));
        properties.retain(|key, _| !SCORER_KEYS.contains(&key.as_str()));

        Ok(Self {
            longitude,
            latitude,
            raw_probability,
            extra_properties: properties,
            feature_members: members,
        })
    }
}

/// Read a probability the way the export's consumers always have: numbers and
/// numeric strings are accepted, everything else counts as 0, and the result
/// is clamped to `0..=1`.
pub fn coerce_probability(value: Option<&Value>) -> f64 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match raw {
        // `+ 0.0` turns -0.0 into 0.0.
        Some(p) if p.is_finite() => p.clamp(0.0, 1.0) + 0.0,
        _ => 0.0,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    pub point: GeoPoint,
    pub distance_km: f64,
    pub score: f64,
    pub display_color: [u8; 4],
}

impl ScoredPoint {
    pub fn summary(&self) -> HotspotSummary {
        HotspotSummary {
            lat: self.point.latitude,
            lon: self.point.longitude,
            p: self.point.raw_probability,
            score: self.score,
            dist_km: self.distance_km,
        }
    }

    /// The source feature with the scorer's output merged into its
    /// properties.
    pub fn to_feature(&self) -> Value {
        let mut properties = self.point.extra_properties.clone();
        properties.insert("p".into(), Value::from(self.point.raw_probability));
        properties.insert("dist_km".into(), Value::from(self.distance_km));
        properties.insert("score".into(), Value::from(self.score));
        properties.insert("color".into(), Value::from(self.display_color.to_vec()));

        let mut feature = self.point.feature_members.clone();
        feature
            .entry("type")
            .or_insert_with(|| Value::from("Feature"));
        feature.entry("geometry").or_insert_with(|| {
            json!({ "type": "Point", "coordinates": [self.point.longitude, self.point.latitude] })
        });
        feature.insert("properties".into(), Value::Object(properties));

        Value::Object(feature)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotSummary {
    pub lat: f64,
    pub lon: f64,
    pub p: f64,
    pub score: f64,
    pub dist_km: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub week: String,
    pub port: String,
    pub lam: f64,
    pub top10: Vec<HotspotSummary>,
    pub geojson: FeatureCollection,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotsResponse {
    pub week: String,
    /// The export exactly as written, or an empty collection.
    pub data: Value,
    pub available_weeks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PortEntry {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PortsResponse {
    pub default: String,
    pub ports: Vec<PortEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(properties: Value) -> Value {
        json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [-77.15, -12.06] },
            "properties": properties
        })
    }

    fn probability_of(properties: Value) -> f64 {
        GeoPoint::from_feature(feature(properties)).unwrap().raw_probability
    }

    #[test]
    fn probability_is_clamped_on_ingestion() {
        assert_eq!(probability_of(json!({ "p": 1.7 })), 1.0);
        assert_eq!(probability_of(json!({ "p": -0.3 })), 0.0);
        assert_eq!(probability_of(json!({ "p": 0.42 })), 0.42);
    }

    #[test]
    fn negative_zero_probability_is_plain_zero() {
        let p = probability_of(json!({ "p": -0.0 }));
        assert_eq!(p, 0.0);
        assert!(p.is_sign_positive());
    }

    #[test]
    fn missing_or_garbage_probability_is_zero() {
        assert_eq!(probability_of(json!({})), 0.0);
        assert_eq!(probability_of(json!({ "p": null })), 0.0);
        assert_eq!(probability_of(json!({ "p": "high" })), 0.0);
        assert_eq!(probability_of(json!({ "p": [0.5] })), 0.0);
        assert_eq!(probability_of(json!({ "p": " 0.25 " })), 0.25);
        assert_eq!(probability_of(Value::Null), 0.0);
    }

    #[test]
    fn extra_properties_pass_through_without_scorer_keys() {
        let point = GeoPoint::from_feature(feature(json!({
            "p": 0.5,
            "score": 0.99,
            "sst": 18.2
        })))
        .unwrap();

        assert_eq!(point.extra_properties.len(), 1);
        assert_eq!(point.extra_properties["sst"], json!(18.2));
    }

    #[test]
    fn feature_without_coordinates_is_handed_back() {
        let raw = json!({ "type": "Feature", "id": 3, "geometry": null, "properties": { "p": 0.9 } });
        assert_eq!(GeoPoint::from_feature(raw.clone()), Err(raw));
    }

    #[test]
    fn annotated_feature_carries_scorer_output() {
        let scored = ScoredPoint {
            point: GeoPoint::from_feature(feature(json!({ "p": 0.5, "sst": 18.2 }))).unwrap(),
            distance_km: 12.5,
            score: 0.25,
            display_color: [64, 50, 150, 200],
        };

        let value = scored.to_feature();
        assert_eq!(value["type"], json!("Feature"));
        assert_eq!(value["geometry"]["coordinates"], json!([-77.15, -12.06]));
        assert_eq!(value["properties"]["sst"], json!(18.2));
        assert_eq!(value["properties"]["p"], json!(0.5));
        assert_eq!(value["properties"]["dist_km"], json!(12.5));
        assert_eq!(value["properties"]["score"], json!(0.25));
        assert_eq!(value["properties"]["color"], json!([64, 50, 150, 200]));

        let summary = serde_json::to_value(scored.summary()).unwrap();
        assert_eq!(
            summary,
            json!({ "lat": -12.06, "lon": -77.15, "p": 0.5, "score": 0.25, "dist_km": 12.5 })
        );
    }

    #[test]
    fn annotated_feature_keeps_id_and_altitude() {
        let raw = json!({
            "type": "Feature",
            "id": "cell-7",
            "geometry": { "type": "Point", "coordinates": [-77.15, -12.06, 5.0] },
            "properties": { "p": 0.5 }
        });
        let scored = ScoredPoint {
            point: GeoPoint::from_feature(raw).unwrap(),
            distance_km: 0.0,
            score: 0.5,
            display_color: [128, 50, 100, 200],
        };

        let value = scored.to_feature();
        assert_eq!(value["id"], json!("cell-7"));
        assert_eq!(value["geometry"]["coordinates"], json!([-77.15, -12.06, 5.0]));
    }

    #[test]
    fn constructed_point_gets_point_geometry() {
        let scored = ScoredPoint {
            point: GeoPoint::new(-80.0, -5.5, 0.3),
            distance_km: 1.0,
            score: 0.28,
            display_color: [71, 50, 144, 200],
        };

        let value = scored.to_feature();
        assert_eq!(value["geometry"], json!({ "type": "Point", "coordinates": [-80.0, -5.5] }));
    }
}
