//! The subset of GeoJSON the weekly prediction export produces: a
//! `FeatureCollection` of point features whose properties carry a
//! probability `p`.
//!
//! Features stay as raw JSON so one malformed point cannot fail a whole
//! week, and so everything we do not interpret (ids, altitudes, extra
//! members) is written back untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "feature_collection_kind")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn feature_collection_kind() -> String {
    "FeatureCollection".to_string()
}

/// `[longitude, latitude]` of a point feature, from the first two numbers of
/// `geometry.coordinates`. Anything after them (altitude, even `null`) is
/// ignored. `None` when the feature has no finite longitude and latitude.
pub fn point_coordinates(feature: &Value) -> Option<(f64, f64)> {
    let coordinates = feature.get("geometry")?.get("coordinates")?.as_array()?;
    let longitude = coordinates.first()?.as_f64()?;
    let latitude = coordinates.get(1)?.as_f64()?;

    (longitude.is_finite() && latitude.is_finite()).then_some((longitude, latitude))
}
