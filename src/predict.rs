use crate::error::ApiError;
use crate::geojson::FeatureCollection;
use crate::models::{GeoPoint, HotspotsResponse, PredictResponse, ScoredPoint};
use crate::ports::PortRegistry;
use crate::scoring::{rank_top, score_points};
use crate::store::{PredictionStore, StoreError};
use crate::week::IsoWeek;
use serde_json::json;

pub const WEEK_UNAVAILABLE: &str = "Week data not available";

/// Score and rank one week of hotspots against a port.
///
/// `port` is echoed back as requested even when it falls back to the
/// registry default; `lam` must already be the effective decay.
pub async fn assemble(
    store: &PredictionStore,
    ports: &PortRegistry,
    top_k: usize,
    week: &str,
    port: &str,
    lam: f64,
) -> Result<PredictResponse, ApiError> {
    let not_found = || ApiError::NotFound {
        week: week.to_string(),
    };

    let Ok(iso_week) = week.parse::<IsoWeek>() else {
        tracing::debug!(week, "rejected malformed week");
        return Err(not_found());
    };

    let collection = match store.load_week(iso_week).await {
        Ok(collection) => collection,
        Err(StoreError::NotFound { .. }) => return Err(not_found()),
        Err(e) => {
            // An unreadable export is as good as a missing one to the client.
            tracing::warn!(error = ?e, week, "unusable prediction export");
            return Err(not_found());
        }
    };

    let origin = ports.resolve(port);
    if origin.name != port {
        tracing::debug!(requested = port, fallback = %origin.name, "unknown port");
    }

    // Features without a usable position keep their slot in the collection
    // untouched but are neither scored nor ranked.
    let FeatureCollection { kind, features, extra } = collection;
    let mut points = Vec::with_capacity(features.len());
    let mut slots = Vec::with_capacity(features.len());
    for feature in features {
        match GeoPoint::from_feature(feature) {
            Ok(point) => {
                points.push(point);
                slots.push(None);
            }
            Err(unscored) => slots.push(Some(unscored)),
        }
    }

    let scored = score_points(points, origin, lam);
    let top10 = rank_top(&scored, top_k);

    let skipped = slots.len() - scored.len();
    if skipped > 0 {
        tracing::warn!(week, skipped, "features without usable coordinates");
    }
    tracing::info!(
        week,
        port = %origin.name,
        lam,
        points = scored.len(),
        "ranked hotspots"
    );

    let mut annotated = scored.iter().map(ScoredPoint::to_feature);
    let features = slots
        .into_iter()
        .filter_map(|slot| slot.or_else(|| annotated.next()))
        .collect();

    Ok(PredictResponse {
        week: week.to_string(),
        port: port.to_string(),
        lam,
        top10,
        geojson: FeatureCollection {
            kind,
            features,
            extra,
        },
    })
}

/// The raw export for a week, plus every week that has one.
///
/// Without an explicit week the oldest export is served, falling back to
/// `default_week` when nothing has been exported.
pub async fn weekly_hotspots(
    store: &PredictionStore,
    week: Option<&str>,
    default_week: &str,
) -> Result<HotspotsResponse, ApiError> {
    let available = store.available_weeks().await?;

    let week = match week.map(str::trim).filter(|w| !w.is_empty()) {
        Some(week) => week.to_string(),
        None => available
            .first()
            .map(ToString::to_string)
            .unwrap_or_else(|| default_week.to_string()),
    };

    let loaded = match week.parse::<IsoWeek>() {
        Ok(iso_week) => match store.load_week_raw(iso_week).await {
            Ok(data) => Some(data),
            Err(StoreError::NotFound { .. }) => None,
            Err(e) => {
                tracing::warn!(error = ?e, week = %week, "unusable prediction export");
                None
            }
        },
        Err(e) => {
            tracing::debug!(error = %e, week = %week, "rejected malformed week");
            None
        }
    };

    let error = loaded.is_none().then(|| WEEK_UNAVAILABLE.to_string());
    let data = loaded.unwrap_or_else(|| json!({ "type": "FeatureCollection", "features": [] }));

    Ok(HotspotsResponse {
        week,
        data,
        available_weeks: available.iter().map(ToString::to_string).collect(),
        error,
    })
}
