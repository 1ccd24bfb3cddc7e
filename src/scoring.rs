use crate::models::{GeoPoint, HotspotSummary, ScoredPoint};
use crate::ports::Port;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Probability subtracted per kilometre from port when `lam` is not given.
    pub default_decay: f64,
    pub top_k: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            default_decay: 0.02,
            top_k: 10,
        }
    }
}

impl ScoringConfig {
    /// Decay to use for a raw `lam` query value.
    ///
    /// Missing or unreadable values fall back to the default; negative values
    /// are floored at zero so a point can never gain score by being far away.
    pub fn effective_decay(&self, raw: Option<&str>) -> f64 {
        match raw.map(str::trim).filter(|s| !s.is_empty()).map(str::parse::<f64>) {
            Some(Ok(lam)) if lam.is_finite() => lam.max(0.0),
            _ => self.default_decay,
        }
    }
}

/// Great-circle distance in kilometres between two WGS84 coordinates.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push `a` just past 1 for antipodal points.
    let a = a.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

pub fn composite_score(raw_probability: f64, distance_km: f64, decay: f64) -> f64 {
    let score = raw_probability - decay * distance_km;
    if !score.is_finite() {
        return 0.0;
    }
    score.clamp(0.0, 1.0) + 0.0
}

/// RGBA for map layers: red rises and blue falls with the score.
pub fn display_color(score: f64) -> [u8; 4] {
    [
        (255.0 * score).round() as u8,
        50,
        (200.0 * (1.0 - score)).round() as u8,
        200,
    ]
}

pub fn score_point(point: GeoPoint, port: &Port, decay: f64) -> ScoredPoint {
    let distance_km = haversine_km(port.latitude, port.longitude, point.latitude, point.longitude);
    let score = composite_score(point.raw_probability, distance_km, decay);

    ScoredPoint {
        point,
        distance_km,
        score,
        display_color: display_color(score),
    }
}

/// Annotate every point with its distance to `port` and a composite score.
/// Output order and length match the input.
pub fn score_points(points: Vec<GeoPoint>, port: &Port, decay: f64) -> Vec<ScoredPoint> {
    points
        .into_iter()
        .map(|point| score_point(point, port, decay))
        .collect()
}

/// Summaries of the `k` best points, highest score first.
///
/// The sort is stable, so equal scores keep their input order.
pub fn rank_top(scored: &[ScoredPoint], k: usize) -> Vec<HotspotSummary> {
    let mut ranked: Vec<&ScoredPoint> = scored.iter().collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

    ranked.into_iter().take(k).map(ScoredPoint::summary).collect()
}
