use anyhow::Context;
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::fs::File;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod geojson;
pub mod models;
pub mod ports;
pub mod predict;
pub mod scoring;
pub mod store;
pub mod week;

use config::*;
use error::ApiError;
use models::*;
use ports::*;
use store::PredictionStore;

#[derive(Clone)]
pub struct AppState {
    pub store: PredictionStore,
    pub ports: Arc<PortRegistry>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, ports: PortRegistry) -> Self {
        Self {
            store: PredictionStore::new(&config.predictions_dir),
            ports: Arc::new(ports),
            config: Arc::new(config),
        }
    }

    /// Build state from configuration, reading the port registry from
    /// `PORTS_FILE` when one is configured.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let ports = match &config.ports_file {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("failed to open port registry {}", path.display()))?;
                PortRegistry::from_csv(file, &config.default_port)
                    .with_context(|| format!("invalid port registry {}", path.display()))?
            }
            None => PortRegistry::peru()
                .with_default(&config.default_port)
                .context("DEFAULT_PORT is not a built-in port")?,
        };

        Ok(Self::new(config, ports))
    }
}

pub fn create_app(state: AppState) -> Router {
    // The export directory doubles as the static `/predictions` path the
    // map layer fetches raw files from.
    let exports = ServeDir::new(state.store.root());

    Router::new()
        .route("/api/predict", get(predict_hotspots))
        .route("/api/predictions/hotspots", get(get_weekly_hotspots))
        .route("/api/ports", get(list_ports))
        .route("/health", get(health_check))
        .nest_service("/predictions", exports)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[derive(Deserialize)]
struct PredictQuery {
    week: Option<String>,
    port: Option<String>,
    lam: Option<String>,
}

// Empty query values count as absent.
fn param_or<'a>(value: &'a Option<String>, fallback: &'a str) -> &'a str {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback)
}

async fn predict_hotspots(
    Query(query): Query<PredictQuery>,
    State(state): State<AppState>,
) -> Result<Json<PredictResponse>, ApiError> {
    let config = &state.config;
    let week = param_or(&query.week, &config.default_week);
    let port = param_or(&query.port, &config.default_port);
    let lam = config.scoring.effective_decay(query.lam.as_deref());

    let response = predict::assemble(
        &state.store,
        &state.ports,
        config.scoring.top_k,
        week,
        port,
        lam,
    )
    .await?;

    Ok(Json(response))
}

#[derive(Deserialize)]
struct HotspotsQuery {
    week: Option<String>,
}

async fn get_weekly_hotspots(
    Query(query): Query<HotspotsQuery>,
    State(state): State<AppState>,
) -> Result<Json<HotspotsResponse>, ApiError> {
    let response = predict::weekly_hotspots(
        &state.store,
        query.week.as_deref(),
        &state.config.default_week,
    )
    .await?;

    Ok(Json(response))
}

async fn list_ports(State(state): State<AppState>) -> Json<PortsResponse> {
    Json(state.ports.to_response())
}
