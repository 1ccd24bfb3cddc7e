use hotspot_forecast_backend::{config::AppConfig, create_app, AppState};
use std::env;

#[shuttle_runtime::main]
async fn main(
    #[shuttle_runtime::Secrets] secrets: shuttle_runtime::SecretStore,
) -> shuttle_axum::ShuttleAxum {
    dotenvy::dotenv().ok();

    // Secrets win over the local environment.
    let config = AppConfig::from_lookup(|key| secrets.get(key).or_else(|| env::var(key).ok()))
        .map_err(anyhow::Error::from)?;

    let state = AppState::from_config(config)?;
    tracing::info!(
        predictions_dir = %state.store.root().display(),
        default_port = %state.ports.default_port().name,
        "hotspot forecast backend ready"
    );

    let app = create_app(state);

    Ok(app.into())
}
