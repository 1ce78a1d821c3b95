//! Postdoc Application Tracker
//!
//! Keeps a list of postdoc job applications in memory and serves it to the
//! view layer over a local REST API. Data survives a restart only through
//! JSON export and import.

mod api;
mod auth;
mod config;
mod errors;
mod models;
mod tracker;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use tracker::Tracker;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<Mutex<Tracker>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            tracker: Arc::new(Mutex::new(Tracker::default())),
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(env_filter);
    if config.json_logs {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Postdoc Application Tracker");
    tracing::info!("Export directory: {:?}", config.export_dir);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (TRACKER_API_PSK). Authentication is disabled!");
    }

    let state = AppState::new(config.clone());

    // Seed from an earlier export, if one was given
    if let Some(path) = &config.import_path {
        match api::import_file(&state, path).await {
            Ok(summary) => tracing::info!("Loaded {:?}: {}", path, summary.message),
            Err(e) => tracing::error!("Could not load {:?}: {}", path, e),
        }
    }

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.api_psk.clone();

    let api_routes = Router::new()
        // Datastore
        .route("/datastore", get(api::get_datastore))
        .route("/datastore/revision", get(api::get_revision))
        // Applications
        .route("/applications", get(api::list_applications))
        .route("/applications", post(api::create_application))
        .route("/applications/{id}", get(api::get_application))
        .route("/applications/{id}", put(api::update_application))
        .route("/applications/{id}", delete(api::delete_application))
        .route("/applications/{id}/toggle", post(api::toggle_item))
        .route("/stats", get(api::get_stats))
        // Settings
        .route("/settings", get(api::get_settings))
        .route("/settings/custom-fields", post(api::add_custom_field))
        .route("/settings/custom-fields/{id}", delete(api::remove_custom_field))
        .route("/settings/custom-checklists", post(api::add_custom_checklist))
        .route(
            "/settings/custom-checklists/{id}",
            delete(api::remove_custom_checklist),
        )
        .route("/settings/{list}", post(api::add_registry_entry))
        .route("/settings/{list}/{index}", put(api::rename_registry_entry))
        .route("/settings/{list}/{index}", delete(api::remove_registry_entry))
        // Import / export
        .route("/import", post(api::import_document))
        .route("/export", get(api::export_document))
        .route("/export/save", post(api::save_export))
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
