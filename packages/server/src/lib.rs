#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the Alaska fire map dashboard.
//!
//! Loads the borough boundaries once, opens the fire detection store
//! (`PostGIS`, or a `GeoJSON` file for offline use), and serves the REST
//! API plus the frontend static files. Range changes go through a single
//! shared [`Dashboard`] whose sequence guard keeps the table and point
//! overlay in step with the latest selection.

pub mod config;
mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use fire_map_dashboard::Dashboard;
use fire_map_dashboard::controller::DateRangeController;
use fire_map_database::StoreError;
use fire_map_database::store::{FireStore, PostgisFireStore};
use fire_map_database_models::CalendarBounds;
use fire_map_geography::{BoundaryError, BoundaryStore};
use fire_map_spatial::{MemoryFireStore, SpatialError};

use crate::config::{Config, ConfigError, StoreBackend};

/// Errors that stop the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The store could not be opened or queried.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The borough boundaries could not be loaded or encoded.
    #[error(transparent)]
    Boundary(#[from] BoundaryError),

    /// The offline detections file could not be loaded.
    #[error(transparent)]
    Detections(#[from] SpatialError),

    /// The HTTP listener failed.
    #[error("HTTP server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared application state.
pub struct AppState {
    /// Controller and displayed results.
    pub dashboard: Dashboard,
    /// Fire detection store for the stateless endpoints.
    pub store: Arc<dyn FireStore>,
    /// Date window the stateless endpoints accept.
    pub calendar: CalendarBounds,
    /// Borough boundaries loaded at startup.
    pub boundaries: BoundaryStore,
    /// [`BoundaryStore::encode`] output, computed once.
    pub encoded_boundaries: Vec<u8>,
}

impl AppState {
    /// Builds the state from already-opened resources.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Boundary`] if the boundaries cannot be
    /// encoded.
    pub fn new(
        config: &Config,
        boundaries: BoundaryStore,
        store: Arc<dyn FireStore>,
    ) -> Result<Self, ServerError> {
        let encoded_boundaries = boundaries.encode()?;
        log::info!(
            "Encoded {} boroughs into {} bytes",
            boundaries.boroughs().len(),
            encoded_boundaries.len()
        );

        let calendar = config.calendar.bounds();
        let controller = DateRangeController::with_selection(
            calendar,
            config.calendar.default_start,
            config.calendar.default_end,
        );

        Ok(Self {
            dashboard: Dashboard::new(store.clone(), controller),
            store,
            calendar,
            boundaries,
            encoded_boundaries,
        })
    }
}

/// Loads the configured borough boundaries.
///
/// # Errors
///
/// Returns [`ServerError::Boundary`] if the file is missing or invalid.
pub fn load_boundaries(config: &Config) -> Result<BoundaryStore, ServerError> {
    log::info!("Loading borough boundaries...");
    Ok(BoundaryStore::load(
        &config.boundaries.path,
        &config.boundaries.name_property,
    )?)
}

/// Opens the configured fire detection store.
///
/// # Errors
///
/// Returns [`ServerError`] if the connection fails or the detections file
/// cannot be loaded.
pub async fn open_store(
    config: &Config,
    boundaries: &BoundaryStore,
) -> Result<Arc<dyn FireStore>, ServerError> {
    match config.store.backend {
        StoreBackend::Postgis => {
            log::info!("Connecting to database...");
            let store = PostgisFireStore::connect(
                &config.store.connection,
                config.store.schema.clone(),
            )
            .await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Geojson => {
            log::info!(
                "Loading fire detections from {}",
                config.store.detections_path.display()
            );
            let store = MemoryFireStore::from_file(
                boundaries.boroughs(),
                &config.store.detections_path,
                &config.store.observed_at_property,
            )?;
            Ok(Arc::new(store))
        }
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/boroughs", web::get().to(handlers::boroughs))
            .route("/boroughs.geojson", web::get().to(handlers::boroughs_geojson))
            .route("/counts", web::get().to(handlers::counts))
            .route("/points", web::get().to(handlers::points))
            .route("/view", web::get().to(handlers::view))
            .route("/range", web::post().to(handlers::range))
            .route("/interact/click", web::post().to(handlers::click))
            .route("/interact/hover", web::post().to(handlers::hover))
            .route("/interact/bounds", web::post().to(handlers::bounds))
            .route("/draw", web::post().to(handlers::draw)),
    );
}

/// Starts the fire map API server.
///
/// Loads the boundaries, opens the store, runs the queries for the default
/// range, and starts the Actix-Web HTTP server. The caller provides the
/// async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if the boundaries or store cannot be opened, or
/// the HTTP server fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: Config) -> Result<(), ServerError> {
    let boundaries = load_boundaries(&config)?;
    let store = open_store(&config, &boundaries).await?;
    let state = AppState::new(&config, boundaries, store)?;

    let initial = state.dashboard.refresh().await;
    if let Some(error) = &initial.error {
        log::warn!("Initial range query failed: {error}");
    }

    let state = web::Data::new(state);
    let static_dir = config.server.static_dir.clone();
    let bind_addr = config.server.bind_addr.clone();
    let port = config.server.port;

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
            // Serve frontend static files (production)
            .service(Files::new("/", static_dir.clone()).index_file("index.html"))
    })
    .bind((bind_addr, port))?
    .run()
    .await?;

    Ok(())
}
