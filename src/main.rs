//! Parts-Quotation Admin Backend
//!
//! REST backend for the auto-body parts quotation admin: vehicles, suppliers,
//! workshops, billing companies and quotations over SQLite, with Tantivy
//! supplier search and CSV supplier import.

mod api;
mod config;
mod contact;
mod db;
mod errors;
mod filter;
mod geo;
mod import;
mod models;
mod search;
mod validation;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use geo::GeoClient;
use search::SupplierIndex;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub search: Arc<SupplierIndex>,
    pub geo: Arc<GeoClient>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting parts-quotation backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Index path: {:?}", config.index_path);
    tracing::info!("Geography service: {}", config.geo_base_url);
    tracing::info!("Bind address: {}", config.bind_addr);

    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    let search = Arc::new(SupplierIndex::open(&config.index_path)?);

    tracing::info!("Building supplier search index...");
    let suppliers = repo.all_suppliers().await?;
    search.rebuild(&suppliers).await?;

    let geo = Arc::new(GeoClient::new(config.geo_base_url.clone())?);

    let state = AppState { repo, search, geo };

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

    let api_routes = Router::new()
        .route("/revision", get(api::get_revision))
        // Vehicles
        .route("/vehicles", get(api::list_vehicles).post(api::create_vehicle))
        .route(
            "/vehicles/{id}",
            get(api::get_vehicle)
                .put(api::update_vehicle)
                .delete(api::delete_vehicle),
        )
        // Suppliers
        .route("/suppliers", get(api::list_suppliers).post(api::create_supplier))
        .route("/suppliers/import", post(api::import_suppliers))
        .route(
            "/suppliers/{id}",
            get(api::get_supplier)
                .put(api::update_supplier)
                .delete(api::delete_supplier),
        )
        .route("/suppliers/{id}/contact-link", get(api::supplier_contact_link))
        // Workshops
        .route("/workshops", get(api::list_workshops).post(api::create_workshop))
        .route(
            "/workshops/{id}",
            get(api::get_workshop)
                .put(api::update_workshop)
                .delete(api::delete_workshop),
        )
        // Billing companies
        .route(
            "/billing-companies",
            get(api::list_billing_companies).post(api::create_billing_company),
        )
        .route(
            "/billing-companies/{id}",
            get(api::get_billing_company)
                .put(api::update_billing_company)
                .delete(api::delete_billing_company),
        )
        // Quotations
        .route(
            "/quotations",
            get(api::list_quotations).post(api::create_quotation),
        )
        .route(
            "/quotations/{id}",
            get(api::get_quotation)
                .put(api::update_quotation)
                .delete(api::delete_quotation),
        )
        .route(
            "/quotations/{id}/suppliers",
            get(api::list_quotation_suppliers).post(api::invite_supplier),
        )
        .route(
            "/quotations/{id}/offers",
            get(api::list_offers).post(api::create_offer),
        )
        // Search
        .route("/search", get(api::search_suppliers))
        // Geography
        .route("/geo/states", get(api::list_states))
        .route("/geo/states/{uf}/cities", get(api::list_cities));

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
