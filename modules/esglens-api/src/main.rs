use std::sync::Arc;

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use mongodb::bson::Document;
use mongodb::Collection;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use esglens_common::config::{ApiConfig, BrokerConfig};
use esglens_store::{AuthStore, CatalogStore, IndicatorStore, ScoreStore};

mod auth;
mod cache;
mod error;
mod routes;

use auth::{JwtService, RateLimiter};
use cache::CacheManager;

const TELEMETRY_COLLECTION: &str = "pollution_records";

pub struct AppState {
    pub pool: PgPool,
    pub catalog: CatalogStore,
    pub indicators: IndicatorStore,
    pub scores: ScoreStore,
    pub auth_store: AuthStore,
    pub jwt: JwtService,
    pub cache: CacheManager,
    pub rate_limiter: RateLimiter,
    pub broker_config: BrokerConfig,
    pub telemetry: Option<Collection<Document>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("esglens=info".parse()?))
        .init();

    info!("Query API starting");

    let config = ApiConfig::from_env();

    let pool = esglens_store::connect(&config.database).await?;
    esglens_store::migrate(&pool).await?;

    let cache = CacheManager::connect(&config.cache).await;

    let telemetry = connect_telemetry(&config).await;

    let state = Arc::new(AppState {
        pool: pool.clone(),
        catalog: CatalogStore::new(pool.clone()),
        indicators: IndicatorStore::new(pool.clone()),
        scores: ScoreStore::new(pool.clone()),
        auth_store: AuthStore::new(pool),
        jwt: JwtService::new(&config.auth.jwt_secret, config.auth.token_ttl_secs),
        cache,
        rate_limiter: RateLimiter::new(config.auth.rate_limit_rps, config.auth.rate_limit_burst),
        broker_config: config.broker.clone(),
        telemetry,
    });

    let app = Router::new()
        // Health
        .route("/health", get(routes::health::health))
        // Unauthenticated reads
        .route("/api/companies", get(routes::companies::list))
        .route("/api/companies/search", get(routes::companies::search))
        .route("/api/companies/{id}", get(routes::companies::get))
        .route("/api/companies/{id}/scores", get(routes::scores::company_scores))
        .route("/api/indicators/definitions", get(routes::indicators::definitions))
        .route("/api/telemetry/latest", get(routes::telemetry::latest))
        // Auth
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/api-keys", post(routes::auth::create_api_key))
        // Authenticated operations
        .route("/api/cache/invalidate/{scope}", post(routes::admin::invalidate_cache))
        .route("/api/reports/trigger-processing", post(routes::admin::trigger_processing))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!(addr, "Listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// The document store is optional for the API; without it the telemetry
/// endpoint reports 503 and everything else works.
async fn connect_telemetry(config: &ApiConfig) -> Option<Collection<Document>> {
    if config.mongo_uri.is_empty() {
        info!("Document store not configured; telemetry endpoint disabled");
        return None;
    }
    match mongodb::Client::with_uri_str(&config.mongo_uri).await {
        Ok(client) => Some(
            client
                .database(&config.mongo_db)
                .collection::<Document>(TELEMETRY_COLLECTION),
        ),
        Err(e) => {
            warn!(error = %e, "Document store unreachable; telemetry endpoint disabled");
            None
        }
    }
}
