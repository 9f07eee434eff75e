#![forbid(unsafe_code)]

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use lead_intake::adapters::ai::{DisabledAIProvider, OpenAIConfig, OpenAIProvider};
use lead_intake::adapters::catalog::YamlCategorySource;
use lead_intake::adapters::geocoding::ZippopotamGeocoder;
use lead_intake::adapters::http::{app_router, IntakeHandlers};
use lead_intake::adapters::marketplace::{HttpMarketplace, HttpMarketplaceConfig, MockMarketplace};
use lead_intake::adapters::storage::{InMemorySessionStore, PostgresSessionStore};
use lead_intake::application::{
    CategoryCatalog, CategoryDetector, FieldExtractor, LeadSubmissionService,
    PurgeExpiredSessionsHandler, ResetSessionHandler, SchemaRegistry, SendMessageHandler,
};
use lead_intake::config::{AppConfig, SessionBackend};
use lead_intake::ports::{AIProvider, LeadMarketplace, SessionStore};

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                warn!("signal handlers unavailable, falling back to ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn ai_provider(config: &AppConfig) -> Arc<dyn AIProvider> {
    match config.ai.api_key.as_deref().filter(|_| config.ai.is_enabled()) {
        Some(key) => {
            let provider_config = OpenAIConfig::new(key)
                .with_model(&config.ai.model)
                .with_base_url(&config.ai.base_url)
                .with_timeout(config.ai.timeout());
            info!(model = %config.ai.model, "AI provider enabled");
            Arc::new(OpenAIProvider::new(provider_config))
        }
        None => {
            warn!("no AI API key configured, using deterministic detection and extraction");
            Arc::new(DisabledAIProvider)
        }
    }
}

fn marketplace(config: &AppConfig) -> Arc<dyn LeadMarketplace> {
    match config.marketplace.base_url() {
        Some(url) => {
            let mut http_config =
                HttpMarketplaceConfig::new(url).with_timeout(config.marketplace.timeout());
            if let Some(key) = config.marketplace.api_key.as_deref() {
                http_config = http_config.with_api_key(key);
            }
            Arc::new(HttpMarketplace::new(http_config))
        }
        None => {
            warn!("no marketplace URL configured, leads go to a mock marketplace");
            Arc::new(MockMarketplace::new())
        }
    }
}

async fn session_store(config: &AppConfig) -> Result<Arc<dyn SessionStore>, String> {
    match config.session.backend {
        SessionBackend::Memory => {
            info!("sessions kept in memory");
            Ok(Arc::new(InMemorySessionStore::new(config.session.ttl())))
        }
        SessionBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .acquire_timeout(config.database.acquire_timeout())
                .connect(&config.database.url)
                .await
                .map_err(|e| format!("database connection failed: {e}"))?;
            if config.database.run_migrations {
                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .map_err(|e| format!("migrations failed: {e}"))?;
            }
            info!("sessions kept in postgres");
            Ok(Arc::new(PostgresSessionStore::new(pool, config.session.ttl())))
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

fn spawn_purge_task(store: Arc<dyn SessionStore>, interval: std::time::Duration) {
    let handler = PurgeExpiredSessionsHandler::new(store);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match handler.handle().await {
                Ok(result) if result.purged > 0 => {
                    info!(purged = result.purged, "expired sessions purged")
                }
                Ok(_) => {}
                Err(e) => error!("session purge failed: {e}"),
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let config = AppConfig::load().map_err(|e| format!("configuration failed: {e}"))?;
    init_tracing(&config);
    config
        .validate()
        .map_err(|e| format!("invalid configuration: {e}"))?;

    let catalog = Arc::new(CategoryCatalog::new(
        Arc::new(YamlCategorySource::new(&config.catalog.path)),
        config.catalog.cache_ttl(),
    ));
    let categories = catalog
        .load()
        .await
        .map_err(|e| format!("category catalog rejected: {e}"))?;
    info!(
        path = %config.catalog.path.display(),
        categories = categories.iter().count(),
        "category catalog loaded"
    );

    let store = session_store(&config).await?;
    let schemas = Arc::new(SchemaRegistry::new(catalog.clone()));
    let ai = ai_provider(&config);

    let mut extractor = FieldExtractor::new(ai.clone(), config.ai.timeout());
    if config.geocoding.enabled {
        let geocoder =
            ZippopotamGeocoder::new(&config.geocoding.base_url, config.geocoding.timeout());
        extractor = extractor.with_geocoder(Arc::new(geocoder), config.geocoding.timeout());
    }

    let submission = LeadSubmissionService::new(
        store.clone(),
        marketplace(&config),
        catalog.clone(),
        schemas.clone(),
        config.marketplace.timeout(),
    );
    let send_handler = SendMessageHandler::new(
        store.clone(),
        catalog,
        schemas,
        CategoryDetector::new(ai, config.ai.timeout()),
        extractor,
        submission,
    );
    let handlers = IntakeHandlers::new(
        Arc::new(send_handler),
        Arc::new(ResetSessionHandler::new(store.clone())),
    );

    if let Some(interval) = config.session.purge_interval() {
        spawn_purge_task(store, interval);
    }

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(cors_layer(&config.server.cors_origins_list()));
    let app: Router = app_router(handlers).layer(middleware);

    let addr = config
        .server
        .socket_addr()
        .map_err(|e| format!("invalid bind address: {e}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("bind failed: {e}"))?;
    info!("lead-intake listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .map_err(|e| format!("server failed: {e}"))
}
