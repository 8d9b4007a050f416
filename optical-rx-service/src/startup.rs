//! Application startup and lifecycle management.

use axum::{
    http::{header, HeaderName, HeaderValue, Method, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{RxConfig, StoreBackend};
use crate::handlers::{
    affiliates, alerts, analytics, family, health, ocr, prescriptions, subscription,
};
use crate::middleware::{admin_auth_middleware, ACCOUNT_ID_HEADER, ADMIN_KEY_HEADER};
use crate::services::ocr::gemini::GeminiConfig;
use crate::services::{GeminiVisionProvider, MemoryStore, MongoStore, OcrService, RxStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: RxConfig,
    pub store: Arc<dyn RxStore>,
    pub ocr: OcrService,
    pub analytics_rate_limiter: IpRateLimiter,
}

impl AppState {
    pub fn new(config: RxConfig, store: Arc<dyn RxStore>, ocr: OcrService) -> Self {
        let analytics_rate_limiter =
            create_ip_rate_limiter(config.analytics.rate_limit_per_min, 60);
        Self {
            config,
            store,
            ocr,
            analytics_rate_limiter,
        }
    }
}

async fn connect_store(config: &RxConfig) -> Result<Arc<dyn RxStore>, AppError> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::MongoDb => {
            let store = MongoStore::connect(&config.store.uri, &config.store.database).await?;
            store.initialize_indexes().await.map_err(|e| {
                tracing::error!("Failed to initialize database indexes: {}", e);
                e
            })?;
            Ok(Arc::new(store))
        }
    }
}

fn ocr_service(config: &RxConfig) -> OcrService {
    let Some(api_key) = config.ocr.api_key.clone() else {
        tracing::info!("LLM_API_KEY not set, OCR falls back to manual entry");
        return OcrService::disabled();
    };

    match GeminiVisionProvider::new(GeminiConfig {
        api_key,
        model: config.ocr.model.clone(),
        api_base: config.ocr.api_base.clone(),
    }) {
        Ok(provider) => {
            tracing::info!(model = %config.ocr.model, "Gemini OCR provider initialized");
            OcrService::new(Some(Arc::new(provider)))
        }
        Err(e) => {
            tracing::warn!("Failed to initialize Gemini provider: {}. OCR disabled.", e);
            OcrService::disabled()
        }
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(ADMIN_KEY_HEADER),
            HeaderName::from_static(ACCOUNT_ID_HEADER),
            HeaderName::from_static(REQUEST_ID_HEADER),
        ]);

    if allowed_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                None
            }
        })
        .collect();
    cors.allow_origin(origins)
}

/// Family members, prescriptions, subscription, alerts and OCR.
fn phi_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/family-members",
            get(family::list_members).post(family::create_member),
        )
        .route(
            "/api/family-members/:id",
            get(family::get_member)
                .put(family::update_member)
                .delete(family::delete_member),
        )
        .route(
            "/api/prescriptions",
            get(prescriptions::list_prescriptions).post(prescriptions::create_prescription),
        )
        .route(
            "/api/prescriptions/:id",
            get(prescriptions::get_prescription)
                .put(prescriptions::update_prescription)
                .delete(prescriptions::delete_prescription),
        )
        .route(
            "/api/prescriptions/:id/alerts",
            post(alerts::schedule_prescription_alerts),
        )
        .route("/api/stats", get(prescriptions::stats))
        .route("/api/subscription", get(subscription::get_subscription))
        .route("/api/subscription/upgrade", post(subscription::upgrade))
        .route("/api/subscription/cancel", post(subscription::cancel))
        .route("/api/subscription/usage", get(subscription::get_usage))
        .route(
            "/api/user-emails",
            get(alerts::list_emails).post(alerts::register_email),
        )
        .route(
            "/api/user-emails/:id",
            axum::routing::delete(alerts::delete_email),
        )
        .route("/api/alerts", get(alerts::list_alerts))
        .route("/api/alerts/pending", get(alerts::pending_alerts))
        .route("/api/alerts/:id/sent", post(alerts::mark_sent))
        .route("/api/ocr/extract-expiry", post(ocr::extract_expiry))
}

pub fn build_router(state: AppState) -> Router {
    let admin = from_fn_with_state(state.clone(), admin_auth_middleware);
    let track_limiter = from_fn_with_state(
        state.analytics_rate_limiter.clone(),
        ip_rate_limit_middleware,
    );

    let mut app = Router::new()
        .route("/", get(health::root))
        .route("/api/", get(health::api_root))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics_handler))
        .route(
            "/api/analytics/track",
            post(analytics::track_event).route_layer(track_limiter),
        )
        .route(
            "/api/analytics/dashboard",
            get(analytics::dashboard).route_layer(admin.clone()),
        )
        .route(
            "/api/affiliates",
            get(affiliates::list_active).merge(post(affiliates::create).route_layer(admin.clone())),
        )
        .route(
            "/api/affiliates/all",
            get(affiliates::list_all).route_layer(admin.clone()),
        )
        .route(
            "/api/affiliates/:id",
            axum::routing::put(affiliates::update)
                .delete(affiliates::delete)
                .route_layer(admin),
        );

    if state.config.features.phi_endpoints_enabled {
        app = app.merge(phi_routes());
    } else {
        tracing::info!("PHI endpoints disabled; serving analytics and affiliates only");
    }

    let cors = cors_layer(&state.config.security.allowed_origins);

    app.fallback(health::not_found)
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri().path(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: RxConfig) -> Result<Self, AppError> {
        let store = connect_store(&config).await?;
        let ocr = ocr_service(&config);
        let state = AppState::new(config.clone(), store, ocr);
        let router = build_router(state);

        // Port 0 picks a random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            environment = ?config.environment,
            phi_endpoints_enabled = config.features.phi_endpoints_enabled,
            "optical-rx-service listening"
        );

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        tracing::info!("Service shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
