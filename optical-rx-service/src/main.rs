use optical_rx_service::config::RxConfig;
use optical_rx_service::services::init_metrics;
use optical_rx_service::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = RxConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(
        "optical-rx-service",
        &config.common.log_level,
        config.otlp_endpoint.as_deref(),
    );
    init_metrics();

    let application = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to start optical-rx-service: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    application.run_until_stopped().await
}
