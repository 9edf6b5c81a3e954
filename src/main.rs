use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stayhub::{
    api,
    clock::SystemClock,
    config::Settings,
    contracts::S3ContractRenderer,
    notifications::LogNotifier,
    payments::{payos_client::PayosClient, PaymentGateway},
    service::ServiceContext,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stayhub=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!(
        "Starting StayHub server on {}:{}",
        settings.server.host,
        settings.server.port
    );

    // Initialize database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    // Initialize the payment gateway if configured
    let (gateway, checksum_key): (Option<Arc<dyn PaymentGateway>>, String) = if settings
        .payos
        .enabled
    {
        match (
            settings.payos.client_id.clone(),
            settings.payos.api_key.clone(),
            settings.payos.checksum_key.clone(),
        ) {
            (Some(client_id), Some(api_key), Some(checksum_key)) => {
                tracing::info!("PayOS payment processing enabled");
                let client = PayosClient::new(
                    settings.payos.api_base.clone(),
                    client_id,
                    api_key,
                    checksum_key.clone(),
                );
                (Some(Arc::new(client)), checksum_key)
            }
            _ => {
                tracing::warn!("PayOS enabled but missing configuration");
                (None, String::new())
            }
        }
    } else {
        tracing::info!("PayOS payment processing disabled");
        (None, String::new())
    };

    let contract_renderer = Arc::new(S3ContractRenderer::new(
        settings.contracts.bucket.clone(),
        settings.contracts.region.clone(),
    ));

    // Create service context
    let service_context = Arc::new(ServiceContext::new(
        &settings,
        gateway,
        contract_renderer,
        Arc::new(LogNotifier),
        Arc::new(SystemClock),
        checksum_key,
        db_pool.clone(),
    ));

    let app = api::create_app(service_context, Arc::new(settings.clone()));

    let listener = tokio::net::TcpListener::bind(format!(
        "{}:{}",
        settings.server.host, settings.server.port
    ))
    .await?;

    tracing::info!(
        "Server listening on http://{}:{}",
        settings.server.host,
        settings.server.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}
