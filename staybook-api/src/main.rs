use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use staybook_api::{app, worker, AppState};
use staybook_booking::MockPaymentGateway;
use staybook_core::payment::PaymentGateway;
use staybook_store::{Backend, Config, DbClient, MemoryBackend, PaystackClient, RedisClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "staybook_api=debug,staybook_booking=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Staybook API on port {} ({:?} backend)", config.server.port, config.backend);

    let repos = match config.backend {
        Backend::Postgres => {
            let db = DbClient::new(&config.database.url, config.database.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;

            let redis = RedisClient::new(&config.redis.url)
                .await
                .context("Failed to connect to Redis")?;
            redis.ping().await.context("Redis did not answer PING")?;
            staybook_store::postgres_repositories(&db, redis)
        }
        Backend::Memory => {
            tracing::warn!("Using the in-memory backend, state is lost on restart");
            MemoryBackend::new().repositories()
        }
    };

    let gateway: Arc<dyn PaymentGateway> = if config.payments.secret_key.is_empty() {
        tracing::warn!("No payment secret key configured, using the in-process gateway");
        Arc::new(MockPaymentGateway::new())
    } else {
        Arc::new(
            PaystackClient::new(config.payments.base_url.clone(), config.payments.secret_key.clone())
                .context("Failed to build payment gateway client")?,
        )
    };

    let state = AppState::new(&repos, &config.business_rules, &config.payments, gateway);

    tokio::spawn(worker::start_no_show_sweeper(
        state.bookings.clone(),
        config.business_rules.no_show_sweep_seconds,
    ));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}
