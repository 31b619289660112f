use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use charter_api::{app, AppState, AuthConfig};
use charter_core::inquiry::{CaptchaVerifier, FormRelay};
use charter_core::mail::Mailer;
use charter_core::repository::{FlightRepository, NotificationRepository, TicketRepository};
use charter_store::app_config::{Config, StorageBackend};
use charter_store::flight_repo::PostgresFlightRepository;
use charter_store::mailer::{LogMailer, TransactionalMailer};
use charter_store::notification_repo::PostgresNotificationRepository;
use charter_store::relay::{DisabledCaptcha, HttpCaptchaVerifier, HttpFormRelay, LogFormRelay};
use charter_store::ticket_repo::PostgresTicketRepository;
use charter_store::{ConfiguredLocations, DbClient, MemoryStore};
use charter_ticket::{PrinterConfig, PrinterService};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Repositories = (
    Arc<dyn FlightRepository>,
    Arc<dyn TicketRepository>,
    Arc<dyn NotificationRepository>,
);

async fn repositories(config: &Config) -> anyhow::Result<Repositories> {
    match config.storage.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            let flights: Arc<dyn FlightRepository> = store.clone();
            let tickets: Arc<dyn TicketRepository> = store.clone();
            let notifications: Arc<dyn NotificationRepository> = store;
            Ok((flights, tickets, notifications))
        }
        StorageBackend::Postgres => {
            if config.storage.database_url.is_empty() {
                bail!("storage.database_url must be set for the postgres backend");
            }
            let db = DbClient::new(&config.storage.database_url, config.storage.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;

            let flights: Arc<dyn FlightRepository> =
                Arc::new(PostgresFlightRepository::new(db.pool.clone()));
            let tickets: Arc<dyn TicketRepository> =
                Arc::new(PostgresTicketRepository::new(db.pool.clone()));
            let notifications: Arc<dyn NotificationRepository> =
                Arc::new(PostgresNotificationRepository::new(db.pool));
            Ok((flights, tickets, notifications))
        }
    }
}

async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    if config.auth.jwt_secret.is_empty() {
        bail!("auth.jwt_secret must be set (CHARTER__AUTH__JWT_SECRET)");
    }

    let (flight_repo, ticket_repo, notification_repo) = repositories(config).await?;

    let mailer: Arc<dyn Mailer> = if config.email.enabled {
        Arc::new(TransactionalMailer::new(&config.email).context("Invalid email configuration")?)
    } else {
        info!("Email disabled; confirmations will only be logged");
        Arc::new(LogMailer)
    };

    let captcha: Arc<dyn CaptchaVerifier> = if config.inquiry.captcha_secret.is_empty() {
        warn!("No CAPTCHA secret configured; inquiry CAPTCHA checks are disabled");
        Arc::new(DisabledCaptcha)
    } else {
        Arc::new(HttpCaptchaVerifier::new(
            &config.inquiry.captcha_verify_url,
            &config.inquiry.captcha_secret,
        )?)
    };

    let form_relay: Arc<dyn FormRelay> = if config.inquiry.relay_url.is_empty() {
        Arc::new(LogFormRelay)
    } else {
        Arc::new(HttpFormRelay::new(&config.inquiry.relay_url)?)
    };

    let printer = PrinterService::new(PrinterConfig {
        mode: config.printer.mode.parse().context("Invalid printer.mode")?,
        device_path: PathBuf::from(&config.printer.device_path),
        receipts_dir: PathBuf::from(&config.printer.receipts_dir),
    });
    info!("Printer running in {:?} mode", printer.mode());

    // SSE Broadcast Channel
    let (sse_tx, _) = tokio::sync::broadcast::channel(100);

    Ok(AppState {
        flight_repo,
        ticket_repo,
        location_repo: Arc::new(ConfiguredLocations::new(config.locations.clone())),
        notification_repo,
        mailer,
        captcha,
        form_relay,
        printer: Arc::new(printer),
        sse_tx,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
            admin_username: config.auth.admin_username.clone(),
            admin_password: config.auth.admin_password.clone(),
        },
        default_currency: config.tickets.default_currency.clone(),
        ticket_list_limit: config.tickets.list_limit,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "charter_api=debug,charter_store=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    info!("Starting Charter API on port {}", config.server.port);

    let app = app(build_state(&config).await?);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
