//! services/portal/src/bin/portal.rs

use portal_lib::{
    adapters::{BackendClient, FileCredentialStore, LocalBookingLedger, SampleTeacherCatalog},
    cli::{Cli, Console, Portal},
    config::{BookingBackend, Config},
    error::PortalError,
};
use padho_likho_core::{
    ports::{BookingService, Clock, SystemClock},
    routes::RouteTable,
    session::Session,
    RoleGuard,
};
use clap::Parser;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), PortalError> {
    // --- 1. Parse Arguments, Load Configuration & Set Up Logging ---
    let cli = Cli::parse();
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Configuration loaded. Backend at {}", config.api_base_url);

    // --- 2. Initialize Adapters ---
    let backend = Arc::new(BackendClient::new(
        config.api_base_url.clone(),
        config.request_timeout,
    )?);
    let store = Arc::new(FileCredentialStore::new(config.credential_path.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let bookings: Arc<dyn BookingService> = match config.booking_backend {
        BookingBackend::Remote => backend.clone(),
        BookingBackend::Local => {
            warn!("Bookings are kept in memory and will not reach the backend");
            Arc::new(LocalBookingLedger::default())
        }
    };

    // --- 3. Restore the Session & Build the Guard ---
    let session = Arc::new(Session::new(store, backend, clock.clone()));
    session.init().await;
    let guard = RoleGuard::new(session.clone(), RouteTable::default());
    let portal = Portal::new(
        session.clone(),
        guard,
        Arc::new(SampleTeacherCatalog::default()),
        bookings,
        clock,
    );

    // --- 4. Run the Command Until Done or Interrupted ---
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, shutting down");
            on_interrupt.cancel();
        }
    });

    let mut console = Console::new(
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        cancel.clone(),
    );
    let result = portal.run(cli.command, &mut console, &cancel).await;
    cancel.cancel();
    result
}
