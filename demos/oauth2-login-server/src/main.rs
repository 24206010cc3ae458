//! DingTalk login server
//!
//! Serves the two endpoints of the authorization-code flow:
//! - `GET /oauth2/authorization/dingtalk` redirects to the DingTalk consent page
//! - `GET /login/oauth2/code/dingtalk` completes the login and returns the
//!   principal as JSON

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use clap::Parser;
use ras_identity_core::StaticPermissions;
use ras_identity_oauth2::{
    ClientRegistration, ConsumedStateStore, InMemoryConsumedStateStore, JsonPrincipalResponder,
    OAuth2Provider, ProviderPreset, login_router, merge_registration,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::{Config, LoggingConfig};

/// How often used state nonces past their expiry are dropped
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(name = "oauth2-login-server")]
#[command(about = "Third-party login via the OAuth2 authorization-code flow")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the configured host and port
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if logging.format.eq_ignore_ascii_case("compact") {
        builder.compact().init();
    } else {
        builder.pretty().init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;

    init_tracing(&config.logging);
    info!("Starting OAuth2 login server");

    let preset = ProviderPreset::dingtalk();
    if !merge_registration(&mut config.client, &preset) {
        warn!(
            "No '{}' registration configured; startup will fail",
            preset.registration_id
        );
    }

    let registration =
        ClientRegistration::from_properties(&config.client, &preset, &config.server.public_base_url)
            .context("Failed to resolve client registration")?;
    info!(
        registration_id = %registration.registration_id,
        redirect_uri = %registration.redirect_uri(),
        "Client registration loaded"
    );

    let consumed_states = Arc::new(InMemoryConsumedStateStore::new());
    let mut provider = OAuth2Provider::new(config.oauth2.clone(), registration, consumed_states)
        .context("Failed to create OAuth2 provider")?;
    if !config.permissions.authorities.is_empty() {
        provider = provider.with_permissions(Arc::new(StaticPermissions::new(
            config.permissions.authorities.clone(),
        )));
    }
    let provider = Arc::new(provider);

    let cleanup_provider = provider.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            match cleanup_provider.consumed_states().cleanup_expired().await {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "Dropped expired state nonces"),
                Err(e) => warn!("Failed to clean up state nonces: {}", e),
            }
        }
    });

    let app = Router::new()
        .merge(login_router(provider, Arc::new(JsonPrincipalResponder)))
        .route("/health", get(|| async { "OK" }));

    let addr = args.bind.unwrap_or_else(|| config.bind_address());
    info!("Login server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
