//! `leadgate` server binary.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use anyhow::Context;
use leadgate::{Settings, build_state, router, shutdown};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "leadgate=info,leadgate_core=info,leadgate_auth=info,leadgate_smtp=info,tower_http=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting leadgate");

    let settings = Settings::load().await.context("loading settings")?;
    let state = build_state(&settings).await?;

    let listener = tokio::net::TcpListener::bind(settings.bind)
        .await
        .with_context(|| format!("binding {}", settings.bind))?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown::signal())
        .await?;

    info!("Shut down");
    Ok(())
}
