pub mod error;
pub mod routes;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::RelaySettings;

pub use error::RelayError;
pub use routes::{create_router, RelayState};

/// Serves the relay until `cancel` fires.
pub async fn serve(settings: &RelaySettings, port: u16, cancel: CancellationToken) -> anyhow::Result<()> {
    let state = RelayState::new(settings)?;
    let app = create_router(state, settings);

    let listener = TcpListener::bind((settings.host.as_str(), port)).await?;
    info!(
        "Relay listening on {}{}",
        listener.local_addr()?,
        settings.path
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    info!("Relay stopped");
    Ok(())
}
