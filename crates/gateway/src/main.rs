//! Gateway entry point.

use beamline_domain::Result;
use beamline_gateway::{config, logging, router, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = config::load()?;
    logging::init(settings.environment);

    let bind_addr = settings.server.bind_addr.clone();
    let state = AppState::new(settings);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| beamline_domain::BeamlineError::Config(format!("Cannot bind {bind_addr}: {e}")))?;
    info!(addr = %bind_addr, "gateway listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| beamline_domain::BeamlineError::Internal(e.to_string()))
}
