use realtime_gateway::{AppState, Config, create_router};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    tracing::info!("Starting realtime gateway service");

    let config = Config::load();
    let addr = config.bind_addr;

    let state = AppState::new(config);
    let app = create_router(state);

    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
