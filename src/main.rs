use concept_summariser::{AppState, api::routes::create_router, config::Config};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Missing credentials are the one fatal error
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };
    let server_addr = config.server_addr;
    info!(
        "Using model {} (moderation {:?})",
        config.completion.model, config.moderation_policy
    );

    let app = create_router(AppState::from_config(config)?);

    let listener = TcpListener::bind(server_addr).await?;
    info!("Listening on {}", server_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
