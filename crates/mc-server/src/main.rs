use std::error::Error;

use mc_server::{config::Config, init_tracing, wiring};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let config = Config::from_env()?;
    let simulator = wiring::open_simulator(&config)?;
    tracing::info!(
        cache_dir = %config.cache_dir.display(),
        seeded = config.seed.is_some(),
        max_path_cells = config.max_path_cells,
        max_history_days = config.max_history_days,
        "result cache opened"
    );

    let listener = TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "listening");

    let app = wiring::build_app(wiring::app_state(&config, simulator));
    axum::serve(listener, app).await?;
    Ok(())
}
