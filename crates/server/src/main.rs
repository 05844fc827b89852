use std::sync::Arc;

use tracing::info;

use qapbench_server::{build_router, AppState};
use qapbench_solver::ReferenceSolver;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    qapbench_core::config::load_dotenv();
    let config = qapbench_core::Config::from_env();
    config.log_summary();

    let solver = Arc::new(ReferenceSolver::new());
    let state = Arc::new(AppState::new(config.clone(), solver));
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://localhost:{}", config.server.port);
    axum::serve(listener, app).await?;

    Ok(())
}
