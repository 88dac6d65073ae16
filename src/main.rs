//! Service entry point: wires the scheduler, the executor, and the HTTP API.

use std::sync::Arc;

use tokio::sync::mpsc;

use jarvis_lib::db::JarvisDb;
use jarvis_lib::executor::Executor;
use jarvis_lib::scheduler::Scheduler;
use jarvis_lib::server::{router, ServerState};
use jarvis_lib::state::AppState;
use jarvis_lib::SCHEDULER_CHANNEL_SIZE;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let state = Arc::new(AppState::new());
    let config = state.config();

    // Open once at startup so schema problems surface before any job runs
    JarvisDb::open()?;

    // Channel for scheduler -> executor communication
    let (scheduler_tx, scheduler_rx) = mpsc::channel(SCHEDULER_CHANNEL_SIZE);

    // Spawn scheduler
    let scheduler_state = state.clone();
    let scheduler_sender = scheduler_tx.clone();
    tokio::spawn(async move {
        let scheduler = Scheduler::new(scheduler_state, scheduler_sender);
        scheduler.run().await;
    });

    // Spawn executor
    let executor_state = state.clone();
    tokio::spawn(async move {
        let executor = Executor::new(executor_state);
        executor.run(scheduler_rx).await;
    });

    // HTTP API
    let app = router(ServerState {
        app: state,
        scheduler_tx,
    });
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    log::info!("Jarvis listening on {}", config.listen_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
