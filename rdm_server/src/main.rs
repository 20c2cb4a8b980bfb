use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use rdm_core::error::fatal;
use rdm_core::job::deps::Deps;
use rdm_core::store::sqlite::SqliteStore;
use tokio_util::sync::CancellationToken;

use rdm_server::bootstrap;
use rdm_server::config::Config;
use rdm_server::server::{router, AppState};

#[derive(Parser)]
#[command(name = "rdmd", about = "Media download server")]
struct Args {
    /// Path to the YAML config file.
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let args = Args::parse();
    let config = match Config::load(&args.config) {
        Ok(c) => c,
        Err(e) => fatal(format!("failed to load config {}: {e}", args.config.display())),
    };

    let bootstrapped = bootstrap::run(&config).await;

    let store: Arc<dyn rdm_core::store::Store> = Arc::new(SqliteStore::new(bootstrapped.pool));
    let deps = Deps {
        store,
        cleanup: bootstrapped.cleanup,
        downloader_path: config.downloader_path.clone(),
        ffmpeg_location: config.ffmpeg_location.clone(),
        tmp_root: config.tmp_dir(),
    };

    let shutdown = CancellationToken::new();
    let state = AppState {
        deps,
        allow_client_reconnect: config.allow_client_reconnect,
        shutdown: shutdown.clone(),
    };

    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => fatal(format!("failed to bind {addr}: {e}")),
    };

    log::info!("rdmd listening on ws://{addr}/ws");

    let shutdown_signal = async move {
        tokio::select! {
            _ = shutdown.cancelled() => {}
            _ = tokio::signal::ctrl_c() => {}
        }
    };

    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal).await {
        fatal(format!("server error: {e}"));
    }
}
