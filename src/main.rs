use tracing::{error, info};

use tinylink::config::AppConfig;
use tinylink::runtime::{listen_for_shutdown, prepare};
use tinylink::system::init_logging;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = AppConfig::load();

    // guard 必须存活到进程结束，否则缓冲中的日志会丢失
    let _log_guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e.format_simple());
            std::process::exit(1);
        }
    };

    info!("Starting tinylink v{}", env!("CARGO_PKG_VERSION"));

    let runtime = match prepare(&config).await {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Startup failed: {}", e.format_simple());
            std::process::exit(1);
        }
    };

    info!(
        "Ready, short URLs will be served under {}",
        runtime.url_service.base_url()
    );

    listen_for_shutdown(&runtime).await;
    info!("Bye");
}
