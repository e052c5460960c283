//! session-pager binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use session_pager::api::{serve_with_state, AppState};
use session_pager::cli::{self, parse_args};
use session_pager::config::Config;
use session_pager::{logging, Pruner, SessionStore};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Run with --help for usage.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if logging::init_with_filter(config.log_filter()).is_err() {
        eprintln!("warning: logging already initialized");
    }

    info!("session-pager v{}", env!("CARGO_PKG_VERSION"));

    let server_config = match config.to_server_config() {
        Ok(server_config) => server_config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let store_config = config.to_store_config();
    let store = Arc::new(SessionStore::with_config(store_config));
    info!(
        ttl_secs = store_config.ttl.as_secs(),
        page_size = store_config.page_size,
        "Session store initialized"
    );

    let pruner = Pruner::spawn(Arc::clone(&store), config.prune_interval());

    let result = serve_with_state(server_config, AppState::with_store(store)).await;

    pruner.shutdown().await;

    match result {
        Ok(()) => {
            info!("session-pager stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
