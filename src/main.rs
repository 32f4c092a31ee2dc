use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;

mod api;
mod config;
mod handler;
mod http;
mod logger;
mod server;
mod store;

fn main() -> ExitCode {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());

    let cfg = match config::Config::load_from(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("[ERROR] Failed to load configuration '{config_path}': {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logger::init(&cfg) {
        eprintln!("[ERROR] Failed to open log files: {e}");
        return ExitCode::FAILURE;
    }

    // Build the Tokio runtime; `workers` overrides the thread count
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = match runtime_builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            logger::log_error(&format!("Failed to start runtime: {e}"));
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(async_main(cfg)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::log_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = bind(addr)?;
    let bound_addr = listener.local_addr()?;

    let state = Arc::new(config::AppState::new(&cfg));
    let local_url = cfg.local_url();
    logger::log_server_start(&bound_addr, &local_url, &cfg, state.store.path());

    if !handler::static_files::has_index_page(&cfg.storage.root, &cfg.http.index_files).await {
        logger::log_warning(&format!(
            "No board page found in '{}'. Copy the front-end assets (index.html, script.js) into storage.root.",
            cfg.storage.root
        ));
    }

    if cfg.server.open_browser {
        open_browser(&local_url);
    }

    let signals = Arc::new(server::signal::SignalHandler::new());
    server::signal::start_signal_handler(Arc::clone(&signals));

    // LocalSet for spawn_local support
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::run_until_shutdown(
            listener,
            state,
            Arc::clone(&signals.shutdown),
        ))
        .await
}

/// Bind the listening socket, naming the busy-port case explicitly
fn bind(addr: std::net::SocketAddr) -> Result<TcpListener, String> {
    server::create_listener(addr).map_err(|e| {
        if e.kind() == std::io::ErrorKind::AddrInUse {
            format!(
                "Port {} is already in use. Close the application using it or set a different server.port.",
                addr.port()
            )
        } else {
            format!("Error starting server on {addr}: {e}")
        }
    })
}

/// Best effort; a missing browser is not an error for the server
fn open_browser(url: &str) {
    logger::log_info(&format!("Opening {url} in your browser..."));
    if let Err(e) = open::that_detached(url) {
        logger::log_warning(&format!("Could not open a browser: {e}"));
    }
}
