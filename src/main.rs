use std::sync::Arc;

use restmux::config::Config;
use restmux::demo::{self, PeopleStore};
use restmux::logger;
use restmux::server::{self, ServerContext};

/// Config file used when none is given on the command line (extension optional)
const DEFAULT_CONFIG: &str = "restmux";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg.logging)?;

    // Create the Tokio runtime, sizing the worker pool from config
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    let store = match &cfg.demo.fixtures {
        Some(path) => {
            let store = PeopleStore::from_json_file(path)?;
            tracing::info!(path = %path, people = store.len()?, "loaded fixtures");
            store
        }
        None => PeopleStore::seed(cfg.demo.people),
    };
    let mux = Arc::new(demo::build_mux(Arc::new(store), cfg.mux_options())?);

    let listener = server::create_reusable_listener(addr)?;
    logger::log_server_start(&addr, &cfg, &mux.patterns().collect::<Vec<_>>());

    let ctx = Arc::new(ServerContext::from_config(Arc::clone(&mux), &cfg));
    server::start_server_loop(listener, ctx, server::shutdown_signal()).await;
    Ok(())
}
