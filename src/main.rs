use std::sync::Arc;

use red_box::api::Router;
use red_box::config::{Config, DEFAULT_CONFIG_PATH};
use red_box::error::ServerError;
use red_box::jobs::{self, JobClient};
use red_box::logger;
use red_box::server::{self, ConnectionSettings};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional first argument: config file path, extension optional
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path).map_err(ServerError::from)?;

    logger::init(&cfg.logging).map_err(ServerError::Logger)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build().map_err(ServerError::from)?;

    runtime.block_on(async_main(cfg))?;
    Ok(())
}

async fn async_main(cfg: Config) -> Result<(), ServerError> {
    let addr = cfg.get_socket_addr()?;
    let client = jobs::client_from_config(&cfg.jobs)?;

    let listener = server::create_reusable_listener(addr)
        .map_err(|source| ServerError::Bind { addr, source })?;

    let mut router = Router::new(Arc::clone(&client), &cfg.files);
    if cfg.logging.access_log {
        router = router.with_access_log(cfg.logging.access_log_format.clone());
    }

    logger::log_server_start(&addr, &cfg, client.backend());

    server::serve(
        listener,
        Arc::new(router),
        ConnectionSettings::from_config(&cfg),
        server::shutdown_signal(),
    )
    .await;

    logger::log_info("Server stopped");
    Ok(())
}
