use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::{Context, Result};
use clap::Parser;
use log_collection_api::config::Config;
use log_collection_api::handlers::{AppState, configure};

/// Command-line arguments for the log collection api
#[derive(Parser)]
#[command(name = "log-collection-api")]
#[command(about = "Serves the last N matching log lines of this host and its peers")]
struct Args {
    /// Path to configuration file (.env format)
    #[arg(short, long, default_value = "config.env")]
    config: String,
}

#[actix_web::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(&args.config).context("Failed to load configuration")?;

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    log::info!(
        "Serving {} as {:?} with {} peers and {} workers",
        config.log_dir.display(),
        config.server_name,
        config.peers.len(),
        config.worker_count
    );

    let state = web::Data::new(AppState::from_config(&config).context("Failed to build app state")?);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(configure)
            .wrap(Logger::default())
    })
    .shutdown_timeout(config.shutdown_timeout.as_secs())
    .bind((config.bind_address.as_str(), config.port))
    .with_context(|| format!("Failed to bind {}:{}", config.bind_address, config.port))?
    .run()
    .await?;

    log::info!("shutting down");
    Ok(())
}
