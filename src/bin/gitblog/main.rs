use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use spdlog::{info, warn};

use gitblog::logger::configure_logger;
use gitblog::server::server_run;

use crate::config::open_config;

mod config;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config path
    #[arg(short, long)]
    config_path: Option<String>,
}

#[ntex::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args.config_path.map(PathBuf::from);

    let config = open_config(config_path)
        .map_err(anyhow::Error::msg)
        .context("Cannot start gitblog. Please run gitblog --help")?;

    if let Err(err) = configure_logger(&config) {
        warn!("Error creating logger sinks. Using console instead. Desc={}", err);
    }

    info!("Starting gitblog =-=-=-=-=-=-=-=-=-=-=-=-=-=-=-");
    info!("Site {} at {}", config.site.title, config.site.url);
    info!("Listening on {}:{}", config.server.address, config.server.port);

    server_run(config).await
        .context("Server stopped with an error")
}
