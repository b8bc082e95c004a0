use anyhow::Result;
use clap::Parser;
use sonar_core::AppConfig;
use std::path::PathBuf;

/// sonar-server: asynchronous nmap scan jobs over HTTP.
#[derive(Debug, Parser)]
#[command(name = "sonar-server", version, about, long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the config file and SONAR_PORT.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_with_env(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    sonar_server::logging::init_tracing(&config.logging);
    sonar_server::run(config).await
}
