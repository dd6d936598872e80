//! ServiceNow alert forwarder entry point
//!
//! Invoked by the monitoring platform once per event with the alert
//! template's positional arguments. Exit 0 on success, 1 on any failure.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use servicenow_alert::config::Configuration;
use servicenow_alert::runner;
use servicenow_alert::store::FileStore;

#[derive(Parser)]
#[command(name = "servicenow-alert")]
#[command(about = "Forwards health-rule violation alerts into ServiceNow incidents")]
#[command(version)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "./conf/config.yaml")]
    config: PathBuf,

    /// Path to the incident-id store file
    #[arg(long, default_value = "./conf/idstore.tsv")]
    store: PathBuf,

    /// Positional event arguments rendered by the alert template
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

async fn process(cli: Cli) -> anyhow::Result<()> {
    let config = Configuration::from_file(&cli.config)?;
    let store = FileStore::new(&cli.store);
    runner::run(&config, &cli.args, &store).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let banner = format!(
        "ServiceNow Alert Forwarder Version [{}]",
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", banner);
    tracing::info!("{}", banner);

    match process(cli).await {
        Ok(()) => {
            tracing::info!("ServiceNow alert forwarder completed successfully");
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            tracing::error!("ServiceNow alert forwarder completed with errors");
            std::process::exit(1);
        }
    }
}
