//! `paygate`: command-line companion for the Paygate API.
//!
//! Reads keys from the environment (or a `.env` file), calls the gateway and
//! prints JSON on stdout. Logs go to stderr.
//!
//! ```text
//! paygate balance
//! paygate charges list --limit 10 --order reverse-chronological
//! paygate events get evnt_test_5xuy4w91xqz7d1w9u0t
//! paygate webhooks verify payload.json --signature "t=...,v1=..."
//! ```

#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest and tracing-subscriber"
)]

mod commands;
mod error;
mod observability;

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use paygate::ClientConfig;
use serde_json::Value;
use tracing::{debug, error};

use crate::{commands::Command, observability::LogFormat};

#[derive(Debug, Parser)]
#[command(name = "paygate", version, about = "Paygate payment gateway CLI", long_about = None)]
struct Cli {
    /// TOML client configuration file.
    #[arg(long, short = 'c', global = true, env = "PAYGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides the gateway base URL.
    #[arg(long, global = true, env = "PAYGATE_BASE_URL")]
    base_url: Option<String>,

    /// Pins the API version (`YYYY-MM-DD`).
    #[arg(long, global = true, env = "PAYGATE_API_VERSION")]
    api_version: Option<String>,

    /// Log output format.
    #[arg(long, global = true, env = "LOG_FORMAT", value_enum, ignore_case = true, default_value_t)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn client_config(&self) -> paygate::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        };
        if let Some(base_url) = &self.base_url {
            config.base_url.clone_from(base_url);
        }
        if let Some(version) = &self.api_version {
            config.api_version = Some(version.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    observability::init_observability(cli.log_format);

    if let Ok(path) = dotenv {
        debug!(path = %path.display(), "loaded environment file");
    }

    let result = match cli.client_config() {
        Ok(config) => commands::run(cli.command, &config).await,
        Err(err) => Err(err.into()),
    };

    match result {
        Ok(Value::String(text)) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                error!(error = %err, "cannot render output");
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            error!(error = %err, "command failed");
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
