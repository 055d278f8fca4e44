use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use errlogger_core::config::{parse_params, LoggerConfig};
use errlogger_core::observability::init_tracing;
use errlogger_core::{CapturedError, ErrorLogger};

#[derive(Parser)]
#[command(name = "errlogger")]
#[command(about = "Report errors to a collector endpoint", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Report a single error
    Send {
        #[command(flatten)]
        target: TargetArgs,

        /// File or script the error originated from
        #[arg(long)]
        source: Option<String>,

        /// Line number of the error
        #[arg(long)]
        line: Option<u32>,

        /// Column number of the error
        #[arg(long)]
        column: Option<u32>,

        /// Error message
        #[arg(required = true)]
        message: Vec<String>,
    },
    /// Report every line read from stdin as a separate error
    Pipe {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Validate a configuration file
    CheckConfig {
        /// TOML configuration file
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(clap::Args)]
struct TargetArgs {
    /// TOML configuration file (environment variables are used otherwise)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Collector endpoint URL. Overrides the configuration file; without
    /// --config the ERRLOGGER_* environment is ignored entirely
    #[arg(long)]
    endpoint: Option<String>,

    /// Page or application URL reported with each error
    #[arg(long)]
    page_url: Option<String>,

    /// Extra parameter sent with every error (key=value, repeatable)
    #[arg(long = "param")]
    params: Vec<String>,

    /// Seconds to wait for delivery before giving up
    #[arg(long, default_value = "30")]
    timeout: u64,
}

impl TargetArgs {
    fn load_config(&self) -> anyhow::Result<LoggerConfig> {
        let mut config = match &self.config {
            Some(path) => LoggerConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None if self.endpoint.is_some() => LoggerConfig::default(),
            None => LoggerConfig::from_env().context("loading configuration from environment")?,
        };

        if let Some(endpoint) = &self.endpoint {
            config.endpoint_url = Some(endpoint.clone());
        }
        if let Some(page_url) = &self.page_url {
            config.page_url = Some(page_url.clone());
        }
        for raw in &self.params {
            config.additional_params.extend(parse_params(raw)?);
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Send {
            target,
            source,
            line,
            column,
            message,
        } => {
            let Some(logger) = start_logger(&target)? else {
                return Ok(());
            };

            let captured = CapturedError {
                message: Some(message.join(" ")),
                source,
                line,
                column,
                ..CapturedError::default()
            };
            if logger.write(captured).is_none() {
                info!("Error matched the noise filter, nothing to send");
            }

            wait_for_delivery(&logger, target.timeout).await
        }
        Commands::Pipe { target } => {
            let Some(logger) = start_logger(&target)? else {
                return Ok(());
            };

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                if !line.trim().is_empty() {
                    logger.write(CapturedError::new(line));
                }
            }

            wait_for_delivery(&logger, target.timeout).await
        }
        Commands::CheckConfig { file } => {
            let config = LoggerConfig::from_file(&file)
                .with_context(|| format!("loading {}", file.display()))?;
            match config.endpoint() {
                Some(endpoint) => println!("{}: ok, delivering to {}", file.display(), endpoint),
                None => println!("{}: ok, no endpoint configured (logger disabled)", file.display()),
            }
            Ok(())
        }
    }
}

fn start_logger(target: &TargetArgs) -> anyhow::Result<Option<ErrorLogger>> {
    let config = target.load_config()?;
    let logger = ErrorLogger::from_config(&config)?;
    if logger.is_none() {
        warn!("No endpoint configured; set --endpoint or ERRLOGGER_ENDPOINT_URL");
    }
    Ok(logger)
}

async fn wait_for_delivery(logger: &ErrorLogger, timeout_secs: u64) -> anyhow::Result<()> {
    let timeout = Duration::from_secs(timeout_secs);
    if logger.flush_timeout(timeout).await.is_err() {
        let pending = logger.pending();
        bail!(
            "{} error(s) still undelivered after {:?}: {:?}",
            pending.len(),
            timeout,
            pending
        );
    }

    let stats = logger.stats();
    info!(
        delivered = stats.delivered,
        failed_attempts = stats.failed_attempts,
        filtered = stats.filtered,
        "Delivery complete"
    );
    Ok(())
}
