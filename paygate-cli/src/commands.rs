//! Subcommands and their execution.

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Args, Subcommand, ValueEnum};
use paygate::{
    Client, ClientConfig, ListParams, WebhookVerifier,
    types::{Ordering, Paginator},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::info;

use crate::error::{CliError, Result};

/// Top-level subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Commands that call the gateway.
    #[command(flatten)]
    Api(ApiCommand),
    /// Sign and verify webhook payloads locally.
    Webhooks {
        #[command(subcommand)]
        command: WebhookCommand,
    },
}

/// Subcommands that need a configured client.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ApiCommand {
    /// Show the merchant account.
    Account,
    /// Show the account balance.
    Balance,
    /// Inspect and act on charges.
    Charges {
        #[command(subcommand)]
        command: ChargeCommand,
    },
    /// Inspect customers.
    Customers {
        #[command(subcommand)]
        command: ReadCommand,
    },
    /// Inspect events.
    Events {
        #[command(subcommand)]
        command: ReadCommand,
    },
}

/// Charge subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ChargeCommand {
    /// List charges.
    List(ListArgs),
    /// Show one charge.
    Get {
        /// Charge id.
        id: String,
    },
    /// Capture an authorized charge.
    Capture {
        /// Charge id.
        id: String,
    },
    /// Release an authorization.
    Reverse {
        /// Charge id.
        id: String,
    },
}

/// Subcommands of read-only resources.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ReadCommand {
    /// List objects.
    List(ListArgs),
    /// Show one object.
    Get {
        /// Object id.
        id: String,
    },
}

/// Webhook subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum WebhookCommand {
    /// Print the `Paygate-Signature` header value for a payload file.
    Sign {
        /// Endpoint secret (`whsec_...`).
        #[arg(long, env = "PAYGATE_WEBHOOK_SECRET", hide_env_values = true)]
        secret: String,
        /// File holding the raw request body.
        payload: PathBuf,
        /// Unix timestamp to sign at; defaults to now.
        #[arg(long)]
        timestamp: Option<i64>,
    },
    /// Verify a payload file against a signature header and print the event.
    Verify {
        /// Endpoint secret (`whsec_...`).
        #[arg(long, env = "PAYGATE_WEBHOOK_SECRET", hide_env_values = true)]
        secret: String,
        /// File holding the raw request body.
        payload: PathBuf,
        /// Value of the `Paygate-Signature` header.
        #[arg(long)]
        signature: String,
        /// Accepted timestamp skew in seconds.
        #[arg(long, default_value_t = 300)]
        tolerance_secs: u64,
    },
}

/// Sort order flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    /// Oldest first.
    Chronological,
    /// Newest first.
    ReverseChronological,
}

/// Pagination flags shared by list commands.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct ListArgs {
    /// Page size, 1 to 100.
    #[arg(long, default_value_t = 20)]
    pub limit: u32,
    /// Number of objects to skip.
    #[arg(long, default_value_t = 0)]
    pub offset: u64,
    /// Sort order.
    #[arg(long, value_enum)]
    pub order: Option<OrderArg>,
    /// Follow pagination and print every object.
    #[arg(long)]
    pub all: bool,
}

impl ListArgs {
    fn params(&self) -> ListParams {
        let params = ListParams::new().offset(self.offset).limit(self.limit);
        match self.order {
            Some(OrderArg::Chronological) => params.order(Ordering::Chronological),
            Some(OrderArg::ReverseChronological) => params.order(Ordering::ReverseChronological),
            None => params,
        }
    }
}

/// Runs a command and returns what to print.
///
/// # Errors
///
/// Returns error if the client cannot be built, a request fails or a
/// webhook payload does not verify.
pub async fn run(command: Command, config: &ClientConfig) -> Result<Value> {
    match command {
        Command::Api(command) => run_api(command, config).await,
        Command::Webhooks { command } => run_webhook(command),
    }
}

async fn run_api(command: ApiCommand, config: &ClientConfig) -> Result<Value> {
    let client = Client::from_config(config)?;
    info!(base_url = client.base_url(), test_mode = client.is_test_mode(), "client ready");

    match command {
        ApiCommand::Account => render(&client.account().retrieve().await?),
        ApiCommand::Balance => render(&client.balance().retrieve().await?),
        ApiCommand::Charges { command } => {
            let charges = client.charges();
            match command {
                ChargeCommand::List(args) => list(&args, charges.list_all(args.params())).await,
                ChargeCommand::Get { id } => render(&charges.retrieve(&id).await?),
                ChargeCommand::Capture { id } => render(&charges.capture(&id).await?),
                ChargeCommand::Reverse { id } => render(&charges.reverse(&id).await?),
            }
        }
        ApiCommand::Customers { command } => {
            let customers = client.customers();
            match command {
                ReadCommand::List(args) => list(&args, customers.list_all(args.params())).await,
                ReadCommand::Get { id } => render(&customers.retrieve(&id).await?),
            }
        }
        ApiCommand::Events { command } => {
            let events = client.events();
            match command {
                ReadCommand::List(args) => list(&args, events.list_all(args.params())).await,
                ReadCommand::Get { id } => render(&events.retrieve(&id).await?),
            }
        }
    }
}

/// Prints one page, or every page with `--all`.
async fn list<T>(args: &ListArgs, mut pages: Paginator<'_, T>) -> Result<Value>
where
    T: Serialize + DeserializeOwned,
{
    if args.all {
        return render(&pages.collect_all().await?);
    }
    render(&pages.next_page().await?)
}

fn run_webhook(command: WebhookCommand) -> Result<Value> {
    match command {
        WebhookCommand::Sign { secret, payload, timestamp } => {
            let body = read_payload(&payload)?;
            let verifier = WebhookVerifier::new(&secret)?;
            let header = verifier.sign(&body, timestamp.unwrap_or_else(|| Utc::now().timestamp()));
            Ok(Value::String(header))
        }
        WebhookCommand::Verify { secret, payload, signature, tolerance_secs } => {
            let body = read_payload(&payload)?;
            let verifier = WebhookVerifier::new(&secret)?
                .tolerance(std::time::Duration::from_secs(tolerance_secs));
            let event = verifier.construct_event(&body, &signature)?;
            info!(event = %event.id, key = %event.key, "signature verified");
            render(&event)
        }
    }
}

fn read_payload(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| CliError::Io { path: path.to_owned(), source })
}

fn render<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}
