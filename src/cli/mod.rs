use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::application::LedgerService;
use crate::domain::{AccountId, ResetPolicy};
use crate::http::create_router;
use crate::telemetry::{self, LogFormat};

/// Tally - file-backed account ledger
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "A minimal account ledger persisted to a JSON file and served over HTTP")]
#[command(version)]
pub struct Cli {
    /// Ledger file path
    #[arg(
        short,
        long,
        env = "TALLY_DATA_FILE",
        default_value = "var/data/accounts.json"
    )]
    pub data_file: PathBuf,

    /// Account recreated with a zero balance on every reset (repeatable).
    /// Without any, a reset empties the ledger.
    #[arg(long = "seed-account", value_name = "ID", global = true)]
    pub seed_accounts: Vec<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the ledger over HTTP
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "TALLY_LISTEN", default_value = "127.0.0.1:8080")]
        listen: SocketAddr,
    },

    /// Show balance for an account or all accounts
    Balance {
        /// Account id (omit for all accounts)
        account: Option<String>,
    },

    /// Reset the ledger using the configured seed accounts
    Reset,
}

impl Cli {
    /// Reset policy derived from `--seed-account`.
    pub fn reset_policy(&self) -> Result<ResetPolicy> {
        if self.seed_accounts.is_empty() {
            return Ok(ResetPolicy::Empty);
        }
        let ids = self
            .seed_accounts
            .iter()
            .map(|id| AccountId::new(id.as_str()).with_context(|| format!("Invalid seed account {:?}", id)))
            .collect::<Result<Vec<_>>>()?;
        Ok(ResetPolicy::Seeded(ids))
    }

    pub async fn run(self) -> Result<()> {
        telemetry::init(self.log_format, self.verbose);

        let policy = self.reset_policy()?;
        let service = LedgerService::open(&self.data_file, policy)
            .await
            .with_context(|| format!("Failed to open ledger at {}", self.data_file.display()))?;

        match self.command {
            Commands::Serve { listen } => run_serve(service, listen).await,
            Commands::Balance { account } => run_balance_command(&service, account).await,
            Commands::Reset => {
                service.reset().await.context("Failed to reset ledger")?;
                println!("Ledger reset ({} accounts)", service.list_accounts().await.len());
                Ok(())
            }
        }
    }
}

async fn run_serve(service: LedgerService, listen: SocketAddr) -> Result<()> {
    let app = create_router(Arc::new(service));

    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind {}", listen))?;
    info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Could not listen for Ctrl-C; shutdown only by termination");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

async fn run_balance_command(service: &LedgerService, account: Option<String>) -> Result<()> {
    match account {
        Some(id) => match service.get_balance(&id).await {
            Some(balance) => println!("{}: {}", id, balance),
            None => bail!("Account not found: {}", id),
        },
        None => {
            let accounts = service.list_accounts().await;
            if accounts.is_empty() {
                println!("No accounts.");
                return Ok(());
            }

            let width = accounts
                .iter()
                .map(|a| a.id.as_str().len())
                .max()
                .unwrap_or(0)
                .max("ACCOUNT".len());

            println!("{:<width$}  {:>12}", "ACCOUNT", "BALANCE", width = width);
            println!("{}", "-".repeat(width + 14));
            for account in &accounts {
                println!(
                    "{:<width$}  {:>12}",
                    account.id,
                    account.balance,
                    width = width
                );
            }
        }
    }
    Ok(())
}
