//! Ledger Redeem CLI
//!
//! Entry point for the redemption API and operator commands.

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;

use ledger_redeem::common::logging::init_from_config;
use ledger_redeem::{
    api, AppConfig, DiscordRoleGrant, DiscordUserId, RedemptionConfig, RedemptionService,
    RedemptionStore, Result, SqliteRedemptionStore, TransactionLedger, XsollaLedgerClient,
};

#[derive(Parser)]
#[command(name = "ledger-redeem")]
#[command(about = "Redeem purchase transaction ids for roles, once")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the redemption API
    Serve {
        /// Listen port (defaults to REDEEM_API_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Redeem one transaction id for a user
    Redeem {
        transaction_id: String,
        user_id: String,
    },

    /// Query the payment ledger without redeeming
    Lookup { transaction_id: String },

    /// Show who redeemed a transaction id
    Show { transaction_id: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error [{}]: {}", e.error_code(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::from_env()?;
    init_from_config(&config)?;

    match cli.command {
        Commands::Serve { port } => {
            config.print_summary();
            let service = build_service(&config)?;
            api::start_server(service, port.unwrap_or(config.api_port)).await?;
        }
        Commands::Redeem {
            transaction_id,
            user_id,
        } => {
            let user: DiscordUserId = user_id.parse()?;
            let service = build_service(&config)?;
            let outcome = service.submit(&transaction_id, &user.to_string()).await;
            println!("{} ({})", outcome.user_message(), outcome);
        }
        Commands::Lookup { transaction_id } => {
            let ledger = XsollaLedgerClient::new(&config.ledger)?;
            let transactions = ledger.lookup(&transaction_id).await?;

            if transactions.is_empty() {
                println!("No completed transactions for {}", transaction_id);
            }
            for tx in transactions {
                println!("---");
                println!("Transaction ID: {}", tx.transaction_id);
                println!("Status: {}", tx.status);
                if let (Some(amount), Some(currency)) = (&tx.amount, &tx.currency) {
                    println!("Amount: {} {}", amount, currency);
                }
                println!("Redeemable: {}", tx.matches(&transaction_id));
            }
        }
        Commands::Show { transaction_id } => {
            let store = SqliteRedemptionStore::new(&config.database_path)?;
            match store.get(&transaction_id).await? {
                Some(record) => {
                    let when = chrono::DateTime::from_timestamp(record.redeemed_at as i64, 0)
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| record.redeemed_at.to_string());
                    println!("Transaction ID: {}", record.transaction_id);
                    println!("Redeemed by: {}", record.redeemed_by);
                    println!("Redeemed at: {}", when);
                }
                None => println!("{} has not been redeemed", transaction_id),
            }
        }
    }

    Ok(())
}

/// Open the store and wire the workflow; the store closes when the service drops
fn build_service(config: &AppConfig) -> Result<RedemptionService> {
    let store = SqliteRedemptionStore::new(&config.database_path)?;
    let ledger = XsollaLedgerClient::new(&config.ledger)?;
    let grant = DiscordRoleGrant::new(&config.grant)?;

    Ok(RedemptionService::new(
        RedemptionConfig::from(config),
        Arc::new(store),
        Arc::new(ledger),
        Arc::new(grant),
    ))
}
