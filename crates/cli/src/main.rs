//! CodLedger CLI - payout reports, reconciliation and migrations.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! codledger migrate
//!
//! # Payout report for a window, optionally exported as CSV
//! codledger report --from 2024-03-01 --to 2024-03-31 \
//!     --dropshipper seller@shop.com --out payouts.csv
//!
//! # Detect RTS/RTO reversal candidates
//! codledger detect --from 2024-03-01 --to 2024-03-31
//!
//! # Confirm a reversal
//! codledger confirm --order-ref ORD-1001 \
//!     --product-uid "seller@shop.com::posture-belt" \
//!     --dropshipper seller@shop.com --amount 300
//!
//! # List RTS/RTO orders awaiting reconciliation
//! codledger pending
//!
//! # Manage and run payment cycles
//! codledger cycles set --dropshipper seller@shop.com --name weekly --kind weekly
//! codledger cycles run --dropshipper seller@shop.com --name weekly
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;

#[derive(Parser)]
#[command(name = "codledger")]
#[command(author, version, about = "CodLedger settlement tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Calculate a payout report over a date window
    Report {
        /// Window start (YYYY-MM-DD), bounds order and delivered dates
        #[arg(long)]
        from: NaiveDate,

        /// Window end (YYYY-MM-DD), inclusive through end-of-day
        #[arg(long)]
        to: NaiveDate,

        /// Delivery window start; defaults to --from
        #[arg(long, requires = "delivered_to")]
        delivered_from: Option<NaiveDate>,

        /// Delivery window end; defaults to --to
        #[arg(long, requires = "delivered_from")]
        delivered_to: Option<NaiveDate>,

        /// Restrict to one dropshipper email
        #[arg(short, long)]
        dropshipper: Option<String>,

        /// Write line-level rows to a CSV file
        #[arg(short, long)]
        out: Option<std::path::PathBuf>,
    },
    /// Detect RTS/RTO reversal candidates
    Detect {
        /// Window start (YYYY-MM-DD) for the order date
        #[arg(long)]
        from: NaiveDate,

        /// Window end (YYYY-MM-DD), inclusive
        #[arg(long)]
        to: NaiveDate,

        /// Restrict to one dropshipper email
        #[arg(short, long)]
        dropshipper: Option<String>,
    },
    /// Confirm a payout reversal
    Confirm {
        /// Order identifier
        #[arg(long)]
        order_ref: String,

        /// Product identity (`dropshipper::product-slug`)
        #[arg(long)]
        product_uid: String,

        /// Dropshipper email
        #[arg(long)]
        dropshipper: String,

        /// Reversal amount
        #[arg(long)]
        amount: Decimal,

        /// Original paid amount, when known
        #[arg(long)]
        paid: Option<Decimal>,

        /// Free-form note
        #[arg(long)]
        notes: Option<String>,
    },
    /// List RTS/RTO orders awaiting reconciliation
    Pending {
        /// Restrict to one dropshipper email
        #[arg(short, long)]
        dropshipper: Option<String>,
    },
    /// Manage payment cycles
    Cycles {
        #[command(subcommand)]
        action: CycleAction,
    },
}

#[derive(Subcommand)]
enum CycleAction {
    /// Create or replace a dropshipper's cycle
    Set {
        /// Dropshipper email
        #[arg(long)]
        dropshipper: String,

        /// Cycle name
        #[arg(long)]
        name: String,

        /// Cycle kind (daily, weekly, biweekly, monthly)
        #[arg(long)]
        kind: String,

        /// Settlement lag in days
        #[arg(long, default_value_t = 0)]
        offset_days: i64,
    },
    /// List configured cycles
    List {
        /// Restrict to one dropshipper email
        #[arg(short, long)]
        dropshipper: Option<String>,
    },
    /// Resolve a cycle's window and run the payout report over it
    Run {
        /// Dropshipper email
        #[arg(long)]
        dropshipper: String,

        /// Cycle name
        #[arg(long)]
        name: String,

        /// As-of date (defaults to today)
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Report {
            from,
            to,
            delivered_from,
            delivered_to,
            dropshipper,
            out,
        } => {
            let delivery = delivered_from.zip(delivered_to);
            commands::report::run(from, to, delivery, dropshipper, out).await?;
        }
        Commands::Detect {
            from,
            to,
            dropshipper,
        } => commands::detect::run(from, to, dropshipper.as_deref()).await?,
        Commands::Confirm {
            order_ref,
            product_uid,
            dropshipper,
            amount,
            paid,
            notes,
        } => {
            commands::confirm::run(&order_ref, &product_uid, &dropshipper, amount, paid, notes)
                .await?;
        }
        Commands::Pending { dropshipper } => {
            commands::pending::run(dropshipper.as_deref()).await?;
        }
        Commands::Cycles { action } => match action {
            CycleAction::Set {
                dropshipper,
                name,
                kind,
                offset_days,
            } => commands::cycles::set(&dropshipper, &name, &kind, offset_days).await?,
            CycleAction::List { dropshipper } => {
                commands::cycles::list(dropshipper.as_deref()).await?;
            }
            CycleAction::Run {
                dropshipper,
                name,
                as_of,
            } => commands::cycles::run(&dropshipper, &name, as_of).await?,
        },
    }
    Ok(())
}
