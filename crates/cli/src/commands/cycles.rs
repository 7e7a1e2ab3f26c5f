//! Payment cycle management commands.

use chrono::{NaiveDate, Utc};

use codledger_core::Email;
use codledger_engine::models::CycleKind;
use codledger_store::PaymentCycleRepository;
use codledger_store::payment_cycles::UpsertCycleInput;

use super::CliError;

/// Create or replace a dropshipper's payment cycle.
pub async fn set(
    dropshipper: &str,
    name: &str,
    kind: &str,
    offset_days: i64,
) -> Result<(), CliError> {
    let dropshipper = Email::parse(dropshipper)
        .map_err(|e| CliError::InvalidArgument(format!("dropshipper: {e}")))?;
    let kind = CycleKind::parse(kind);
    if matches!(kind, CycleKind::Other(_)) {
        tracing::warn!(%kind, "unrecognized cycle kind; it will resolve to a trailing 30-day window");
    }

    let store = super::connect().await?;
    let cycle = PaymentCycleRepository::new(store.pool())
        .upsert(&UpsertCycleInput {
            dropshipper,
            name: name.to_owned(),
            kind,
            offset_days,
        })
        .await?;

    #[allow(clippy::print_stdout)]
    {
        println!(
            "Cycle {} ({}) saved for {} with offset {} day(s)",
            cycle.name, cycle.kind, cycle.dropshipper, cycle.offset_days
        );
    }

    Ok(())
}

/// List configured payment cycles.
pub async fn list(dropshipper: Option<&str>) -> Result<(), CliError> {
    let store = super::connect().await?;
    let cycles = PaymentCycleRepository::new(store.pool())
        .list(dropshipper)
        .await?;

    #[allow(clippy::print_stdout)]
    {
        if cycles.is_empty() {
            println!("No payment cycles configured");
            return Ok(());
        }
        for cycle in &cycles {
            println!(
                "{}  {}  {}  offset={}d",
                cycle.dropshipper, cycle.name, cycle.kind, cycle.offset_days
            );
        }
    }

    Ok(())
}

/// Resolve a cycle's window and run the payout report over it.
pub async fn run(
    dropshipper: &str,
    name: &str,
    as_of: Option<NaiveDate>,
) -> Result<(), CliError> {
    let dropshipper = Email::parse(dropshipper)
        .map_err(|e| CliError::InvalidArgument(format!("dropshipper: {e}")))?;
    let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());

    let service = super::service().await?;
    let window = service
        .resolve_cycle_window(&dropshipper, name, as_of)
        .await?;
    let report = service.run_cycle(&dropshipper, name, as_of).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("Cycle {name} resolves to {window}");
        println!(
            "Final payable for {}: {} {}",
            dropshipper,
            report.summary.final_payable,
            report.summary.currency.code()
        );
    }

    Ok(())
}
