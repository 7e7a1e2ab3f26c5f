//! RTS/RTO detection command.

use chrono::NaiveDate;

use codledger_engine::models::DateWindow;

use super::CliError;

/// Detect reversal candidates and print them, highest confidence first.
pub async fn run(
    from: NaiveDate,
    to: NaiveDate,
    dropshipper: Option<&str>,
) -> Result<(), CliError> {
    if from > to {
        return Err(CliError::InvalidArgument(format!(
            "window start {from} is after end {to}"
        )));
    }

    let service = super::service().await?;
    let suggestions = service
        .auto_detect_reconciliations(&DateWindow::new(from, to), dropshipper)
        .await?;

    #[allow(clippy::print_stdout)]
    {
        if suggestions.is_empty() {
            println!("No reversal candidates in {from}..{to}");
            return Ok(());
        }

        for s in &suggestions {
            let review = if s.needs_manual_review {
                "  [verify manually]"
            } else {
                ""
            };
            println!(
                "{:<8} {}  {}  cod={}  paid={}  reversal={}{}",
                s.confidence.to_string(),
                s.order_ref,
                s.dropshipper,
                s.cod_amount,
                s.prior_paid_amount
                    .map_or_else(|| "-".to_owned(), |amount| amount.to_string()),
                s.suggested_reversal,
                review
            );
        }
        println!("{} candidate(s)", suggestions.len());
    }

    Ok(())
}
