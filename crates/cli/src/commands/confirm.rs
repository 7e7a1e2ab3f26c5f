//! Reversal confirmation command.

use rust_decimal::Decimal;

use codledger_core::{Email, ProductUid};
use codledger_engine::models::reconciliation::{NewReconciliation, ReconciliationStatus};

use super::CliError;

/// Record a confirmed payout reversal.
pub async fn run(
    order_ref: &str,
    product_uid: &str,
    dropshipper: &str,
    amount: Decimal,
    paid: Option<Decimal>,
    notes: Option<String>,
) -> Result<(), CliError> {
    let dropshipper = Email::parse(dropshipper)
        .map_err(|e| CliError::InvalidArgument(format!("dropshipper: {e}")))?;

    let service = super::service().await?;
    let record = service
        .confirm_reconciliation(NewReconciliation {
            order_ref: order_ref.into(),
            product_uid: ProductUid::new(product_uid),
            dropshipper,
            original_paid_amount: paid,
            reversal_amount: amount,
            status: ReconciliationStatus::Processed,
            notes,
        })
        .await?;

    #[allow(clippy::print_stdout)]
    {
        println!(
            "Confirmed reconciliation {} for {} (reversal {})",
            record.id, record.order_ref, record.reversal_amount
        );
    }

    Ok(())
}
