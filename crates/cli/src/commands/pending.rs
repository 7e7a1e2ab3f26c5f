//! Pending returns listing command.

use super::CliError;

/// List RTS/RTO orders with no reconciliation record.
pub async fn run(dropshipper: Option<&str>) -> Result<(), CliError> {
    let service = super::service().await?;
    let pending = service.pending_returns(dropshipper).await?;

    #[allow(clippy::print_stdout)]
    {
        if pending.is_empty() {
            println!("No returns awaiting reconciliation");
            return Ok(());
        }

        for item in &pending {
            println!(
                "{}  {}  {}  value={}  status={}",
                item.order_ref,
                item.dropshipper,
                item.product_uid,
                item.order_value,
                item.status
            );
        }
        println!("{} pending return(s)", pending.len());
    }

    Ok(())
}
