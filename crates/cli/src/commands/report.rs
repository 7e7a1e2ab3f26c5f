//! Payout report command.

use std::path::PathBuf;

use chrono::NaiveDate;

use codledger_engine::models::{DateWindow, PayoutReport, PayoutRequest};

use super::CliError;

/// Calculate payouts over a window and print the summary; optionally
/// export the line-level rows as CSV.
///
/// `delivery` bounds the delivered date separately when given; otherwise
/// the order window bounds both.
pub async fn run(
    from: NaiveDate,
    to: NaiveDate,
    delivery: Option<(NaiveDate, NaiveDate)>,
    dropshipper: Option<String>,
    out: Option<PathBuf>,
) -> Result<(), CliError> {
    if from > to {
        return Err(CliError::InvalidArgument(format!(
            "window start {from} is after end {to}"
        )));
    }
    if let Some((d_from, d_to)) = delivery
        && d_from > d_to
    {
        return Err(CliError::InvalidArgument(format!(
            "delivery window start {d_from} is after end {d_to}"
        )));
    }

    let window = DateWindow::new(from, to);
    let request = PayoutRequest {
        order_window: window,
        delivery_window: delivery.map_or(window, |(d_from, d_to)| DateWindow::new(d_from, d_to)),
        dropshipper,
    };

    let service = super::service().await?;
    let report = service.calculate_payouts(&request, Vec::new()).await?;

    print_summary(&report);

    if let Some(path) = out {
        write_csv(&report, &path)?;
        tracing::info!(rows = report.rows.len(), path = %path.display(), "rows exported");
    }

    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_summary(report: &PayoutReport) {
    let s = &report.summary;
    println!("COD collected:     {} {}", s.cod_total, s.currency.code());
    println!("Shipping charges:  {}", s.shipping_total);
    println!("Product cost:      {}", s.product_cost_total);
    println!("Reversals:         {}", s.reversal_total);
    println!("Final payable:     {}", s.final_payable);
    println!(
        "Orders: {} with COD, {} with shipping, {} with product cost ({} lines)",
        s.orders_with_cod,
        s.orders_with_shipping_charges,
        s.orders_with_product_amount,
        s.lines_considered
    );
    if !s.config_gaps.is_empty() {
        println!("Configuration gaps ({}):", s.config_gaps.len());
        for gap in &s.config_gaps {
            println!("  {:?}  {}  {}", gap.kind, gap.dropshipper, gap.product_uid);
        }
    }
}

fn write_csv(report: &PayoutReport, path: &std::path::Path) -> Result<(), CliError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "order_ref",
        "waybill",
        "dropshipper",
        "product",
        "quantity",
        "status",
        "payment_mode",
        "cod_received",
        "shipping_cost",
        "product_cost",
        "payable",
    ])?;

    for row in &report.rows {
        writer.write_record([
            row.order_ref.as_str(),
            row.waybill.as_ref().map_or("", |w| w.as_str()),
            row.dropshipper.as_str(),
            &row.product_name,
            &row.quantity.to_string(),
            &format!("{:?}", row.status_class),
            &format!("{:?}", row.payment_mode),
            &row.cod_received.to_string(),
            &row.shipping_cost.to_string(),
            &row.product_cost.to_string(),
            &row.payable.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
