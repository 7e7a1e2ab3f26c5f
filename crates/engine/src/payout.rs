//! Payout aggregation engine.
//!
//! One deterministic, idempotent pass over the in-scope order lines: each
//! line is classified, checked against the two date windows, priced through
//! the [`RateBook`], and folded into an immutable summary. Grouping by
//! order identifier only drives the deduplicated order counts - cost
//! computation stays per line item so mixed-product orders keep line-level
//! granularity.
//!
//! Nothing in here is fatal. Missing price or rate configuration degrades
//! to zero/default values and the engine processes the full window even
//! with no configuration at all, because partially-configured accounts are
//! the normal state during onboarding.

use std::collections::HashSet;

use rust_decimal::Decimal;
use tracing::debug;

use codledger_core::{OrderRef, PaymentModeClass, StatusClass, round_whole};

use crate::models::payout::{
    ConfigGap, PayoutReport, PayoutRequest, PayoutRow, PayoutSummary, ReversalAdjustment,
};
use crate::models::{OrderRecord, PriceConfig, ShippingRateConfig};
use crate::pricing::RateBook;
use crate::settings::EngineSettings;

/// Running totals folded over the order lines.
///
/// The sets deduplicate order identifiers: an order with three line items
/// counts once in each order-level count, while its per-line amounts all
/// land in the totals.
#[derive(Debug, Default)]
struct Accumulator {
    cod_total: Decimal,
    shipping_total: Decimal,
    product_cost_total: Decimal,
    orders_with_cod: HashSet<OrderRef>,
    orders_with_shipping: HashSet<OrderRef>,
    orders_with_product: HashSet<OrderRef>,
    lines_considered: usize,
}

impl Accumulator {
    fn finish(
        self,
        adjustments: &[ReversalAdjustment],
        gaps: Vec<ConfigGap>,
        settings: &EngineSettings,
    ) -> PayoutSummary {
        let reversal_total: Decimal = adjustments.iter().map(|a| a.amount).sum();

        // Single aggregate-level rounding; per-row rounding would compound.
        let final_payable = round_whole(
            self.cod_total - self.shipping_total - self.product_cost_total + reversal_total,
        );

        PayoutSummary {
            cod_total: self.cod_total,
            shipping_total: self.shipping_total,
            product_cost_total: self.product_cost_total,
            reversal_total,
            final_payable,
            orders_with_cod: self.orders_with_cod.len(),
            orders_with_shipping_charges: self.orders_with_shipping.len(),
            orders_with_product_amount: self.orders_with_product.len(),
            lines_considered: self.lines_considered,
            config_gaps: dedup_gaps(gaps),
            currency: settings.currency,
        }
    }
}

/// Calculate payouts over a batch of order lines.
///
/// `adjustments` are confirmed reversals merged in by the caller; the
/// engine itself never searches for reversals - that is the RTS/RTO
/// detector's job, invoked separately.
///
/// Read-only: no price, rate, or order data is mutated.
#[must_use]
pub fn calculate(
    orders: &[OrderRecord],
    prices: &[PriceConfig],
    rates: &[ShippingRateConfig],
    request: &PayoutRequest,
    adjustments: Vec<ReversalAdjustment>,
    settings: &EngineSettings,
) -> PayoutReport {
    let book = RateBook::new(prices, rates, settings);
    let mut acc = Accumulator::default();
    let mut rows = Vec::new();
    let mut gaps = Vec::new();

    for line in orders {
        if settings.is_denied(line.dropshipper.as_str()) {
            continue;
        }
        if let Some(filter) = request.dropshipper.as_deref()
            && !line.dropshipper.matches(filter)
        {
            continue;
        }

        acc.lines_considered += 1;

        let status = line.status_class();
        let mode = line.payment_mode_class();
        let ordered_in_window = request.order_window.contains(line.order_date);
        let delivered_in_window = matches!(status, StatusClass::Delivered)
            && line
                .delivered_date
                .is_some_and(|d| request.delivery_window.contains(d));

        // Cancelled orders never generate a shipping charge, no matter
        // what rates are configured.
        let cancelled = matches!(status, StatusClass::Cancelled);

        let mut shipping_cost = Decimal::ZERO;
        let mut rate_source = None;
        if ordered_in_window && !cancelled {
            let quote =
                book.shipping_quote(&line.dropshipper, &line.product_uid, &line.carrier, &mut gaps);
            shipping_cost = Decimal::from(line.quantity) * quote.flat_rate;
            rate_source = Some(quote.source);

            acc.shipping_total += shipping_cost;
            // Zero/unconfigured rates must not inflate the order count.
            if shipping_cost > Decimal::ZERO {
                acc.orders_with_shipping.insert(line.order_ref.clone());
            }
        }

        let mut cod_received = Decimal::ZERO;
        let mut product_cost = Decimal::ZERO;
        if delivered_in_window {
            if matches!(mode, PaymentModeClass::Cod) {
                // The stored line value already encodes quantity.
                cod_received = line.order_value;
                acc.cod_total += cod_received;
                acc.orders_with_cod.insert(line.order_ref.clone());
            }

            // The platform fronts the product cost for every delivered
            // order, COD or prepaid.
            let unit_cost = book.unit_cost(&line.dropshipper, &line.product_uid, &mut gaps);
            product_cost = Decimal::from(line.quantity) * unit_cost;
            acc.product_cost_total += product_cost;
            acc.orders_with_product.insert(line.order_ref.clone());
        }

        if ordered_in_window || delivered_in_window {
            rows.push(PayoutRow {
                order_ref: line.order_ref.clone(),
                waybill: line.waybill.clone(),
                dropshipper: line.dropshipper.normalized(),
                product_uid: line.product_uid.clone(),
                product_name: line.product_name.clone(),
                quantity: line.quantity,
                status_class: status,
                payment_mode: mode,
                cod_received,
                shipping_cost,
                product_cost,
                payable: cod_received - shipping_cost - product_cost,
                rate_source,
            });
        }
    }

    debug!(
        lines = acc.lines_considered,
        rows = rows.len(),
        gaps = gaps.len(),
        "payout fold complete"
    );

    let summary = acc.finish(&adjustments, gaps, settings);
    PayoutReport {
        summary,
        rows,
        adjustments,
    }
}

/// Deduplicate gap entries while preserving first-seen order.
fn dedup_gaps(gaps: Vec<ConfigGap>) -> Vec<ConfigGap> {
    let mut seen = HashSet::new();
    gaps.into_iter()
        .filter(|gap| seen.insert(gap.clone()))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use codledger_core::{Carrier, CurrencyCode, Email, IngestSeq, OrderLineId, ProductUid};
    use uuid::Uuid;

    use crate::models::DateWindow;

    use super::*;

    fn seller() -> Email {
        Email::parse("seller@shop.com").unwrap()
    }

    fn belt() -> ProductUid {
        ProductUid::derive(&seller(), "Posture Belt")
    }

    fn window(from: &str, to: &str) -> DateWindow {
        DateWindow::new(from.parse().unwrap(), to.parse().unwrap())
    }

    fn line(order_ref: &str, status: &str, qty: i32, value: i64) -> OrderRecord {
        OrderRecord {
            id: OrderLineId::new(1),
            order_ref: order_ref.into(),
            waybill: None,
            dropshipper: seller(),
            product_uid: belt(),
            product_name: "Posture Belt".to_owned(),
            sku: None,
            quantity: qty,
            order_value: Decimal::new(value, 0),
            payment_mode: Some("COD".to_owned()),
            status: status.to_owned(),
            order_date: Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap(),
            delivered_date: Some(Utc.with_ymd_and_hms(2024, 3, 15, 18, 0, 0).unwrap()),
            return_initiated_date: None,
            carrier: Carrier::new("Delhivery"),
            upload_batch: Uuid::nil(),
            ingest_seq: IngestSeq::new(1),
        }
    }

    fn march_request() -> PayoutRequest {
        PayoutRequest {
            order_window: window("2024-03-01", "2024-03-31"),
            delivery_window: window("2024-03-01", "2024-03-31"),
            dropshipper: None,
        }
    }

    fn price_config(unit_cost: i64) -> PriceConfig {
        PriceConfig {
            dropshipper: seller(),
            product_uid: belt(),
            unit_cost: Decimal::new(unit_cost, 0),
            weight_kg: Some(Decimal::new(5, 1)),
            currency: CurrencyCode::INR,
            updated_at: Utc::now(),
        }
    }

    fn rate_config(flat_rate: i64) -> ShippingRateConfig {
        ShippingRateConfig {
            product_uid: belt(),
            weight_kg: Decimal::new(5, 1),
            carrier: Carrier::new("Delhivery"),
            flat_rate: Decimal::new(flat_rate, 0),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_cancelled_order_never_charges_shipping() {
        let orders = vec![line("ORD-1", "Cancelled", 3, 900)];
        let prices = vec![price_config(100)];
        let rates = vec![rate_config(42)];
        let settings = EngineSettings::default();

        let report = calculate(
            &orders,
            &prices,
            &rates,
            &march_request(),
            Vec::new(),
            &settings,
        );

        assert_eq!(report.summary.shipping_total, Decimal::ZERO);
        assert_eq!(report.summary.orders_with_shipping_charges, 0);
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].shipping_cost, Decimal::ZERO);
    }

    #[test]
    fn test_delivered_cod_accrues_value_exactly() {
        let orders = vec![line("ORD-1", "Delivered", 2, 1198)];
        let settings = EngineSettings::default();

        let report = calculate(&orders, &[], &[], &march_request(), Vec::new(), &settings);

        // No multiplication by quantity beyond what the value encodes.
        assert_eq!(report.summary.cod_total, Decimal::new(1198, 0));
        assert_eq!(report.summary.orders_with_cod, 1);
        assert_eq!(report.rows[0].cod_received, Decimal::new(1198, 0));
    }

    #[test]
    fn test_delivered_prepaid_accrues_product_cost_not_cod() {
        let mut prepaid = line("ORD-2", "Delivered", 2, 700);
        prepaid.payment_mode = Some("Prepaid".to_owned());
        let prices = vec![price_config(50)];
        let settings = EngineSettings::default();

        let report = calculate(
            &[prepaid],
            &prices,
            &[],
            &march_request(),
            Vec::new(),
            &settings,
        );

        assert_eq!(report.summary.cod_total, Decimal::ZERO);
        assert_eq!(report.summary.orders_with_cod, 0);
        assert_eq!(report.summary.product_cost_total, Decimal::new(100, 0));
        assert_eq!(report.summary.orders_with_product_amount, 1);
    }

    #[test]
    fn test_shipping_is_qty_times_flat_rate() {
        let orders = vec![line("ORD-3", "In Transit", 4, 0)];
        let rates = vec![rate_config(42)];
        let prices = vec![price_config(0)];
        let settings = EngineSettings::default();

        let report = calculate(
            &orders,
            &prices,
            &rates,
            &march_request(),
            Vec::new(),
            &settings,
        );

        assert_eq!(report.summary.shipping_total, Decimal::new(168, 0));
        assert_eq!(report.summary.orders_with_shipping_charges, 1);
    }

    #[test]
    fn test_carrier_default_rate_for_unconfigured_product() {
        // Only the carrier default applies: qty 4 x default(delhivery) 45.
        let orders = vec![line("ORD-4", "In Transit", 4, 0)];
        let settings = EngineSettings::default();

        let report = calculate(&orders, &[], &[], &march_request(), Vec::new(), &settings);

        assert_eq!(report.summary.shipping_total, Decimal::new(180, 0));
    }

    #[test]
    fn test_zero_rate_does_not_count_order() {
        let orders = vec![line("ORD-5", "In Transit", 1, 0)];
        let rates = vec![rate_config(0)];
        let prices = vec![price_config(0)];
        let settings = EngineSettings::default();

        let report = calculate(
            &orders,
            &prices,
            &rates,
            &march_request(),
            Vec::new(),
            &settings,
        );

        assert_eq!(report.summary.shipping_total, Decimal::ZERO);
        assert_eq!(report.summary.orders_with_shipping_charges, 0);
    }

    #[test]
    fn test_final_payable_rounds_once_at_aggregate() {
        // cod 1000.6, shipping 200.4, product 50.0:
        // round(1000.6 - 200.4 - 50.0) = round(750.2) = 750.
        // Rounding each aggregate first would give 1001 - 200 - 50 = 751.
        let mut cod = line("ORD-6", "Delivered", 1, 0);
        cod.order_value = Decimal::new(10_006, 1);
        let mut shipped = line("ORD-7", "In Transit", 1, 0);
        shipped.delivered_date = None;

        let prices = vec![PriceConfig {
            unit_cost: Decimal::new(500, 1),
            ..price_config(0)
        }];
        let rates = vec![ShippingRateConfig {
            flat_rate: Decimal::new(2004, 1),
            ..rate_config(0)
        }];
        let settings = EngineSettings::default();

        let report = calculate(
            &[cod, shipped],
            &prices,
            &rates,
            &march_request(),
            Vec::new(),
            &settings,
        );

        assert_eq!(report.summary.cod_total, Decimal::new(10_006, 1));
        assert_eq!(report.summary.shipping_total, Decimal::new(2004, 1));
        assert_eq!(report.summary.product_cost_total, Decimal::new(500, 1));
        assert_eq!(report.summary.final_payable, Decimal::new(750, 0));
    }

    #[test]
    fn test_delivery_window_inclusive_end_of_day() {
        let mut order = line("ORD-8", "Delivered", 1, 500);
        order.delivered_date = Some(Utc.with_ymd_and_hms(2024, 3, 31, 23, 30, 0).unwrap());
        let settings = EngineSettings::default();

        let report = calculate(&[order], &[], &[], &march_request(), Vec::new(), &settings);

        assert_eq!(report.summary.cod_total, Decimal::new(500, 0));
    }

    #[test]
    fn test_deny_list_excludes_internal_accounts() {
        let mut internal = line("ORD-9", "Delivered", 1, 500);
        internal.dropshipper = Email::parse("OPS@codledger.internal").unwrap();
        let settings = EngineSettings::default();

        let report = calculate(
            &[internal],
            &[],
            &[],
            &march_request(),
            Vec::new(),
            &settings,
        );

        assert_eq!(report.summary.lines_considered, 0);
        assert!(report.rows.is_empty());
    }

    #[test]
    fn test_dropshipper_filter_case_insensitive() {
        let mine = line("ORD-10", "Delivered", 1, 500);
        let mut other = line("ORD-11", "Delivered", 1, 900);
        other.dropshipper = Email::parse("other@shop.com").unwrap();

        let request = PayoutRequest {
            dropshipper: Some("SELLER@SHOP.COM".to_owned()),
            ..march_request()
        };
        let settings = EngineSettings::default();

        let report = calculate(&[mine, other], &[], &[], &request, Vec::new(), &settings);

        assert_eq!(report.summary.cod_total, Decimal::new(500, 0));
        assert_eq!(report.summary.lines_considered, 1);
    }

    #[test]
    fn test_adjustments_merge_into_final_payable() {
        let orders = vec![line("ORD-12", "Delivered", 1, 1000)];
        let adjustments = vec![ReversalAdjustment {
            order_ref: "OLD-1".into(),
            product_uid: belt(),
            amount: Decimal::new(-300, 0),
            note: None,
        }];
        let settings = EngineSettings::default();

        let report = calculate(
            &orders,
            &[],
            &[],
            &march_request(),
            adjustments,
            &settings,
        );

        assert_eq!(report.summary.reversal_total, Decimal::new(-300, 0));
        // 1000 cod - 45 default shipping - 0 product - 300 reversal
        assert_eq!(report.summary.final_payable, Decimal::new(655, 0));
        assert_eq!(report.adjustments.len(), 1);
    }

    #[test]
    fn test_runs_with_no_configuration_at_all() {
        let orders = vec![
            line("ORD-13", "Delivered", 1, 800),
            line("ORD-14", "Cancelled", 2, 400),
        ];
        let settings = EngineSettings::default();

        let report = calculate(&orders, &[], &[], &march_request(), Vec::new(), &settings);

        assert_eq!(report.summary.lines_considered, 2);
        assert!(!report.summary.config_gaps.is_empty());
    }

    #[test]
    fn test_config_gaps_deduplicated() {
        let orders = vec![
            line("ORD-15", "Delivered", 1, 100),
            line("ORD-16", "Delivered", 1, 100),
        ];
        let settings = EngineSettings::default();

        let report = calculate(&orders, &[], &[], &march_request(), Vec::new(), &settings);

        let unit_cost_gaps = report
            .summary
            .config_gaps
            .iter()
            .filter(|g| g.kind == crate::models::ConfigGapKind::MissingUnitCost)
            .count();
        assert_eq!(unit_cost_gaps, 1);
    }
}
