//! Normalization boundary for uploaded order rows.
//!
//! Sheet parsing itself happens upstream; this module receives raw cell
//! text and turns it into typed [`NewOrderLine`] values. Normalization
//! never drops a row: an unparseable field degrades to a placeholder and
//! increments a warning counter, so one bad cell cannot silently shrink a
//! settlement window.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use tracing::warn;

use codledger_core::{Carrier, Email, OrderRef, ProductUid, Waybill};

/// Placeholder account for rows whose dropshipper cell is unusable.
///
/// Keeps the row visible in all-dropshipper reports instead of losing it;
/// the warning count tells operators to fix the sheet.
const UNMATCHED_ACCOUNT: &str = "unmatched@codledger.invalid";

/// One raw row as handed over by the upload layer. All cells are text.
#[derive(Debug, Clone, Default)]
pub struct RawOrderRow {
    pub order_ref: String,
    pub waybill: Option<String>,
    pub dropshipper: String,
    pub product_name: String,
    pub sku: Option<String>,
    pub quantity: Option<String>,
    pub order_value: Option<String>,
    pub payment_mode: Option<String>,
    pub status: Option<String>,
    pub order_date: Option<String>,
    pub delivered_date: Option<String>,
    pub return_initiated_date: Option<String>,
    pub carrier: Option<String>,
}

/// A normalized order line ready for insertion.
///
/// `upload_batch` and `ingest_seq` are assigned at insert time by
/// [`crate::OrderRepository::ingest`].
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub order_ref: OrderRef,
    pub waybill: Option<Waybill>,
    pub dropshipper: Email,
    pub product_uid: ProductUid,
    pub product_name: String,
    pub sku: Option<String>,
    pub quantity: i32,
    pub order_value: Decimal,
    pub payment_mode: Option<String>,
    pub status: String,
    pub order_date: DateTime<Utc>,
    pub delivered_date: Option<DateTime<Utc>>,
    pub return_initiated_date: Option<DateTime<Utc>>,
    pub carrier: Carrier,
}

/// Per-field warning counters for one normalization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestWarnings {
    /// Dropshipper cell empty or not an email; placeholder account used.
    pub invalid_email: usize,
    /// Quantity cell unparseable or non-positive; defaulted to 1.
    pub unparseable_quantity: usize,
    /// Monetary value cell unparseable; defaulted to zero.
    pub unparseable_value: usize,
    /// Date cell present but unparseable.
    pub unparseable_date: usize,
}

impl IngestWarnings {
    /// Total warnings across all counters.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.invalid_email
            + self.unparseable_quantity
            + self.unparseable_value
            + self.unparseable_date
    }
}

/// Normalize a batch of raw rows. Every input row produces exactly one
/// output line; `received_at` is the placeholder for a missing or
/// unparseable order date.
#[must_use]
pub fn normalize_rows(
    rows: &[RawOrderRow],
    received_at: DateTime<Utc>,
) -> (Vec<NewOrderLine>, IngestWarnings) {
    let mut warnings = IngestWarnings::default();
    let lines = rows
        .iter()
        .map(|row| normalize_row(row, received_at, &mut warnings))
        .collect();
    if warnings.total() > 0 {
        warn!(
            invalid_email = warnings.invalid_email,
            unparseable_quantity = warnings.unparseable_quantity,
            unparseable_value = warnings.unparseable_value,
            unparseable_date = warnings.unparseable_date,
            "upload contained unparseable cells"
        );
    }
    (lines, warnings)
}

fn normalize_row(
    row: &RawOrderRow,
    received_at: DateTime<Utc>,
    warnings: &mut IngestWarnings,
) -> NewOrderLine {
    let dropshipper = match Email::parse(&row.dropshipper) {
        Ok(email) => email,
        Err(_) => {
            warnings.invalid_email += 1;
            // Validated constant.
            #[allow(clippy::unwrap_used)]
            Email::parse(UNMATCHED_ACCOUNT).unwrap()
        }
    };

    let quantity = row
        .quantity
        .as_deref()
        .and_then(|q| q.trim().parse::<i32>().ok())
        .filter(|q| *q > 0)
        .unwrap_or_else(|| {
            if row.quantity.is_some() {
                warnings.unparseable_quantity += 1;
            }
            1
        });

    let order_value = row
        .order_value
        .as_deref()
        .map_or(Decimal::ZERO, |v| parse_money(v, warnings));

    let order_date = row.order_date.as_deref().map_or(received_at, |raw| {
        parse_timestamp(raw).unwrap_or_else(|| {
            warnings.unparseable_date += 1;
            received_at
        })
    });

    NewOrderLine {
        order_ref: OrderRef::new(row.order_ref.as_str()),
        waybill: nonempty(row.waybill.as_deref()).map(Waybill::new),
        product_uid: ProductUid::derive(&dropshipper, &row.product_name),
        dropshipper,
        product_name: row.product_name.trim().to_owned(),
        sku: nonempty(row.sku.as_deref()).map(str::to_owned),
        quantity,
        order_value,
        payment_mode: nonempty(row.payment_mode.as_deref()).map(str::to_owned),
        status: row.status.as_deref().unwrap_or_default().trim().to_owned(),
        order_date,
        delivered_date: optional_timestamp(row.delivered_date.as_deref(), warnings),
        return_initiated_date: optional_timestamp(row.return_initiated_date.as_deref(), warnings),
        carrier: Carrier::new(row.carrier.as_deref().unwrap_or_default()),
    }
}

fn nonempty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_money(raw: &str, warnings: &mut IngestWarnings) -> Decimal {
    // Sheets write amounts with currency symbols and thousands separators.
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse().unwrap_or_else(|_| {
        if !raw.trim().is_empty() {
            warnings.unparseable_value += 1;
        }
        Decimal::ZERO
    })
}

fn optional_timestamp(
    raw: Option<&str>,
    warnings: &mut IngestWarnings,
) -> Option<DateTime<Utc>> {
    let raw = nonempty(raw)?;
    let parsed = parse_timestamp(raw);
    if parsed.is_none() {
        warnings.unparseable_date += 1;
    }
    parsed
}

/// Accept the timestamp formats seen in carrier and panel exports.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    for format in ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn raw() -> RawOrderRow {
        RawOrderRow {
            order_ref: " ORD-1 ".to_owned(),
            waybill: Some("WB-9".to_owned()),
            dropshipper: "Seller@Shop.com".to_owned(),
            product_name: "Posture Belt".to_owned(),
            sku: Some("PB-L".to_owned()),
            quantity: Some("2".to_owned()),
            order_value: Some("₹1,198.00".to_owned()),
            payment_mode: Some("COD".to_owned()),
            status: Some("Delivered".to_owned()),
            order_date: Some("2024-03-10".to_owned()),
            delivered_date: Some("2024-03-15 18:30:00".to_owned()),
            return_initiated_date: None,
            carrier: Some("Delhivery".to_owned()),
        }
    }

    #[test]
    fn test_clean_row_has_no_warnings() {
        let (lines, warnings) = normalize_rows(&[raw()], Utc::now());
        assert_eq!(warnings.total(), 0);
        assert_eq!(lines.len(), 1);

        let line = &lines[0];
        assert_eq!(line.order_ref.as_str(), "ORD-1");
        assert_eq!(line.quantity, 2);
        assert_eq!(line.order_value, Decimal::new(1198, 0));
        assert_eq!(
            line.product_uid.as_str(),
            "seller@shop.com::posture-belt"
        );
    }

    #[test]
    fn test_bad_quantity_defaults_to_one() {
        let mut row = raw();
        row.quantity = Some("two".to_owned());
        let (lines, warnings) = normalize_rows(&[row], Utc::now());
        assert_eq!(lines[0].quantity, 1);
        assert_eq!(warnings.unparseable_quantity, 1);
    }

    #[test]
    fn test_bad_value_defaults_to_zero() {
        let mut row = raw();
        row.order_value = Some("n/a".to_owned());
        let (lines, warnings) = normalize_rows(&[row], Utc::now());
        assert_eq!(lines[0].order_value, Decimal::ZERO);
        assert_eq!(warnings.unparseable_value, 1);
    }

    #[test]
    fn test_bad_order_date_uses_received_at() {
        let received = Utc::now();
        let mut row = raw();
        row.order_date = Some("soon".to_owned());
        let (lines, warnings) = normalize_rows(&[row], received);
        assert_eq!(lines[0].order_date, received);
        assert_eq!(warnings.unparseable_date, 1);
    }

    #[test]
    fn test_invalid_email_uses_placeholder() {
        let mut row = raw();
        row.dropshipper = "not-an-email".to_owned();
        let (lines, warnings) = normalize_rows(&[row], Utc::now());
        assert_eq!(lines[0].dropshipper.as_str(), UNMATCHED_ACCOUNT);
        assert_eq!(warnings.invalid_email, 1);
    }

    #[test]
    fn test_rows_are_never_dropped() {
        let bad = RawOrderRow {
            order_ref: "ORD-2".to_owned(),
            ..RawOrderRow::default()
        };
        let (lines, warnings) = normalize_rows(&[raw(), bad], Utc::now());
        assert_eq!(lines.len(), 2);
        assert!(warnings.total() > 0);
    }

    #[test]
    fn test_timestamp_formats() {
        assert!(parse_timestamp("2024-03-10T12:00:00Z").is_some());
        assert!(parse_timestamp("2024-03-10 12:00:00").is_some());
        assert!(parse_timestamp("10/03/2024").is_some());
        assert!(parse_timestamp("10-03-2024").is_some());
        assert!(parse_timestamp("March 10").is_none());
    }
}
