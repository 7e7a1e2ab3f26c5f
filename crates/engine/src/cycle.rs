//! Payment cycle resolution.
//!
//! A cycle definition is pure schedule metadata; resolving it produces the
//! concrete [`DateWindow`] a payout calculation runs over. Resolution never
//! fails: an unrecognized cycle kind degrades to a trailing 30-day window.

use chrono::{Days, NaiveDate};

use crate::models::{DateWindow, PaymentCycle};

/// Fallback period, in days, for unrecognized cycle kinds.
const FALLBACK_PERIOD_DAYS: u64 = 30;

/// Resolve a cycle to the trailing window it covers as of a given day.
///
/// The window ends `offset_days` before `as_of` (settlement lag) and spans
/// the cycle's period length, both bounds inclusive. A daily cycle with no
/// offset resolves to the single day `as_of`. An unrecognized kind means
/// the stored offset can't be trusted either, so the fallback window is a
/// plain trailing 30 days ending at `as_of`.
#[must_use]
pub fn resolve_window(cycle: &PaymentCycle, as_of: NaiveDate) -> DateWindow {
    let (period, to) = match cycle.kind.period_days() {
        Some(days) => {
            let offset = u64::try_from(cycle.offset_days.max(0)).unwrap_or(0);
            let to = as_of.checked_sub_days(Days::new(offset)).unwrap_or(as_of);
            (u64::try_from(days).unwrap_or(FALLBACK_PERIOD_DAYS), to)
        }
        None => (FALLBACK_PERIOD_DAYS, as_of),
    };
    let from = to.checked_sub_days(Days::new(period - 1)).unwrap_or(to);

    DateWindow::new(from, to)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use codledger_core::{Email, PaymentCycleId};

    use crate::models::CycleKind;

    use super::*;

    fn cycle(kind: CycleKind, offset_days: i64) -> PaymentCycle {
        PaymentCycle {
            id: PaymentCycleId::new(1),
            dropshipper: Email::parse("seller@shop.com").unwrap(),
            name: "default".to_owned(),
            kind,
            offset_days,
            updated_at: Utc::now(),
        }
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_daily_no_offset_is_single_day() {
        let window = resolve_window(&cycle(CycleKind::Daily, 0), day("2024-03-15"));
        assert_eq!(window, DateWindow::new(day("2024-03-15"), day("2024-03-15")));
    }

    #[test]
    fn test_weekly_with_offset() {
        let window = resolve_window(&cycle(CycleKind::Weekly, 2), day("2024-03-15"));
        assert_eq!(window, DateWindow::new(day("2024-03-07"), day("2024-03-13")));
    }

    #[test]
    fn test_biweekly_spans_fourteen_days() {
        let window = resolve_window(&cycle(CycleKind::Biweekly, 0), day("2024-03-15"));
        assert_eq!(window, DateWindow::new(day("2024-03-02"), day("2024-03-15")));
    }

    #[test]
    fn test_monthly_is_trailing_thirty_days() {
        let window = resolve_window(&cycle(CycleKind::Monthly, 0), day("2024-03-15"));
        assert_eq!(window, DateWindow::new(day("2024-02-15"), day("2024-03-15")));
    }

    #[test]
    fn test_unrecognized_kind_falls_back_to_thirty_days() {
        let kind = CycleKind::parse("quarterly");
        let window = resolve_window(&cycle(kind, 0), day("2024-03-15"));
        assert_eq!(window, DateWindow::new(day("2024-02-15"), day("2024-03-15")));
    }

    #[test]
    fn test_unrecognized_kind_ignores_offset() {
        let kind = CycleKind::parse("quarterly");
        let window = resolve_window(&cycle(kind, 5), day("2024-03-15"));
        assert_eq!(window, DateWindow::new(day("2024-02-15"), day("2024-03-15")));
    }

    #[test]
    fn test_negative_offset_treated_as_zero() {
        let window = resolve_window(&cycle(CycleKind::Daily, -3), day("2024-03-15"));
        assert_eq!(window.to, day("2024-03-15"));
    }
}
