//! Payment cycle definitions and date windows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use codledger_core::{Email, PaymentCycleId};

/// An inclusive calendar-day window.
///
/// Both bounds are whole days; a timestamp on the `to` date counts as
/// inside the window through 23:59:59. This is how the delivered-date
/// upper bound stays inclusive of the entire final day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    /// First day, inclusive.
    pub from: NaiveDate,
    /// Last day, inclusive through end-of-day.
    pub to: NaiveDate,
}

impl DateWindow {
    /// Create a window. `from` and `to` may be equal (single day).
    #[must_use]
    pub const fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// Whether a timestamp falls inside the window.
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        let day = ts.date_naive();
        day >= self.from && day <= self.to
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.from, self.to)
    }
}

/// Supported payment cycle kinds.
///
/// Unrecognized kinds are carried as [`CycleKind::Other`] and resolve to a
/// trailing 30-day window rather than failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleKind {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    /// Anything the parser did not recognize; retained verbatim.
    Other(String),
}

impl CycleKind {
    /// Parse a stored cycle kind string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "daily" => Self::Daily,
            "weekly" => Self::Weekly,
            "biweekly" | "bi-weekly" | "fortnightly" => Self::Biweekly,
            "monthly" => Self::Monthly,
            other => Self::Other(other.to_owned()),
        }
    }

    /// The cycle's period length in days, if the kind is recognized.
    #[must_use]
    pub fn period_days(&self) -> Option<i64> {
        match self {
            Self::Daily => Some(1),
            Self::Weekly => Some(7),
            Self::Biweekly => Some(14),
            Self::Monthly => Some(30),
            Self::Other(_) => None,
        }
    }
}

impl std::fmt::Display for CycleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Biweekly => write!(f, "biweekly"),
            Self::Monthly => write!(f, "monthly"),
            Self::Other(raw) => write!(f, "{raw}"),
        }
    }
}

/// A named, per-dropshipper recurring payout schedule.
///
/// Stateless with respect to the aggregation engine: it only ever turns
/// into a concrete [`DateWindow`] before a calculation runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCycle {
    /// Storage row ID.
    pub id: PaymentCycleId,
    /// Dropshipper this schedule belongs to.
    pub dropshipper: Email,
    /// Human-readable schedule name.
    pub name: String,
    /// Cycle kind.
    pub kind: CycleKind,
    /// Days to shift the window back from the as-of date (settlement lag).
    pub offset_days: i64,
    /// When the cycle was last updated.
    pub updated_at: DateTime<Utc>,
}
