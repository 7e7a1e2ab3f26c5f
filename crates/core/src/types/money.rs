//! Money representation using decimal arithmetic.
//!
//! All monetary values flow through `rust_decimal::Decimal`; the engine
//! never touches floating point. Summary totals are rounded exactly once,
//! at the aggregate level, using [`Money::round_whole`].

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// An amount with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Money {
    /// Amount in the currency's standard unit (e.g., rupees, not paise).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Zero in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency_code,
        }
    }

    /// Round to the nearest whole currency unit, half away from zero.
    ///
    /// Payout summaries round once at the aggregate to avoid compounding
    /// per-row rounding error.
    #[must_use]
    pub fn round_whole(self) -> Self {
        Self {
            amount: round_whole(self.amount),
            currency_code: self.currency_code,
        }
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency_code.code())
    }
}

/// Round a raw decimal to the nearest whole unit, half away from zero.
#[must_use]
pub fn round_whole(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    /// COD collection and carrier remittance both settle in INR for the
    /// supported last-mile carriers, so INR is the default.
    #[default]
    INR,
    USD,
    EUR,
    GBP,
    AED,
}

impl CurrencyCode {
    /// The ISO 4217 code as a string.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::INR => "INR",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::AED => "AED",
        }
    }

    /// Parse a stored ISO 4217 code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "INR" => Some(Self::INR),
            "USD" => Some(Self::USD),
            "EUR" => Some(Self::EUR),
            "GBP" => Some(Self::GBP),
            "AED" => Some(Self::AED),
            _ => None,
        }
    }
}
