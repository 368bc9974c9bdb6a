use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::SalaryConfig;

/// Currencies accepted on the Direct Hire salary field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Php,
    Usd,
    Eur,
    Gbp,
    Jpy,
    Hkd,
    Sgd,
    Cad,
    Aud,
    Sar,
    Aed,
    Qar,
    Kwd,
}

impl Currency {
    pub const ALL: [Currency; 13] = [
        Currency::Php,
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Jpy,
        Currency::Hkd,
        Currency::Sgd,
        Currency::Cad,
        Currency::Aud,
        Currency::Sar,
        Currency::Aed,
        Currency::Qar,
        Currency::Kwd,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            Currency::Php => "PHP",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Hkd => "HKD",
            Currency::Sgd => "SGD",
            Currency::Cad => "CAD",
            Currency::Aud => "AUD",
            Currency::Sar => "SAR",
            Currency::Aed => "AED",
            Currency::Qar => "QAR",
            Currency::Kwd => "KWD",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|currency| currency.code().eq_ignore_ascii_case(code))
    }

    /// USD value of one unit, used when no override is configured.
    const fn default_usd_rate(self) -> f64 {
        match self {
            Currency::Php => 0.0175,
            Currency::Usd => 1.0,
            Currency::Eur => 1.08,
            Currency::Gbp => 1.27,
            Currency::Jpy => 0.0067,
            Currency::Hkd => 0.128,
            Currency::Sgd => 0.74,
            Currency::Cad => 0.73,
            Currency::Aud => 0.66,
            Currency::Sar => 0.2667,
            Currency::Aed => 0.2723,
            Currency::Qar => 0.2747,
            Currency::Kwd => 3.25,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonetaryAmount {
    pub amount: f64,
    pub currency: Currency,
}

impl MonetaryAmount {
    pub fn new(amount: f64, currency: Currency) -> Self {
        Self { amount, currency }
    }
}

impl fmt::Display for MonetaryAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.2}", self.currency, self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SalaryError {
    #[error("unknown currency code '{0}'")]
    UnknownCurrency(String),
    #[error("amount must be a finite number")]
    InvalidAmount,
}

/// USD-anchored exchange table used to normalise declared salaries.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRates {
    usd_per_unit: BTreeMap<Currency, f64>,
}

impl Default for ExchangeRates {
    fn default() -> Self {
        let usd_per_unit = Currency::ALL
            .into_iter()
            .map(|currency| (currency, currency.default_usd_rate()))
            .collect();
        Self { usd_per_unit }
    }
}

impl ExchangeRates {
    pub fn from_config(config: &SalaryConfig) -> Result<Self, SalaryError> {
        let mut rates = Self::default();
        for (code, rate) in &config.usd_rates {
            let currency =
                Currency::parse(code).ok_or_else(|| SalaryError::UnknownCurrency(code.clone()))?;
            if currency != Currency::Usd {
                rates.usd_per_unit.insert(currency, *rate);
            }
        }
        Ok(rates)
    }

    pub fn usd_rate(&self, currency: Currency) -> f64 {
        self.usd_per_unit
            .get(&currency)
            .copied()
            .unwrap_or_else(|| currency.default_usd_rate())
    }

    /// Converts through USD and rounds to centavos/cents.
    pub fn convert(
        &self,
        value: MonetaryAmount,
        target: Currency,
    ) -> Result<MonetaryAmount, SalaryError> {
        if !value.amount.is_finite() {
            return Err(SalaryError::InvalidAmount);
        }
        if value.currency == target {
            return Ok(MonetaryAmount::new(round_cents(value.amount), target));
        }
        let usd = value.amount * self.usd_rate(value.currency);
        let converted = usd / self.usd_rate(target);
        Ok(MonetaryAmount::new(round_cents(converted), target))
    }

    pub fn to_usd(&self, value: MonetaryAmount) -> Result<MonetaryAmount, SalaryError> {
        self.convert(value, Currency::Usd)
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
