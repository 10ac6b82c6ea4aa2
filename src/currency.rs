//! Currency types

use crate::error::{LiquidityError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Currency enumeration (ISO 4217 codes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Currency {
    /// US Dollar
    USD,
    /// Euro
    EUR,
    /// British Pound
    GBP,
    /// Japanese Yen
    JPY,
    /// Chinese Yuan
    CNY,
    /// Swiss Franc
    CHF,
    /// Canadian Dollar
    CAD,
    /// Australian Dollar
    AUD,
    /// New Zealand Dollar
    NZD,
    /// Hong Kong Dollar
    HKD,
    /// Singapore Dollar
    SGD,
    /// South Korean Won
    KRW,
    /// Indian Rupee
    INR,
    /// Brazilian Real
    BRL,
    /// Mexican Peso
    MXN,
    /// South African Rand
    ZAR,
    /// Swedish Krona
    SEK,
    /// Norwegian Krone
    NOK,
}

impl Currency {
    /// Get ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::CNY => "CNY",
            Currency::CHF => "CHF",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
            Currency::NZD => "NZD",
            Currency::HKD => "HKD",
            Currency::SGD => "SGD",
            Currency::KRW => "KRW",
            Currency::INR => "INR",
            Currency::BRL => "BRL",
            Currency::MXN => "MXN",
            Currency::ZAR => "ZAR",
            Currency::SEK => "SEK",
            Currency::NOK => "NOK",
        }
    }

    /// Get currency symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::EUR => "€",
            Currency::GBP => "£",
            Currency::JPY => "¥",
            Currency::CNY => "¥",
            Currency::CHF => "CHF",
            Currency::CAD => "C$",
            Currency::AUD => "A$",
            Currency::NZD => "NZ$",
            Currency::HKD => "HK$",
            Currency::SGD => "S$",
            Currency::KRW => "₩",
            Currency::INR => "₹",
            Currency::BRL => "R$",
            Currency::MXN => "Mex$",
            Currency::ZAR => "R",
            Currency::SEK => "kr",
            Currency::NOK => "kr",
        }
    }

    /// USD is the identity case: no rate lookup is needed
    pub fn is_usd(&self) -> bool {
        *self == Currency::USD
    }

    /// Yahoo Finance ticker of the `{CODE}USD` daily rate, e.g. `JPYUSD=X`
    pub fn yahoo_fx_symbol(&self) -> String {
        format!("{}USD=X", self.code())
    }

    /// Get all supported currencies
    pub fn all() -> Vec<Currency> {
        vec![
            Currency::USD,
            Currency::EUR,
            Currency::GBP,
            Currency::JPY,
            Currency::CNY,
            Currency::CHF,
            Currency::CAD,
            Currency::AUD,
            Currency::NZD,
            Currency::HKD,
            Currency::SGD,
            Currency::KRW,
            Currency::INR,
            Currency::BRL,
            Currency::MXN,
            Currency::ZAR,
            Currency::SEK,
            Currency::NOK,
        ]
    }
}

impl FromStr for Currency {
    type Err = LiquidityError;

    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim().to_uppercase();
        Currency::all()
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| LiquidityError::InvalidInput(format!("Unknown currency: {}", s)))
    }
}

impl TryFrom<String> for Currency {
    type Error = LiquidityError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.code().to_string()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
