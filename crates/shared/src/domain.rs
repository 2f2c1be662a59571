use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(pub String);

impl Uid {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Uppercase hex of the raw tag bytes, the form readers report.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.iter().map(|b| format!("{b:02X}")).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Uid {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub uid: Uid,
    pub card_number: String,
    pub name: String,
    pub account_type: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    #[serde(default)]
    pub transactions: Vec<TransactionEntry>,
}

impl AccountRecord {
    pub fn masked_card_number(&self) -> String {
        mask_card_number(&self.card_number)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEntry {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Running balance right after this entry.
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub rfid: bool,
    pub printer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetection {
    pub uid: Uid,
    pub timestamp: DateTime<Utc>,
}

impl CardDetection {
    pub fn now(uid: Uid) -> Self {
        Self {
            uid,
            timestamp: Utc::now(),
        }
    }
}

/// Keeps the last four digits, e.g. `**** **** **** 3456`.
pub fn mask_card_number(card_number: &str) -> String {
    let digits: Vec<char> = card_number.chars().filter(char::is_ascii_digit).collect();
    if digits.len() <= 4 {
        return card_number.to_string();
    }
    let last_four: String = digits[digits.len() - 4..].iter().collect();
    format!("**** **** **** {last_four}")
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
