use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{AccountRecord, ServiceStatus, TransactionEntry, Uid};

pub const PRINTED_MESSAGE: &str = "Receipt printed successfully";
pub const MOCK_PRINT_MESSAGE: &str = "Mock print (printer not connected)";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub services: ServiceStatus,
    pub timestamp: DateTime<Utc>,
}

/// Body of `POST /api/print`: any subset of an account record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<Uid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub balance: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transactions: Vec<TransactionEntry>,
}

impl From<&AccountRecord> for PrintRequest {
    fn from(account: &AccountRecord) -> Self {
        Self {
            uid: Some(account.uid.clone()),
            card_number: Some(account.card_number.clone()),
            name: Some(account.name.clone()),
            account_type: Some(account.account_type.clone()),
            balance: Some(account.balance),
            transactions: account.transactions.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Connected {
        services: ServiceStatus,
    },
    CardDetected {
        uid: Uid,
        timestamp: DateTime<Utc>,
    },
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
