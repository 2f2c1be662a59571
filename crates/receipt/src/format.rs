use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use shared::{domain::mask_card_number, money::format_php, protocol::PrintRequest};

use crate::escpos::{Alignment, Command};

/// Characters per line on a 58 mm printer at normal size.
pub const LINE_WIDTH: usize = 32;

const BANK_NAME: &str = "RFID ATM DEMO";
const RECEIPT_TITLE: &str = "Balance Inquiry";
const THANK_YOU: &str = "Thank you for banking with us!";
const DISCLAIMER: &str = "Demo only. Not a bank record.";
const UNKNOWN_NAME: &str = "Valued Customer";
const UNKNOWN_FIELD: &str = "N/A";

/// What a receipt prints. The timestamp is part of the input so formatting
/// stays a pure function.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptSnapshot {
    pub name: Option<String>,
    pub card_number: Option<String>,
    pub account_type: Option<String>,
    pub balance: Option<Decimal>,
    pub issued_at: NaiveDateTime,
}

impl ReceiptSnapshot {
    pub fn from_request(request: &PrintRequest, issued_at: NaiveDateTime) -> Self {
        Self {
            name: request.name.clone(),
            card_number: request.card_number.clone(),
            account_type: request.account_type.clone(),
            balance: request.balance,
            issued_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Command(Command),
    Text(String),
}

impl Segment {
    /// Text goes out as ASCII; anything outside it prints as `?`.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Segment::Command(command) => command.bytes(),
            Segment::Text(text) => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
        }
    }
}

pub fn format(snapshot: &ReceiptSnapshot) -> Vec<Segment> {
    let rule = "-".repeat(LINE_WIDTH);
    let name = non_empty(snapshot.name.as_deref()).unwrap_or(UNKNOWN_NAME);
    let card = non_empty(snapshot.card_number.as_deref())
        .map(mask_card_number)
        .unwrap_or_else(|| UNKNOWN_FIELD.to_string());
    let account_type = non_empty(snapshot.account_type.as_deref()).unwrap_or(UNKNOWN_FIELD);
    let balance = snapshot
        .balance
        .map(format_php)
        .unwrap_or_else(|| "PHP --".to_string());

    let mut segments = vec![
        Segment::Command(Command::Initialize),
        Segment::Command(Command::Align(Alignment::Center)),
        Segment::Command(Command::Bold(true)),
        line(BANK_NAME),
        Segment::Command(Command::Bold(false)),
        line(RECEIPT_TITLE),
        line(&rule),
        Segment::Command(Command::Align(Alignment::Left)),
    ];

    segments.push(line(&key_value("Name", name)));
    segments.push(line(&key_value("Card", &card)));
    segments.push(line(&key_value("Account", account_type)));
    segments.push(line(&key_value(
        "Date",
        &snapshot.issued_at.format("%Y-%m-%d %H:%M").to_string(),
    )));

    segments.extend([
        line(&rule),
        Segment::Command(Command::Align(Alignment::Center)),
        line("AVAILABLE BALANCE"),
        Segment::Command(Command::CharacterSize {
            width: 2,
            height: 2,
        }),
        Segment::Command(Command::Bold(true)),
        line(&balance),
        Segment::Command(Command::Bold(false)),
        Segment::Command(Command::CharacterSize {
            width: 1,
            height: 1,
        }),
        line(&rule),
        line(THANK_YOU),
        line(DISCLAIMER),
        Segment::Command(Command::Feed(3)),
        Segment::Command(Command::Cut),
    ]);

    segments
}

/// The whole receipt as one byte stream.
pub fn render_bytes(segments: &[Segment]) -> Vec<u8> {
    segments.iter().flat_map(Segment::to_bytes).collect()
}

fn line(text: &str) -> Segment {
    Segment::Text(format!("{text}\n"))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `label` on the left, `value` flush right; falls back to a single space
/// between them when the pair is wider than a line.
fn key_value(label: &str, value: &str) -> String {
    let used = label.chars().count() + value.chars().count();
    let gap = LINE_WIDTH.saturating_sub(used).max(1);
    format!("{label}{}{value}", " ".repeat(gap))
}

#[cfg(test)]
#[path = "tests/format_tests.rs"]
mod tests;
