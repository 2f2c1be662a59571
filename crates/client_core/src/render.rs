use shared::{
    domain::{AccountRecord, TransactionEntry},
    money::format_peso,
};

use crate::Screen;

const TITLE: &str = "RFID ATM";
const RULE: &str = "----------------------------------------";

pub fn render(screen: &Screen) -> String {
    let mut out = String::new();
    out.push_str(&format!("==== {TITLE} ====\n"));

    match screen {
        Screen::TapCard { notice } => {
            out.push_str("\n  Please tap your card\n\n");
            push_notice(&mut out, notice.as_deref());
        }
        Screen::Dashboard { account, notice } => {
            push_account(&mut out, account);
            push_notice(&mut out, notice.as_deref());
        }
    }
    out
}

fn push_account(out: &mut String, account: &AccountRecord) {
    out.push_str(&format!("Welcome, {}\n", account.name));
    out.push_str(&format!("Card:     {}\n", account.masked_card_number()));
    out.push_str(&format!("Account:  {}\n", account.account_type));
    out.push_str(&format!("Balance:  {}\n", format_peso(account.balance)));
    out.push_str(RULE);
    out.push('\n');
    out.push_str("Recent transactions\n");
    if account.transactions.is_empty() {
        out.push_str("  (none)\n");
    }
    for entry in &account.transactions {
        out.push_str(&transaction_line(entry));
    }
    out.push_str(RULE);
    out.push('\n');
}

fn transaction_line(entry: &TransactionEntry) -> String {
    format!(
        "  {}  {:<14} {:>12}  {:>12}\n",
        entry.date,
        entry.kind,
        format_peso(entry.amount),
        format_peso(entry.balance)
    )
}

fn push_notice(out: &mut String, notice: Option<&str>) {
    if let Some(notice) = notice {
        out.push_str(&format!("! {notice}\n"));
    }
}
