use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use receipt::{MemoryPrinter, ReceiptPrinter, ReceiptSnapshot, SerialPrinter};
use shared::{money::format_peso, protocol::PrintRequest};
use storage::UserStore;

#[derive(Parser, Debug)]
struct Cli {
    /// User store file; the built-in demo accounts when omitted.
    #[arg(long)]
    users_path: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every account in the store.
    Users,
    /// Format a receipt for one account and dump its ESC/POS bytes.
    Receipt {
        #[arg(long)]
        uid: String,
        /// Receipt timestamp as `YYYY-MM-DD HH:MM`; defaults to now.
        #[arg(long)]
        at: Option<String>,
        /// Also send the receipt to this serial printer.
        #[arg(long)]
        printer_port: Option<String>,
        #[arg(long, default_value_t = 9600)]
        baud_rate: u32,
    },
    /// Check that a user store file loads.
    Validate { path: PathBuf },
}

fn load_store(path: Option<&PathBuf>) -> Result<UserStore> {
    match path {
        Some(path) => UserStore::from_path(path)
            .with_context(|| format!("loading user store {}", path.display())),
        None => UserStore::builtin().context("loading built-in user store"),
    }
}

fn parse_issued_at(raw: Option<&str>) -> Result<NaiveDateTime> {
    match raw {
        Some(raw) => NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M")
            .with_context(|| format!("invalid --at '{raw}', expected YYYY-MM-DD HH:MM")),
        None => Ok(Local::now().naive_local()),
    }
}

fn user_lines(store: &UserStore) -> Vec<String> {
    store
        .uids()
        .iter()
        .filter_map(|uid| store.resolve(uid.as_str()).ok())
        .map(|account| {
            format!(
                "{:<10} {:<20} {:<10} {:>14}  {} txns",
                account.uid.as_str(),
                account.name,
                account.account_type,
                format_peso(account.balance),
                account.transactions.len()
            )
        })
        .collect()
}

fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (row, chunk) in bytes.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        let ascii: String = chunk
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        out.push_str(&format!("{:08x}  {:<47}  |{}|\n", row * 16, hex.join(" "), ascii));
    }
    out
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Users => {
            let store = load_store(cli.users_path.as_ref())?;
            for line in user_lines(&store) {
                println!("{line}");
            }
            println!("{} accounts", store.len());
        }
        Command::Receipt {
            uid,
            at,
            printer_port,
            baud_rate,
        } => {
            let store = load_store(cli.users_path.as_ref())?;
            let account = store.resolve(&uid)?;
            let snapshot = ReceiptSnapshot::from_request(
                &PrintRequest::from(account),
                parse_issued_at(at.as_deref())?,
            );
            let segments = receipt::format(&snapshot);

            let memory = MemoryPrinter::new();
            let written = receipt::print_receipt(&memory, &segments).await?;
            print!("{}", hex_dump(&memory.bytes()));
            println!("{} segments, {written} bytes", segments.len());

            if let Some(port) = printer_port {
                let printer = SerialPrinter::open(&port, baud_rate)?;
                receipt::print_receipt(&printer, &segments).await?;
                println!("sent to {}", printer.describe());
            }
        }
        Command::Validate { path } => {
            let store = load_store(Some(&path))?;
            println!("{}: {} accounts ok", path.display(), store.len());
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
