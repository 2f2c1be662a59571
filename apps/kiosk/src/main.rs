use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use client_core::{render, AtmBackend, AtmSession, HttpBackend, MockBackend};
use shared::{domain::Uid, protocol::ServerEvent};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{info, warn};

const HELP: &str = "commands: scan | tap <UID> | print | logout | health | help | quit";

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:3001")]
    server_url: String,
    /// Run without a server: built-in accounts, mock card rotation, mock printing.
    #[arg(long)]
    mock: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Scan,
    Tap(Uid),
    Print,
    Logout,
    Health,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "scan" => Command::Scan,
        "tap" => match words.next() {
            Some(uid) => Command::Tap(Uid::new(uid.to_ascii_uppercase())),
            None => return Err("usage: tap <UID>".to_string()),
        },
        "print" => Command::Print,
        "logout" => Command::Logout,
        "health" => Command::Health,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '{other}'")),
    };

    if words.next().is_some() {
        return Err(format!("too many arguments for '{verb}'"));
    }
    Ok(Some(command))
}

fn draw(session: &AtmSession) {
    let services = session.services();
    println!();
    print!("{}", render(session.screen()));
    println!(
        "[reader: {}] [printer: {}]",
        online(services.rfid),
        online(services.printer)
    );
    println!("{HELP}");
}

fn online(flag: bool) -> &'static str {
    if flag {
        "online"
    } else {
        "offline"
    }
}

async fn next_event(events: &mut Option<mpsc::UnboundedReceiver<ServerEvent>>) -> Option<ServerEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Runs one command. Returns `false` when the kiosk should exit.
async fn run_command(session: &mut AtmSession, command: Command) -> bool {
    let outcome = match command {
        Command::Scan => session.scan().await.map(|_| ()),
        Command::Tap(uid) => session.on_card_detected(&uid).await.map(|_| ()),
        Command::Print => session.print().await.map(|_| ()),
        Command::Logout => {
            session.logout();
            Ok(())
        }
        Command::Health => session.refresh_health().await.map(|_| ()),
        Command::Help => Ok(()),
        Command::Quit => return false,
    };

    if let Err(error) = outcome {
        warn!(%error, "command failed");
        println!("! {error}");
    }
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let backend: Arc<dyn AtmBackend> = if args.mock {
        info!("running with mock backend");
        Arc::new(MockBackend::new()?)
    } else {
        info!(server_url = %args.server_url, "connecting to atm server");
        Arc::new(HttpBackend::new(args.server_url))
    };

    let mut session = AtmSession::new(backend.clone());
    if let Err(error) = session.refresh_health().await {
        warn!(%error, "health check failed");
    }

    let mut events = match backend.subscribe().await {
        Ok(rx) => Some(rx),
        Err(error) => {
            warn!(%error, "card notifications unavailable; use 'scan' or 'tap'");
            None
        }
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    draw(&session);

    loop {
        tokio::select! {
            event = next_event(&mut events) => {
                let Some(event) = event else {
                    warn!("notification channel closed");
                    events = None;
                    continue;
                };
                match session.handle_event(event).await {
                    Ok(true) => draw(&session),
                    Ok(false) => {}
                    Err(error) => warn!(%error, "card event failed"),
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Ok(Some(command)) => {
                        if !run_command(&mut session, command).await {
                            break;
                        }
                        draw(&session);
                    }
                    Ok(None) => {}
                    Err(message) => println!("! {message}"),
                }
            }
        }
    }

    info!("kiosk closed");
    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
