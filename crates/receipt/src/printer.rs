use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use serialport::SerialPort;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::format::Segment;

const SERIAL_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum PrintError {
    #[error("printer unavailable: {0}")]
    HardwareUnavailable(String),
    #[error("print failed at segment {segment}: {source}")]
    PrintFailed {
        segment: usize,
        #[source]
        source: io::Error,
    },
}

#[async_trait]
pub trait ReceiptPrinter: Send + Sync {
    async fn write(&self, bytes: &[u8]) -> io::Result<()>;

    fn describe(&self) -> String;
}

/// Writes segments in order and stops at the first failure. Bytes already
/// sent stay printed; nothing is retried. Returns the number of bytes written.
pub async fn print_receipt(
    printer: &dyn ReceiptPrinter,
    segments: &[Segment],
) -> Result<usize, PrintError> {
    let mut written = 0;
    for (segment, chunk) in segments.iter().enumerate() {
        let bytes = chunk.to_bytes();
        if let Err(source) = printer.write(&bytes).await {
            warn!(
                printer = %printer.describe(),
                segment,
                written,
                error = %source,
                "receipt aborted mid-print"
            );
            return Err(PrintError::PrintFailed { segment, source });
        }
        written += bytes.len();
    }
    debug!(printer = %printer.describe(), written, "receipt sent");
    Ok(written)
}

/// ESC/POS printer on a serial line.
pub struct SerialPrinter {
    path: String,
    port: Arc<Mutex<Box<dyn SerialPort>>>,
}

impl SerialPrinter {
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, PrintError> {
        let port = serialport::new(path, baud_rate)
            .timeout(SERIAL_WRITE_TIMEOUT)
            .open()
            .map_err(|e| PrintError::HardwareUnavailable(format!("failed to open {path}: {e}")))?;
        info!(%path, baud_rate, "receipt printer connected");
        Ok(Self {
            path: path.to_string(),
            port: Arc::new(Mutex::new(port)),
        })
    }
}

#[async_trait]
impl ReceiptPrinter for SerialPrinter {
    async fn write(&self, bytes: &[u8]) -> io::Result<()> {
        let port = Arc::clone(&self.port);
        let bytes = bytes.to_vec();
        tokio::task::spawn_blocking(move || {
            let mut port = port
                .lock()
                .map_err(|_| io::Error::other("printer port lock poisoned"))?;
            port.write_all(&bytes)?;
            port.flush()
        })
        .await
        .map_err(io::Error::other)?
    }

    fn describe(&self) -> String {
        format!("serial:{}", self.path)
    }
}

/// Collects everything written to it. `fail_after` makes the nth and later
/// writes fail, which models a printer going away mid-receipt.
#[derive(Debug, Default)]
pub struct MemoryPrinter {
    buffer: Mutex<Vec<u8>>,
    writes: Mutex<usize>,
    fail_after: Option<usize>,
}

impl MemoryPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_after(writes: usize) -> Self {
        Self {
            fail_after: Some(writes),
            ..Self::default()
        }
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.buffer.lock().map(|b| b.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ReceiptPrinter for MemoryPrinter {
    async fn write(&self, bytes: &[u8]) -> io::Result<()> {
        let mut writes = self
            .writes
            .lock()
            .map_err(|_| io::Error::other("write counter lock poisoned"))?;
        if self.fail_after.is_some_and(|limit| *writes >= limit) {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "printer disconnected",
            ));
        }
        *writes += 1;
        self.buffer
            .lock()
            .map_err(|_| io::Error::other("buffer lock poisoned"))?
            .extend_from_slice(bytes);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
#[path = "tests/printer_tests.rs"]
mod tests;
