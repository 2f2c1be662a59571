use std::{sync::Arc, time::Duration};

use receipt::{ReceiptPrinter, SerialPrinter};
use rfid::{CardReader, MockCardReader, HARDWARE_POLL_INTERVAL};
use tracing::{info, warn};

use crate::config::{RfidMode, Settings};

/// A reader that fails to open is logged and left out; the server keeps running.
pub(crate) fn open_reader(settings: &Settings) -> Option<Arc<dyn CardReader>> {
    match settings.rfid_mode {
        RfidMode::Disabled => {
            info!("RFID reader disabled by configuration");
            None
        }
        RfidMode::Mock => {
            info!("using mock RFID card rotation");
            Some(Arc::new(MockCardReader::demo()))
        }
        RfidMode::Hardware => match rfid::open_hardware_reader() {
            Ok(reader) => Some(reader),
            Err(error) => {
                warn!(%error, "RFID reader unavailable; scanning disabled");
                None
            }
        },
    }
}

pub(crate) fn open_printer(settings: &Settings) -> Option<Arc<dyn ReceiptPrinter>> {
    let Some(path) = settings.printer_port.as_deref() else {
        info!("no printer configured; print requests will be mocked");
        return None;
    };
    match SerialPrinter::open(path, settings.printer_baud_rate) {
        Ok(printer) => Some(Arc::new(printer)),
        Err(error) => {
            warn!(%error, "receipt printer unavailable; print requests will be mocked");
            None
        }
    }
}

pub(crate) fn poll_interval(settings: &Settings, reader: Option<&Arc<dyn CardReader>>) -> Duration {
    if let Some(ms) = settings.rfid_poll_interval_ms {
        return Duration::from_millis(ms);
    }
    reader
        .map(|reader| reader.kind().default_poll_interval())
        .unwrap_or(HARDWARE_POLL_INTERVAL)
}
