use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use shared::domain::Uid;
use thiserror::Error;

pub mod apdu;
mod mock;
#[cfg(feature = "pcsc")]
mod pcsc_reader;
mod poller;

pub use mock::{MockCardReader, DEMO_ROTATION};
#[cfg(feature = "pcsc")]
pub use pcsc_reader::PcscCardReader;
pub use poller::{CardPoller, Debouncer, PollHandle, PollerConfig, DEBOUNCE_WINDOW};

pub const HARDWARE_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const MOCK_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderKind {
    Hardware,
    Mock,
}

impl ReaderKind {
    pub fn default_poll_interval(self) -> Duration {
        match self {
            ReaderKind::Hardware => HARDWARE_POLL_INTERVAL,
            ReaderKind::Mock => MOCK_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReaderError {
    #[error("card reader unavailable: {0}")]
    HardwareUnavailable(String),
    #[error("card read failed: {0}")]
    ReadFailed(String),
}

#[async_trait]
pub trait CardReader: Send + Sync {
    fn kind(&self) -> ReaderKind;

    /// One read attempt. `Ok(None)` means no card is on the reader.
    async fn read_once(&self) -> Result<Option<Uid>, ReaderError>;
}

/// Opens the PC/SC reader, or reports it unavailable when the crate was
/// built without the `pcsc` feature.
pub fn open_hardware_reader() -> Result<Arc<dyn CardReader>, ReaderError> {
    #[cfg(feature = "pcsc")]
    {
        Ok(Arc::new(PcscCardReader::connect()?))
    }
    #[cfg(not(feature = "pcsc"))]
    {
        Err(ReaderError::HardwareUnavailable(
            "built without the `pcsc` feature".to_string(),
        ))
    }
}
