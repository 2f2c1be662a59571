use std::ffi::CString;

use async_trait::async_trait;
use pcsc::{Context, Error as PcscError, Protocols, Scope, ShareMode, MAX_BUFFER_SIZE};
use shared::domain::Uid;
use tracing::{debug, info};

use crate::{apdu, CardReader, ReaderError, ReaderKind};

/// Contactless reader reached through the PC/SC service.
pub struct PcscCardReader {
    ctx: Context,
}

impl PcscCardReader {
    /// Fails with `HardwareUnavailable` when PC/SC is down or no reader is attached.
    pub fn connect() -> Result<Self, ReaderError> {
        let ctx = Context::establish(Scope::User).map_err(|e| {
            ReaderError::HardwareUnavailable(format!("failed to establish PC/SC context: {e}"))
        })?;
        let readers = list_readers(&ctx).map_err(|e| {
            ReaderError::HardwareUnavailable(format!("failed to list card readers: {e}"))
        })?;
        let Some(first) = readers.first() else {
            return Err(ReaderError::HardwareUnavailable(
                "no card readers attached".to_string(),
            ));
        };
        info!(reader = %first.to_string_lossy(), count = readers.len(), "PC/SC reader ready");
        Ok(Self { ctx })
    }

    fn read_blocking(ctx: &Context) -> Result<Option<Uid>, ReaderError> {
        let readers = match list_readers(ctx) {
            Ok(readers) => readers,
            Err(PcscError::NoReadersAvailable) => return Ok(None),
            Err(e) => return Err(ReaderError::ReadFailed(e.to_string())),
        };

        for reader in &readers {
            let card = match ctx.connect(reader, ShareMode::Shared, Protocols::ANY) {
                Ok(card) => card,
                Err(
                    PcscError::NoSmartcard
                    | PcscError::RemovedCard
                    | PcscError::UnresponsiveCard
                    | PcscError::UnpoweredCard,
                ) => continue,
                Err(e) => return Err(ReaderError::ReadFailed(e.to_string())),
            };

            let mut response = [0u8; MAX_BUFFER_SIZE];
            let reply = card
                .transmit(&apdu::GET_UID, &mut response)
                .map_err(|e| ReaderError::ReadFailed(e.to_string()))?;
            let uid = apdu::uid_from_response(reply)?;
            debug!(%uid, reader = %reader.to_string_lossy(), "read card UID");
            return Ok(Some(uid));
        }

        Ok(None)
    }
}

fn list_readers(ctx: &Context) -> Result<Vec<CString>, PcscError> {
    let mut buffer = vec![0u8; 2048];
    let names = ctx.list_readers(&mut buffer)?;
    Ok(names.map(|name| name.to_owned()).collect())
}

#[async_trait]
impl CardReader for PcscCardReader {
    fn kind(&self) -> ReaderKind {
        ReaderKind::Hardware
    }

    async fn read_once(&self) -> Result<Option<Uid>, ReaderError> {
        let ctx = self.ctx.clone();
        tokio::task::spawn_blocking(move || Self::read_blocking(&ctx))
            .await
            .map_err(|e| ReaderError::ReadFailed(format!("reader task failed: {e}")))?
    }
}
