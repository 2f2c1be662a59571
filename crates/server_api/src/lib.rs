use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, Utc};
use receipt::{PrintError, ReceiptPrinter, ReceiptSnapshot};
use rfid::{CardReader, ReaderError, ReaderKind};
use shared::{
    domain::{AccountRecord, CardDetection, ServiceStatus, Uid},
    error::{ApiError, ErrorCode},
    protocol::{
        HealthResponse, PrintRequest, PrintResponse, MOCK_PRINT_MESSAGE, PRINTED_MESSAGE,
    },
};
use storage::{LookupError, UserStore};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Lets one read reach the device at a time, whether it comes from a poller
/// or an on-demand scan.
struct ExclusiveReader {
    inner: Arc<dyn CardReader>,
    lock: Mutex<()>,
}

#[async_trait]
impl CardReader for ExclusiveReader {
    fn kind(&self) -> ReaderKind {
        self.inner.kind()
    }

    async fn read_once(&self) -> Result<Option<Uid>, ReaderError> {
        let _guard = self.lock.lock().await;
        self.inner.read_once().await
    }
}

/// Services the HTTP and socket layers share. Either capability may be absent.
#[derive(Clone)]
pub struct ApiContext {
    pub store: UserStore,
    pub reader: Option<Arc<dyn CardReader>>,
    pub printer: Option<Arc<dyn ReceiptPrinter>>,
    print_lock: Arc<Mutex<()>>,
}

impl ApiContext {
    pub fn new(
        store: UserStore,
        reader: Option<Arc<dyn CardReader>>,
        printer: Option<Arc<dyn ReceiptPrinter>>,
    ) -> Self {
        let reader = reader.map(|inner| {
            Arc::new(ExclusiveReader {
                inner,
                lock: Mutex::new(()),
            }) as Arc<dyn CardReader>
        });
        Self {
            store,
            reader,
            printer,
            print_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn services(&self) -> ServiceStatus {
        ServiceStatus {
            rfid: self.reader.is_some(),
            printer: self.printer.is_some(),
        }
    }
}

pub fn health_route() -> &'static str {
    "/api/health"
}

pub fn user_route() -> &'static str {
    "/api/user/:uid"
}

pub fn scan_route() -> &'static str {
    "/api/rfid/scan"
}

pub fn print_route() -> &'static str {
    "/api/print"
}

pub fn ws_route() -> &'static str {
    "/ws"
}

pub fn health(ctx: &ApiContext) -> HealthResponse {
    HealthResponse {
        status: "ok".to_string(),
        services: ctx.services(),
        timestamp: Utc::now(),
    }
}

pub fn resolve_user(ctx: &ApiContext, uid: &str) -> Result<AccountRecord, ApiError> {
    ctx.store.resolve(uid).cloned().map_err(|err| match err {
        LookupError::NotFound(_) => ApiError::new(ErrorCode::NotFound, "User not found"),
    })
}

pub async fn scan_card(ctx: &ApiContext) -> Result<CardDetection, ApiError> {
    let Some(reader) = ctx.reader.as_ref() else {
        return Err(ApiError::new(
            ErrorCode::HardwareUnavailable,
            "RFID reader not available",
        ));
    };
    match reader.read_once().await {
        Ok(Some(uid)) => {
            info!(%uid, "card scanned on request");
            Ok(CardDetection::now(uid))
        }
        Ok(None) => Err(ApiError::new(ErrorCode::NoCard, "No card detected")),
        Err(ReaderError::HardwareUnavailable(reason)) => {
            Err(ApiError::new(ErrorCode::HardwareUnavailable, reason))
        }
        Err(ReaderError::ReadFailed(reason)) => {
            warn!(%reason, "card scan failed");
            Err(ApiError::new(
                ErrorCode::ReadFailed,
                format!("Failed to read card: {reason}"),
            ))
        }
    }
}

/// Prints the receipt for `body`, a partial account record. Without a printer
/// the body is echoed back as received. Receipts are printed one at a time.
pub async fn print_receipt(
    ctx: &ApiContext,
    body: serde_json::Value,
) -> Result<PrintResponse, ApiError> {
    let Some(printer) = ctx.printer.as_ref() else {
        info!("printer not connected; echoing mock receipt");
        return Ok(PrintResponse {
            success: true,
            message: MOCK_PRINT_MESSAGE.to_string(),
            data: Some(body),
        });
    };

    let request: PrintRequest = serde_json::from_value(body).map_err(|e| {
        ApiError::new(ErrorCode::Validation, format!("Invalid print request: {e}"))
    })?;

    let snapshot = ReceiptSnapshot::from_request(&request, Local::now().naive_local());
    let segments = receipt::format(&snapshot);

    let _guard = ctx.print_lock.lock().await;
    receipt::print_receipt(printer.as_ref(), &segments)
        .await
        .map_err(|err| match err {
            PrintError::HardwareUnavailable(reason) => {
                ApiError::new(ErrorCode::HardwareUnavailable, reason)
            }
            err @ PrintError::PrintFailed { .. } => {
                ApiError::new(ErrorCode::PrintFailed, format!("Printer error: {err}"))
            }
        })?;

    info!(printer = %printer.describe(), name = ?request.name, "receipt printed");
    Ok(PrintResponse {
        success: true,
        message: PRINTED_MESSAGE.to_string(),
        data: None,
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
