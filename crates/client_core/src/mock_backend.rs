use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use rfid::{CardPoller, CardReader, MockCardReader, PollerConfig, MOCK_POLL_INTERVAL};
use shared::{
    domain::{AccountRecord, CardDetection, ServiceStatus, Uid},
    error::{ApiError, ErrorCode},
    protocol::{HealthResponse, PrintRequest, PrintResponse, ServerEvent, MOCK_PRINT_MESSAGE},
};
use storage::{StoreError, UserStore};
use tokio::sync::mpsc;

use crate::{AtmBackend, ClientError};

/// Runs entirely in-process: built-in accounts, a rotating mock card, and
/// receipts that are only echoed back.
pub struct MockBackend {
    store: UserStore,
    reader: Arc<MockCardReader>,
    poll_interval: Duration,
}

impl MockBackend {
    pub fn new() -> Result<Self, StoreError> {
        Ok(Self::with_parts(
            UserStore::builtin()?,
            MockCardReader::demo(),
            MOCK_POLL_INTERVAL,
        ))
    }

    pub fn with_parts(store: UserStore, reader: MockCardReader, poll_interval: Duration) -> Self {
        Self {
            store,
            reader: Arc::new(reader),
            poll_interval,
        }
    }

    fn services(&self) -> ServiceStatus {
        ServiceStatus {
            rfid: true,
            printer: false,
        }
    }
}

#[async_trait]
impl AtmBackend for MockBackend {
    async fn health(&self) -> Result<HealthResponse, ClientError> {
        Ok(HealthResponse {
            status: "ok".to_string(),
            services: self.services(),
            timestamp: Utc::now(),
        })
    }

    async fn lookup_user(&self, uid: &Uid) -> Result<AccountRecord, ClientError> {
        self.store
            .resolve(uid.as_str())
            .cloned()
            .map_err(|_| ClientError::Api(ApiError::new(ErrorCode::NotFound, "User not found")))
    }

    async fn scan(&self) -> Result<CardDetection, ClientError> {
        match self.reader.read_once().await {
            Ok(Some(uid)) => Ok(CardDetection::now(uid)),
            Ok(None) => Err(ClientError::Api(ApiError::new(
                ErrorCode::NoCard,
                "No card detected",
            ))),
            Err(err) => Err(ClientError::Api(ApiError::new(
                ErrorCode::ReadFailed,
                err.to_string(),
            ))),
        }
    }

    async fn print(&self, request: &PrintRequest) -> Result<PrintResponse, ClientError> {
        Ok(PrintResponse {
            success: true,
            message: MOCK_PRINT_MESSAGE.to_string(),
            data: Some(serde_json::to_value(request)?),
        })
    }

    async fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<ServerEvent>, ClientError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(ServerEvent::Connected {
            services: self.services(),
        });

        let reader: Arc<dyn CardReader> = self.reader.clone();
        let events = tx.clone();
        let poller = CardPoller::new(reader, PollerConfig::new(self.poll_interval)).spawn(
            move |detection| {
                let _ = events.send(ServerEvent::CardDetected {
                    uid: detection.uid,
                    timestamp: detection.timestamp,
                });
            },
        );

        // The poller lives until the subscriber drops its receiver.
        tokio::spawn(async move {
            tx.closed().await;
            poller.stop().await;
        });

        Ok(rx)
    }
}
