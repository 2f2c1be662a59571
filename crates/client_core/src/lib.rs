use async_trait::async_trait;
use shared::{
    domain::{AccountRecord, CardDetection, Uid},
    error::{ApiError, ErrorCode},
    protocol::{HealthResponse, PrintRequest, PrintResponse, ServerEvent},
};
use thiserror::Error;
use tokio::sync::mpsc;

mod http_backend;
mod mock_backend;
pub mod render;
mod session;

pub use http_backend::HttpBackend;
pub use mock_backend::MockBackend;
pub use render::render;
pub use session::{AtmSession, Screen, CARD_NOT_RECOGNIZED, NO_CARD_DETECTED};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{}", .0.error)]
    Api(ApiError),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("websocket failed: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("invalid payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid server url '{0}'")]
    InvalidUrl(String),
    #[error("no account is logged in")]
    NotLoggedIn,
}

impl ClientError {
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ClientError::Api(err) => Some(err.code),
            _ => None,
        }
    }
}

/// Where the kiosk gets accounts, scans, receipts and card events from.
#[async_trait]
pub trait AtmBackend: Send + Sync {
    async fn health(&self) -> Result<HealthResponse, ClientError>;
    async fn lookup_user(&self, uid: &Uid) -> Result<AccountRecord, ClientError>;
    async fn scan(&self) -> Result<CardDetection, ClientError>;
    async fn print(&self, request: &PrintRequest) -> Result<PrintResponse, ClientError>;
    /// Opens the notification channel. The first event is `Connected`.
    async fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<ServerEvent>, ClientError>;
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
