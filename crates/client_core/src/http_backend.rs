use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{AccountRecord, CardDetection, Uid},
    error::{ApiError, ErrorCode},
    protocol::{HealthResponse, PrintRequest, PrintResponse, ServerEvent},
};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};
use url::Url;

use crate::{AtmBackend, ClientError};

/// Talks to the ATM server over HTTP and its `/ws` notification channel.
pub struct HttpBackend {
    http: Client,
    server_url: String,
}

impl HttpBackend {
    pub fn new(server_url: impl Into<String>) -> Self {
        let server_url: String = server_url.into();
        Self {
            http: Client::new(),
            server_url: server_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// `server_url` with `segments` appended. Each segment is percent-encoded,
    /// so a UID can never add a query, fragment or extra path.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let invalid = || ClientError::InvalidUrl(self.server_url.clone());
        let mut url = Url::parse(&self.server_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn ws_url(&self) -> Result<String, ClientError> {
        let invalid = || ClientError::InvalidUrl(self.server_url.clone());
        let mut url = self.endpoint(&["ws"])?;
        let scheme = match url.scheme() {
            "http" => "ws",
            "https" => "wss",
            _ => return Err(invalid()),
        };
        url.set_scheme(scheme).map_err(|_| invalid())?;
        Ok(url.into())
    }
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, ClientError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res.json().await?);
    }
    let err = res.json::<ApiError>().await.unwrap_or_else(|_| {
        ApiError::new(ErrorCode::Internal, format!("server returned {status}"))
    });
    Err(ClientError::Api(err))
}

#[async_trait]
impl AtmBackend for HttpBackend {
    async fn health(&self) -> Result<HealthResponse, ClientError> {
        let res = self
            .http
            .get(self.endpoint(&["api", "health"])?)
            .send()
            .await?;
        decode(res).await
    }

    async fn lookup_user(&self, uid: &Uid) -> Result<AccountRecord, ClientError> {
        let res = self
            .http
            .get(self.endpoint(&["api", "user", uid.as_str()])?)
            .send()
            .await?;
        decode(res).await
    }

    async fn scan(&self) -> Result<CardDetection, ClientError> {
        let res = self
            .http
            .post(self.endpoint(&["api", "rfid", "scan"])?)
            .send()
            .await?;
        decode(res).await
    }

    async fn print(&self, request: &PrintRequest) -> Result<PrintResponse, ClientError> {
        let res = self
            .http
            .post(self.endpoint(&["api", "print"])?)
            .json(request)
            .send()
            .await?;
        decode(res).await
    }

    async fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<ServerEvent>, ClientError> {
        let ws_url = self.ws_url()?;
        let (ws_stream, _) = connect_async(ws_url.as_str()).await?;
        debug!(%ws_url, "notification channel open");
        let (ws_writer, mut ws_reader) = ws_stream.split();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let _ws_writer = ws_writer;
            while let Some(msg) = ws_reader.next().await {
                match msg {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => {
                            if tx.send(event).is_err() {
                                break;
                            }
                        }
                        Err(error) => warn!(%error, "ignoring unknown socket event"),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(error) => {
                        warn!(%error, "notification channel failed");
                        break;
                    }
                }
            }
            debug!("notification channel closed");
        });

        Ok(rx)
    }
}
