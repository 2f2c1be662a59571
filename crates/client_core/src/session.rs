use std::sync::Arc;

use shared::{
    domain::{AccountRecord, ServiceStatus, Uid},
    error::ErrorCode,
    protocol::{PrintRequest, PrintResponse, ServerEvent},
};
use tracing::{debug, info, warn};

use crate::{AtmBackend, ClientError};

pub const CARD_NOT_RECOGNIZED: &str = "Card not recognized";
pub const NO_CARD_DETECTED: &str = "No card detected";

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    TapCard {
        notice: Option<String>,
    },
    Dashboard {
        account: AccountRecord,
        notice: Option<String>,
    },
}

impl Default for Screen {
    fn default() -> Self {
        Screen::TapCard { notice: None }
    }
}

/// One kiosk's view of the ATM: at most one logged-in account at a time.
pub struct AtmSession {
    backend: Arc<dyn AtmBackend>,
    screen: Screen,
    services: ServiceStatus,
}

impl AtmSession {
    pub fn new(backend: Arc<dyn AtmBackend>) -> Self {
        Self {
            backend,
            screen: Screen::default(),
            services: ServiceStatus::default(),
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn services(&self) -> ServiceStatus {
        self.services
    }

    pub fn current_account(&self) -> Option<&AccountRecord> {
        match &self.screen {
            Screen::Dashboard { account, .. } => Some(account),
            Screen::TapCard { .. } => None,
        }
    }

    pub async fn refresh_health(&mut self) -> Result<ServiceStatus, ClientError> {
        let health = self.backend.health().await?;
        self.services = health.services;
        Ok(self.services)
    }

    /// Applies a notification event. Returns whether the screen needs a redraw.
    pub async fn handle_event(&mut self, event: ServerEvent) -> Result<bool, ClientError> {
        match event {
            ServerEvent::Connected { services } => {
                self.services = services;
                Ok(true)
            }
            ServerEvent::CardDetected { uid, .. } => self.on_card_detected(&uid).await,
        }
    }

    /// Taps are ignored while an account is shown; the user logs out first.
    pub async fn on_card_detected(&mut self, uid: &Uid) -> Result<bool, ClientError> {
        if self.current_account().is_some() {
            debug!(%uid, "card tap ignored while logged in");
            return Ok(false);
        }

        match self.backend.lookup_user(uid).await {
            Ok(account) => {
                info!(%uid, name = %account.name, "logged in");
                self.screen = Screen::Dashboard {
                    account,
                    notice: None,
                };
                Ok(true)
            }
            Err(err) if err.code() == Some(ErrorCode::NotFound) => {
                warn!(%uid, "unknown card");
                self.screen = Screen::TapCard {
                    notice: Some(CARD_NOT_RECOGNIZED.to_string()),
                };
                Ok(true)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn scan(&mut self) -> Result<bool, ClientError> {
        if self.current_account().is_some() {
            return Ok(false);
        }

        match self.backend.scan().await {
            Ok(detection) => self.on_card_detected(&detection.uid).await,
            Err(err) if err.code() == Some(ErrorCode::NoCard) => {
                self.screen = Screen::TapCard {
                    notice: Some(NO_CARD_DETECTED.to_string()),
                };
                Ok(true)
            }
            Err(err) => Err(err),
        }
    }

    /// Prints a receipt for the logged-in account and shows the outcome.
    pub async fn print(&mut self) -> Result<PrintResponse, ClientError> {
        let request = match self.current_account() {
            Some(account) => PrintRequest::from(account),
            None => return Err(ClientError::NotLoggedIn),
        };

        let result = self.backend.print(&request).await;
        let message = match &result {
            Ok(response) => response.message.clone(),
            Err(err) => format!("Print failed: {err}"),
        };
        if let Screen::Dashboard { notice, .. } = &mut self.screen {
            *notice = Some(message);
        }
        result
    }

    /// Returns whether an account was logged in.
    pub fn logout(&mut self) -> bool {
        let was_logged_in = self.current_account().is_some();
        if was_logged_in {
            info!("logged out");
        }
        self.screen = Screen::default();
        was_logged_in
    }
}
