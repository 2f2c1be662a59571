use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use server_api::{
    health_route, print_route, scan_route, user_route, ws_route, ApiContext,
};
use shared::{
    domain::{AccountRecord, CardDetection},
    error::{ApiError, ErrorCode},
    protocol::{HealthResponse, PrintResponse, ServerEvent},
};
use storage::UserStore;
use tokio::sync::broadcast::error::RecvError;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};
use tracing::{debug, error, info, warn};

mod app_state;
mod card_feed;
mod config;
mod hardware;

use app_state::AppState;
use card_feed::CardFeed;
use config::load_settings;

const MAX_PRINT_BODY_BYTES: usize = 64 * 1024;

type HttpError = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let store = match settings.users_path.as_deref() {
        Some(path) => UserStore::from_path(path).map_err(|error| {
            error!(%path, %error, "failed to load user store");
            error
        })?,
        None => UserStore::builtin()?,
    };

    let reader = hardware::open_reader(&settings);
    let printer = hardware::open_printer(&settings);
    let poll_interval = hardware::poll_interval(&settings, reader.as_ref());
    let api = ApiContext::new(store, reader, printer);

    let services = api.services();
    info!(
        accounts = api.store.len(),
        rfid = services.rfid,
        printer = services.printer,
        "services ready"
    );

    let card_feed = CardFeed::new(api.reader.clone(), poll_interval);
    let state = AppState { api, card_feed };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(health_route(), get(http_health))
        .route(user_route(), get(http_get_user))
        .route(scan_route(), post(http_scan))
        .route(print_route(), post(http_print))
        .route(ws_route(), get(ws_handler))
        .layer(RequestBodyLimitLayer::new(MAX_PRINT_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::HardwareUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::NotFound | ErrorCode::NoCard => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::ReadFailed | ErrorCode::PrintFailed | ErrorCode::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn reject(error: ApiError) -> HttpError {
    (status_for(error.code), Json(error))
}

async fn http_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(server_api::health(&state.api))
}

async fn http_get_user(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> Result<Json<AccountRecord>, HttpError> {
    let account = server_api::resolve_user(&state.api, &uid).map_err(|e| {
        debug!(%uid, "lookup for unknown card");
        reject(e)
    })?;
    Ok(Json(account))
}

async fn http_scan(State(state): State<Arc<AppState>>) -> Result<Json<CardDetection>, HttpError> {
    let detection = server_api::scan_card(&state.api).await.map_err(reject)?;
    Ok(Json(detection))
}

async fn http_print(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<PrintResponse>, HttpError> {
    let response = server_api::print_receipt(&state.api, body)
        .await
        .map_err(|e| {
            error!(error = %e.error, "print request failed");
            reject(e)
        })?;
    Ok(Json(response))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

/// One notification channel: a `connected` handshake, then every
/// `card_detected` event from the shared card feed.
async fn ws_connection(state: Arc<AppState>, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let services = state.api.services();
    let mut events = state.card_feed.subscribe().await;
    let sockets = state.card_feed.subscribers().await;
    info!(
        rfid = services.rfid,
        printer = services.printer,
        sockets = sockets,
        "socket client connected"
    );

    let mut send_task = tokio::spawn(async move {
        if let Err(error) = push_event(&mut sender, &ServerEvent::Connected { services }).await {
            warn!(%error, "socket send failed");
            return;
        }
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "socket client fell behind; card events dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            if let Err(error) = push_event(&mut sender, &event).await {
                warn!(%error, "socket send failed");
                break;
            }
        }
    });

    loop {
        tokio::select! {
            _ = &mut send_task => break,
            msg = receiver.next() => match msg {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    warn!(%error, "socket receive failed");
                    break;
                }
            },
        }
    }

    send_task.abort();
    state.card_feed.unsubscribe().await;
    info!("socket client disconnected");
}

async fn push_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(error) => {
            warn!(%error, "failed to encode socket event");
            return Ok(());
        }
    };
    sender.send(Message::Text(text)).await
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
