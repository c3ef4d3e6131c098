//! REST API handlers.

use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use super::types::{
    error_response, CreateSessionRequest, CreateSessionResponse, DeleteSessionResponse,
    ErrorResponse, ListSessionsResponse, SendMessageRequest, SendMessageResponse, StatusResponse,
};
use crate::session::{SessionId, SessionManager};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<SessionManager>,
}

impl AppState {
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self { manager }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn reject(err: &crate::error::ChatBridgeError) -> ApiError {
    let (status, body) = error_response(err);
    (status, Json(body))
}

fn parse_id(raw: &str) -> Result<SessionId, ApiError> {
    SessionId::parse(raw).map_err(|e| reject(&e))
}

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}

/// Create a new session.
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, ApiError> {
    let id = parse_id(&req.id)?;
    state.manager.create(&id).await.map_err(|e| reject(&e))?;

    Ok(Json(CreateSessionResponse::new(id.as_str())))
}

/// Current pairing code for a session, rendered as a PNG image.
pub async fn get_qr(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&session_id)?;
    let code = pending_code(&state, &id).await?;
    let png = qr_png(&code)?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

/// HTML page embedding the pairing code image.
pub async fn get_qr_html(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let id = parse_id(&session_id)?;
    let code = pending_code(&state, &id).await?;
    let png = qr_png(&code)?;
    let data_url = format!("data:image/png;base64,{}", BASE64.encode(png));

    Ok(Html(format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <title>Pairing code for session {id}</title>
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
      body {{ font-family: Arial, sans-serif; text-align: center; margin: 20px; }}
      img {{ max-width: 300px; margin: 20px auto; display: block; }}
    </style>
  </head>
  <body>
    <h2>Scan to connect session {id}</h2>
    <img src="{data_url}" alt="Pairing code">
    <p>Open the messaging app on your phone and scan this code to link the device.</p>
  </body>
</html>
"#
    )))
}

/// Resolve the pending pairing code for a known session.
///
/// The session must already have a record (creating sessions is the job
/// of the create endpoint, not a GET); within that constraint the
/// manager may reopen a closed connection and wait for a fresh code.
async fn pending_code(state: &AppState, id: &SessionId) -> Result<String, ApiError> {
    state.manager.status(id).await.map_err(|e| reject(&e))?;

    match state.manager.qr_code(id).await.map_err(|e| reject(&e))? {
        Some(code) => Ok(code),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::not_found(format!(
                "no pairing code available for session '{}'",
                id
            ))),
        )),
    }
}

fn qr_png(code: &str) -> Result<Vec<u8>, ApiError> {
    let render_err = |e: String| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::internal_error(e)),
        )
    };

    let qr = qrcode::QrCode::new(code.as_bytes()).map_err(|e| render_err(e.to_string()))?;
    let img = qr
        .render::<image::Luma<u8>>()
        .min_dimensions(300, 300)
        .build();

    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|e| render_err(e.to_string()))?;

    Ok(buf.into_inner())
}

/// Get session status.
pub async fn get_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let id = parse_id(&session_id)?;
    let status = state.manager.status(&id).await.map_err(|e| reject(&e))?;

    Ok(Json(StatusResponse::from_status(&status)))
}

/// Delete a session.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<DeleteSessionResponse>, ApiError> {
    let id = parse_id(&session_id)?;
    state.manager.delete(&id).await.map_err(|e| reject(&e))?;

    Ok(Json(DeleteSessionResponse::new()))
}

/// Send a message through a session, reopening its connection on demand.
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let id = parse_id(&req.session_id)?;
    let receipt = state
        .manager
        .send_message(&id, &req.to, &req.text)
        .await
        .map_err(|e| reject(&e))?;

    Ok(Json(SendMessageResponse::new(receipt.message_id)))
}

/// List all known sessions.
pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<ListSessionsResponse>, ApiError> {
    let ids = state.manager.list().map_err(|e| reject(&e))?;

    Ok(Json(ListSessionsResponse {
        success: true,
        sessions: ids.iter().map(|id| id.to_string()).collect(),
    }))
}
