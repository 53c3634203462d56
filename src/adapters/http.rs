use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Form, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;

use crate::adapters::params_parse::{parse_fractal_params, parse_save_params, ParamsParseError};
use crate::config::Config;
use crate::handlers::group::HandlerGroup;
use crate::handlers::watermark::Watermark;
use crate::handlers::HandlerDead;

/// The boundary literal the original system's hand-assembled multipart
/// writer used; kept as a literal string rather than derived, since the
/// wire format is fixed and doesn't need to be configurable.
const MULTIPART_BOUNDARY: &str = "CROW-BOUNDARY";

#[derive(Clone)]
pub struct AppState {
    pub handlers: Arc<HandlerGroup>,
    pub config: Arc<Config>,
}

#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/params", post(handle_params))
        .route("/fractal", post(handle_fractal))
        .route("/save", post(handle_save))
        .with_state(state)
}

async fn handle_params(State(state): State<AppState>, Form(fields): Form<HashMap<String, String>>) -> Response {
    let default_encoder = state.config.default_png_encoder.into();
    match parse_fractal_params(&fields, default_encoder) {
        Ok(params) => {
            let handlers = Arc::clone(&state.handlers);
            let result = tokio::task::spawn_blocking(move || handlers.handle_params(params)).await;
            match result {
                Ok(()) => StatusCode::OK.into_response(),
                Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            }
        }
        Err(err) => parse_error_response(&err),
    }
}

async fn handle_fractal(State(state): State<AppState>, Form(fields): Form<HashMap<String, String>>) -> Response {
    let default_encoder = state.config.default_png_encoder.into();
    let params = match parse_fractal_params(&fields, default_encoder) {
        Ok(params) => params,
        Err(err) => return parse_error_response(&err),
    };

    tracing::info!(
        session_id = %params.session_id,
        request_id = params.request_id,
        handler = ?params.handler,
        "fractal request received"
    );

    let handlers = Arc::clone(&state.handlers);
    let result = tokio::task::spawn_blocking(move || handlers.handle_fractal(params)).await;

    match result {
        Ok(Ok(image)) => multipart_response(&image.png_bytes, image.watermark),
        Ok(Err(HandlerDead)) => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({
            "error_message": "handler pipeline was killed before it could serve this request",
        })))
            .into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn handle_save(State(state): State<AppState>, Form(fields): Form<HashMap<String, String>>) -> Response {
    let default_encoder = state.config.default_png_encoder.into();
    let save_params = match parse_save_params(&fields, default_encoder) {
        Ok(save_params) => save_params,
        Err(err) => return parse_error_response(&err),
    };

    let handlers = Arc::clone(&state.handlers);
    let base_dir = state.config.save_dir.clone();
    let result = tokio::task::spawn_blocking(move || handlers.handle_save(save_params, &base_dir)).await;

    let body = match result {
        Ok(Ok(())) => json!({ "success": true }),
        Ok(Err(save_error)) => json!({ "success": false, "error_message": save_error.to_string() }),
        Err(_) => json!({ "success": false, "error_message": "save task panicked" }),
    };
    (StatusCode::OK, Json(body)).into_response()
}

fn parse_error_response(err: &ParamsParseError) -> Response {
    let field = match err {
        ParamsParseError::MissingField { field }
        | ParamsParseError::NotAnInteger { field }
        | ParamsParseError::NotAFiniteNumber { field }
        | ParamsParseError::Invalid { field, .. } => *field,
    };
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "field": field, "error_message": err.to_string() })),
    )
        .into_response()
}

/// Hand-assembles the two-part multipart body the original system also
/// builds by hand rather than through a multipart-writing crate: a fixed
/// shape (one `image/png` part, one `application/json` metadata part)
/// doesn't need general-purpose multipart machinery.
fn multipart_response(png_bytes: &[u8], watermark: Watermark) -> Response {
    let metadata = json!({ "data_id": watermark.data_id, "viewport_id": watermark.viewport_id }).to_string();

    let mut body = Vec::with_capacity(png_bytes.len() + metadata.len() + 128);
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: image/png\r\n");
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"fractal_image\"; filename=\"fractal_image.png\"\r\n\r\n");
    body.extend_from_slice(png_bytes);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json\r\n");
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"metadata\"\r\n\r\n");
    body.extend_from_slice(metadata.as_bytes());
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            format!("multipart/mixed; boundary={MULTIPART_BOUNDARY}"),
        )],
        body,
    )
        .into_response()
}
