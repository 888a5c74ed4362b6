//! The authoring HTTP server.
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /api/posts` | every item, newest first |
//! | `POST /api/posts` | create (JSON or multipart with a `cover` file) |
//! | `GET /api/posts/:id` | one item with its body |
//! | `PUT /api/posts/:id` | update (JSON or multipart) |
//! | `GET /api/sections` | suggested section labels |
//! | `POST /api/regenerate` | rewrite homepage and sitemap |
//! | anything else | static files from the site root |
//!
//! Errors are JSON `{ "error": message, "kind": kind }` with 404 for unknown
//! ids, 400 for malformed input, 409 for id conflicts and 500 otherwise.
//! CORS is open to any origin and there is no authentication: this server
//! is meant for the author's own machine.

use crate::authoring::{Authoring, AuthoringError};
use crate::types::{CoverUpload, ItemInput};
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Path, Request, State};
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

type AppState = Arc<Authoring>;

/// Build the router for a shared [`Authoring`].
pub fn router(authoring: AppState) -> Router {
    let root = authoring.store().paths().root.clone();
    let body_limit = authoring.config().server.max_upload_bytes;

    Router::new()
        .route("/api/posts", get(list_posts).post(create_post))
        .route("/api/posts/:id", get(get_post).put(update_post))
        .route("/api/sections", get(list_sections))
        .route("/api/regenerate", post(regenerate))
        .fallback_service(ServeDir::new(root))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(authoring)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any)
}

/// Bind and serve until the process is stopped.
pub async fn serve(authoring: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        addr = %listener.local_addr()?,
        root = %authoring.store().paths().root.display(),
        "editor server listening"
    );
    axum::serve(listener, router(authoring)).await
}

// --- Errors ---

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

/// An error response. Messages never include internal traces.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "invalid_input",
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal",
            message: message.into(),
        }
    }
}

impl From<AuthoringError> for ApiError {
    fn from(err: AuthoringError) -> Self {
        let (status, kind) = match &err {
            AuthoringError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AuthoringError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            AuthoringError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        if status.is_server_error() {
            error!(error = %err, "request failed");
        }
        Self {
            status,
            kind,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            kind: self.kind,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Run an authoring call on the blocking pool.
async fn blocking<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Authoring) -> Result<T, AuthoringError> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|err| ApiError::internal(format!("authoring task failed: {err}")))?
        .map_err(ApiError::from)
}

// --- Request decoding ---

/// Read item fields (and an optional cover) from a JSON or multipart body.
async fn read_submission(
    state: &AppState,
    req: Request,
) -> Result<(ItemInput, Option<CoverUpload>), ApiError> {
    let is_multipart = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    if !is_multipart {
        let Json(input) = Json::<ItemInput>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        return Ok((input, None));
    }

    let mut multipart = Multipart::from_request(req, state)
        .await
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let mut input = ItemInput::default();
    let mut cover = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(format!("invalid multipart payload: {err}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "cover" {
            let filename = field.file_name().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|err| ApiError::bad_request(format!("invalid cover field: {err}")))?;
            // Browsers send an empty part when no file was picked.
            if !bytes.is_empty() {
                cover = Some(CoverUpload {
                    bytes: bytes.to_vec(),
                    filename,
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|err| ApiError::bad_request(format!("invalid {name} field: {err}")))?;
        let slot = match name.as_str() {
            "title" => &mut input.title,
            "description" => &mut input.description,
            "tags" => &mut input.tags,
            "section" => &mut input.section,
            "content" => &mut input.content,
            "author" => &mut input.author,
            "year" => &mut input.year,
            _ => continue,
        };
        *slot = Some(value);
    }

    Ok((input, cover))
}

// --- Handlers ---

async fn list_posts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let items = blocking(&state, |a| a.list()).await?;
    Ok(Json(items))
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = blocking(&state, move |a| a.get(&id)).await?;
    Ok(Json(detail))
}

async fn create_post(
    State(state): State<AppState>,
    req: Request,
) -> Result<impl IntoResponse, ApiError> {
    let (input, cover) = read_submission(&state, req).await?;
    let outcome = blocking(&state, move |a| a.create(input, cover)).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    req: Request,
) -> Result<impl IntoResponse, ApiError> {
    let (input, cover) = read_submission(&state, req).await?;
    let outcome = blocking(&state, move |a| a.update(&id, input, cover)).await?;
    Ok(Json(outcome))
}

async fn list_sections(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.sections())
}

async fn regenerate(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let outcome = blocking(&state, |a| a.regenerate()).await?;
    Ok(Json(outcome))
}
