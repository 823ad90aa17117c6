//! ProtoKit Gateway — the live editor.
//! One interactive session: edit, save, run, download, and extend the current app
//! with registry components; plus an image classification endpoint.

pub mod error;

use axum::{
    body::{Body, Bytes},
    extract::{rejection::BytesRejection, DefaultBodyLimit, Query, State},
    http::{header, Request},
    middleware::Next,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use error::ApiError;
use protokit_core::{
    AppId, AppStore, ComponentRegistry, EditorSession, FilesystemError, LauncherSettings,
    ProcessLauncher, ToolkitConfig,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

pub struct AppState {
    pub config: ToolkitConfig,
    pub session: RwLock<EditorSession>,
    pub registry: ComponentRegistry,
    pub launcher: Mutex<ProcessLauncher>,
}

impl AppState {
    /// Open the editor session (creating the placeholder app if needed).
    pub fn new(config: ToolkitConfig, registry: ComponentRegistry) -> Result<Self, FilesystemError> {
        let store = AppStore::new(&config.apps_dir, config.source_extension.clone());
        let session = EditorSession::open(store)?;
        let launcher = ProcessLauncher::new(LauncherSettings {
            program: config.dev_server_program.clone(),
            args: config.dev_server_args.clone(),
            port: config.dev_server_port,
            apps_dir: config.apps_dir.clone(),
            startup_grace: Duration::from_millis(config.dev_server_startup_grace_ms),
        });
        Ok(Self {
            config,
            session: RwLock::new(session),
            registry,
            launcher: Mutex::new(launcher),
        })
    }
}

#[derive(Deserialize)]
struct SaveRequest {
    source: String,
}

#[derive(Deserialize)]
struct SelectRequest {
    app_id: String,
}

#[derive(Deserialize)]
struct RecentQuery {
    #[serde(default)]
    n: Option<usize>,
}

#[derive(Deserialize)]
struct ComponentQuery {
    name: String,
}

#[derive(Deserialize)]
struct AddComponentRequest {
    name: String,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let classify_limit = state.config.classify_body_limit_bytes;
    Router::new()
        .route("/health", get(health))
        .route("/", get(serve_editor_ui))
        .route("/api/app", get(get_app).put(save_app))
        .route("/api/apps", get(list_apps).post(create_app))
        .route("/api/apps/select", post(select_app))
        .route("/api/app/run", post(run_app))
        .route("/api/app/download", get(download_app))
        .route("/api/app/download/link", get(download_link))
        .route("/api/components", get(list_components))
        .route("/api/components/source", get(component_source))
        .route("/api/components/add", post(add_component))
        .route(
            "/api/classify",
            post(classify_image).layer(DefaultBodyLimit::max(classify_limit)),
        )
        .with_state(state)
        .layer(axum::middleware::from_fn(log_requests))
}

async fn log_requests(request: Request<Body>, next: Next) -> Response {
    tracing::info!("[GATEWAY] {} {}", request.method(), request.uri());
    next.run(request).await
}

async fn health() -> &'static str {
    "OK"
}

/// Editor UI: code area, run/download buttons, component library, image upload.
async fn serve_editor_ui() -> Html<&'static str> {
    const INDEX: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/index.html"));
    Html(INDEX)
}

async fn get_app(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let session = state.session.read().await;
    let source = session.read_current()?;
    Ok(Json(serde_json::json!({
        "app_id": session.current().as_str(),
        "path": session.current_path().display().to_string(),
        "source": source,
    })))
}

async fn save_app(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SaveRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = state.session.read().await;
    session.save_current(&body.source)?;
    Ok(Json(serde_json::json!({
        "app_id": session.current().as_str(),
        "saved": true,
    })))
}

/// Newest `n` apps (default 10), oldest first, plus the current selection.
async fn list_apps(
    State(state): State<Arc<AppState>>,
    Query(q): Query<RecentQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = state.session.read().await;
    let apps: Vec<String> = session
        .store()
        .most_recent(q.n.unwrap_or(10))?
        .iter()
        .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_string()))
        .collect();
    Ok(Json(serde_json::json!({
        "current": session.current().as_str(),
        "apps": apps,
    })))
}

async fn create_app(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let mut session = state.session.write().await;
    let id = session.create_app()?;
    Ok(Json(serde_json::json!({ "app_id": id.as_str() })))
}

async fn select_app(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SelectRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = AppId::parse(&body.app_id)?;
    let mut session = state.session.write().await;
    session.select(id)?;
    Ok(Json(serde_json::json!({ "app_id": session.current().as_str() })))
}

/// Stop earlier app servers, then launch the current app in its own process.
/// Process-table sweeps and the startup grace wait run on the blocking pool.
async fn run_app(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let app_path = state.session.read().await.current_path();
    let worker = Arc::clone(&state);
    let (stopped, launched) = tokio::task::spawn_blocking(move || {
        let mut launcher = worker.launcher.blocking_lock();
        let stopped = launcher.stop_conflicting();
        launcher.launch(&app_path).map(|launched| (stopped, launched))
    })
    .await
    .map_err(|e| ApiError::internal(format!("Launcher task failed: {}", e)))??;
    Ok(Json(serde_json::json!({
        "pid": launched.pid,
        "url": launched.url,
        "stopped": stopped,
        "message": format!("Opening app in a new window. Visit {} to access app.", launched.url),
    })))
}

/// Current app as an attachment named `app_<app_id>.py`.
async fn download_app(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let payload = state.session.read().await.download()?;
    let bytes = payload
        .decode()
        .map_err(|e| ApiError::internal(format!("Download encoding failed: {}", e)))?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/x-python; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", payload.filename),
            ),
        ],
        bytes,
    )
        .into_response())
}

async fn download_link(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let payload = state.session.read().await.download()?;
    Ok(Json(serde_json::json!({
        "filename": payload.filename,
        "data_uri": payload.data_uri(),
        "html": payload.html_link(),
    })))
}

async fn list_components(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let index_url = state.config.component_index_url.as_str();
    let components = state.registry.list_components(index_url).await?;
    Ok(Json(serde_json::json!({
        "index_url": index_url,
        "components": components.as_slice(),
    })))
}

/// Component source for display only; it is never executed by the editor.
async fn component_source(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ComponentQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let component = state
        .registry
        .find(&state.config.component_index_url, &q.name)
        .await?;
    let source = state.registry.fetch_source(&component.url).await?;
    Ok(Json(serde_json::json!({
        "name": component.name,
        "url": component.url,
        "source": source.as_str(),
    })))
}

async fn add_component(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddComponentRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let component = state
        .registry
        .find(&state.config.component_index_url, &body.name)
        .await?;
    let component_source = state.registry.fetch_source(&component.url).await?;

    let session = state.session.read().await;
    let source = session.add_component(&component_source)?;
    Ok(Json(serde_json::json!({
        "app_id": session.current().as_str(),
        "component": component.name,
        "source": source,
        "message": "Success! App Component was added",
    })))
}

/// Raw image bytes in, one label out. The model is loaded per request.
async fn classify_image(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let body = body.map_err(|rejection| ApiError(rejection.status(), rejection.body_text()))?;
    let model_path = state.config.model_path.clone();
    let labels_path = state.config.labels_path.clone();
    let started = Instant::now();
    let label = tokio::task::spawn_blocking(move || {
        protokit_vision::classify(&model_path, &labels_path, &body)
    })
    .await
    .map_err(|e| ApiError::internal(format!("Classifier task failed: {}", e)))??;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    tracing::info!("[GATEWAY] Classified image as '{}' in {} ms", label, elapsed_ms);
    Ok(Json(serde_json::json!({
        "label": label,
        "display_label": label.to_uppercase(),
        "elapsed_ms": elapsed_ms,
    })))
}
