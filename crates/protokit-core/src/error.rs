//! Error taxonomy for the app-authoring flow.
//!
//! Every variant renders a human-readable message; the gateway shows it inline
//! and keeps the session alive.

use std::path::PathBuf;
use thiserror::Error;

/// Read/write failures on the app store.
#[derive(Error, Debug)]
pub enum FilesystemError {
    #[error("Failed to create app directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list apps in {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read app {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save app {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("App not found: {0}")]
    NotFound(String),

    #[error("App already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid app id '{0}' (expected YYYYMMDD_HHMMSS)")]
    InvalidId(String),
}

/// Network or parse failures while talking to the component registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to build registry HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Registry request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Registry returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Malformed component index: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown component: {0}")]
    UnknownComponent(String),
}

/// A merge that was aborted before anything was written.
#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Failed to add component: {0}")]
    Store(#[from] FilesystemError),
}

/// The dev server could not be started.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("App file does not exist: {0}")]
    MissingApp(PathBuf),

    #[error("Failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited immediately ({status})")]
    ExitedEarly { program: String, status: String },
}
