//! ProtoKit — Core library.
//! App store, component registry, composer, and dev-server launcher behind the live editor.

pub mod composer;
pub mod config;
pub mod download;
pub mod error;
pub mod launcher;
pub mod registry;
pub mod session;
pub mod store;

pub use composer::{compose, is_import_line, split_imports, AppComposer, ImportSet, COMPONENT_MARKER};
pub use config::ToolkitConfig;
pub use download::DownloadPayload;
pub use error::{ComposeError, FilesystemError, LaunchError, RegistryError};
pub use launcher::{LaunchedApp, LauncherSettings, ProcessLauncher};
pub use registry::{parse_index, Component, ComponentRegistry, Fetch, HttpFetcher};
pub use session::EditorSession;
pub use store::{AppId, AppStore, PLACEHOLDER_APP};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
