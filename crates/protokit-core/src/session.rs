//! EditorSession — the explicitly selected "current app" for one interactive user.

use crate::composer::AppComposer;
use crate::download::DownloadPayload;
use crate::error::{ComposeError, FilesystemError};
use crate::store::{AppId, AppStore};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct EditorSession {
    store: AppStore,
    current: AppId,
}

impl EditorSession {
    /// Ensure at least one app exists and select the newest.
    pub fn open(store: AppStore) -> Result<Self, FilesystemError> {
        let current = store.ensure_default_app()?;
        tracing::info!("[SESSION] Editing app {}", current);
        Ok(Self { store, current })
    }

    pub fn store(&self) -> &AppStore {
        &self.store
    }

    pub fn current(&self) -> &AppId {
        &self.current
    }

    pub fn current_path(&self) -> PathBuf {
        self.store.path_for(&self.current)
    }

    pub fn read_current(&self) -> Result<String, FilesystemError> {
        self.store.read(&self.current)
    }

    pub fn save_current(&self, text: &str) -> Result<(), FilesystemError> {
        self.store.write(&self.current, text)
    }

    /// Merge a component into the current app; returns the new source.
    pub fn add_component(&self, component_source: &str) -> Result<String, ComposeError> {
        AppComposer::add_component(&self.store, &self.current, component_source)
    }

    pub fn download(&self) -> Result<DownloadPayload, FilesystemError> {
        let source = self.read_current()?;
        Ok(DownloadPayload::new(&self.current, &source))
    }

    /// Switch to an existing app.
    pub fn select(&mut self, id: AppId) -> Result<(), FilesystemError> {
        if !self.store.exists(&id) {
            return Err(FilesystemError::NotFound(id.to_string()));
        }
        tracing::info!("[SESSION] Switched to app {}", id);
        self.current = id;
        Ok(())
    }

    /// Create a placeholder app and make it current.
    pub fn create_app(&mut self) -> Result<AppId, FilesystemError> {
        let id = self.store.create()?;
        self.current = id.clone();
        Ok(id)
    }
}
