//! AppStore — flat directory of `<app_id>.py` files, one per app.
//! Timestamp-prefixed names sort chronologically, so "most recent" is a lexicographic question.

use crate::error::FilesystemError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

static APP_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{8}_\d{6}$").expect("app id pattern"));

/// Seed content for a brand new app.
pub const PLACEHOLDER_APP: &str = "import streamlit as st\n\
import requests\n\
\n\
# Click the `Run App` button in the side panel to test this app\n\
st.write(\"Hello, Streamlit! :sunglasses:\")\n\
st.video(\"https://www.youtube.com/watch?v=BkaqYAGwv5g\")";

/// App identifier: local creation time formatted `YYYYMMDD_HHMMSS`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AppId(String);

impl AppId {
    /// Id for "now" in local time.
    pub fn now() -> Self {
        Self(chrono::Local::now().format("%Y%m%d_%H%M%S").to_string())
    }

    pub fn parse(s: &str) -> Result<Self, FilesystemError> {
        let s = s.trim();
        if APP_ID_RE.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(FilesystemError::InvalidId(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Filesystem-backed app store. Single writer, single reader.
#[derive(Debug, Clone)]
pub struct AppStore {
    dir: PathBuf,
    extension: String,
}

impl AppStore {
    /// `extension` includes the dot (e.g. ".py").
    pub fn new(dir: impl AsRef<Path>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            extension: extension.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn path_for(&self, id: &AppId) -> PathBuf {
        self.dir.join(format!("{}{}", id, self.extension))
    }

    /// Create the app directory and a placeholder app if none exists.
    /// Returns the newest app id (the placeholder when one was just created).
    pub fn ensure_default_app(&self) -> Result<AppId, FilesystemError> {
        fs::create_dir_all(&self.dir).map_err(|source| FilesystemError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        if let Some(newest) = self.list()?.pop() {
            return Ok(newest);
        }

        let id = AppId::now();
        self.write(&id, PLACEHOLDER_APP)?;
        tracing::info!("[APPSTORE] Created placeholder app {}", self.path_for(&id).display());
        Ok(id)
    }

    /// Create a new app seeded with the placeholder. Fails if the id is already taken
    /// (two creations within the same second).
    pub fn create(&self) -> Result<AppId, FilesystemError> {
        fs::create_dir_all(&self.dir).map_err(|source| FilesystemError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;
        let id = AppId::now();
        if self.exists(&id) {
            return Err(FilesystemError::AlreadyExists(id.to_string()));
        }
        self.write(&id, PLACEHOLDER_APP)?;
        tracing::info!("[APPSTORE] Created app {}", id);
        Ok(id)
    }

    pub fn exists(&self, id: &AppId) -> bool {
        self.path_for(id).is_file()
    }

    /// All app ids in ascending (chronological) order. Non-matching files are ignored;
    /// a missing directory is an empty store.
    pub fn list(&self) -> Result<Vec<AppId>, FilesystemError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(FilesystemError::List {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut ids: Vec<AppId> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().to_string();
                name.strip_suffix(self.extension.as_str())
                    .and_then(|stem| AppId::parse(stem).ok())
            })
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// The `n` newest app paths in ascending filename order. Regenerates the
    /// placeholder if the directory holds no apps.
    pub fn most_recent(&self, n: usize) -> Result<Vec<PathBuf>, FilesystemError> {
        let mut ids = self.list()?;
        if ids.is_empty() {
            ids.push(self.ensure_default_app()?);
        }
        let start = ids.len().saturating_sub(n);
        Ok(ids[start..].iter().map(|id| self.path_for(id)).collect())
    }

    /// The `n` oldest app paths in ascending filename order.
    pub fn oldest(&self, n: usize) -> Result<Vec<PathBuf>, FilesystemError> {
        Ok(self
            .list()?
            .iter()
            .take(n)
            .map(|id| self.path_for(id))
            .collect())
    }

    pub fn read(&self, id: &AppId) -> Result<String, FilesystemError> {
        let path = self.path_for(id);
        fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                FilesystemError::NotFound(id.to_string())
            } else {
                FilesystemError::Read { path, source }
            }
        })
    }

    /// Replace the app's full content. Writes a sibling temp file and renames it over
    /// the target, so readers never see a half-written app.
    pub fn write(&self, id: &AppId, text: &str) -> Result<(), FilesystemError> {
        let path = self.path_for(id);
        let tmp = self.dir.join(format!(".{}{}.tmp", id, self.extension));

        if let Err(source) = fs::write(&tmp, text) {
            let _ = fs::remove_file(&tmp);
            return Err(FilesystemError::Write { path, source });
        }
        if let Err(source) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(FilesystemError::Write { path, source });
        }
        tracing::debug!("[APPSTORE] Saved {} ({} bytes)", path.display(), text.len());
        Ok(())
    }
}
