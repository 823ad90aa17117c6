//! Downloadable app payload (base64 body + `app_<app_id>.py` filename).

use crate::store::AppId;
use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadPayload {
    pub filename: String,
    pub base64: String,
}

impl DownloadPayload {
    pub fn new(app_id: &AppId, source: &str) -> Self {
        Self {
            filename: format!("app_{}.py", app_id),
            base64: general_purpose::STANDARD.encode(source.as_bytes()),
        }
    }

    pub fn data_uri(&self) -> String {
        format!("data:file/txt;base64,{}", self.base64)
    }

    /// Anchor the browser turns into a file download.
    pub fn html_link(&self) -> String {
        format!(
            r#"<a href="{}" download="{}">Click here to download My App code</a>"#,
            self.data_uri(),
            self.filename
        )
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        general_purpose::STANDARD.decode(&self.base64)
    }
}
