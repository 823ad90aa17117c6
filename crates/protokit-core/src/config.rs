//! Toolkit configuration loaded from TOML and environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default component catalogue (JSON array of `{name, url}`).
pub const DEFAULT_COMPONENT_INDEX_URL: &str =
    "https://raw.githubusercontent.com/virusvn/streamlit-components-demo/master/streamlit_apps.json";

/// Global toolkit configuration (gateway, app store, launcher, classifier).
///
/// | Key | Default | Description |
/// |-----|---------|-------------|
/// | apps_dir | ./app_data | Flat directory of `<app_id>.py` files |
/// | source_extension | .py | App/component source extension |
/// | component_index_url | see [`DEFAULT_COMPONENT_INDEX_URL`] | Remote component index |
/// | http_timeout_secs | 15 | Per-request timeout for registry fetches |
/// | dev_server_program | streamlit | Program used to run an app |
/// | dev_server_args | ["run"] | Arguments placed before the app path |
/// | dev_server_port | 8502 | Well-known port of the launched app |
/// | dev_server_startup_grace_ms | 300 | How long `launch` watches for an immediate exit |
/// | bind_addr | 127.0.0.1:8501 | Gateway listen address |
/// | model_path | ./models/resnet50.onnx | ONNX image classifier |
/// | labels_path | ./models/imagenet_classes.txt | One label per line |
/// | classify_body_limit_bytes | 33554432 | Largest accepted image upload (32 MiB) |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolkitConfig {
    pub apps_dir: PathBuf,
    pub source_extension: String,
    pub component_index_url: String,
    pub http_timeout_secs: u64,
    pub dev_server_program: String,
    #[serde(default)]
    pub dev_server_args: Vec<String>,
    pub dev_server_port: u16,
    pub dev_server_startup_grace_ms: u64,
    pub bind_addr: String,
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    pub classify_body_limit_bytes: usize,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            apps_dir: PathBuf::from("./app_data"),
            source_extension: ".py".to_string(),
            component_index_url: DEFAULT_COMPONENT_INDEX_URL.to_string(),
            http_timeout_secs: 15,
            dev_server_program: "streamlit".to_string(),
            dev_server_args: vec!["run".to_string()],
            dev_server_port: 8502,
            dev_server_startup_grace_ms: 300,
            bind_addr: "127.0.0.1:8501".to_string(),
            model_path: PathBuf::from("./models/resnet50.onnx"),
            labels_path: PathBuf::from("./models/imagenet_classes.txt"),
            classify_body_limit_bytes: 32 * 1024 * 1024,
        }
    }
}

impl ToolkitConfig {
    /// Load config from file and environment. Precedence: env `PROTOKIT__*` > file
    /// (`PROTOKIT_CONFIG` path, else `config/protokit.toml`) > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("PROTOKIT_CONFIG").unwrap_or_else(|_| "config/protokit.toml".to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Same as [`ToolkitConfig::load`] with an explicit file path (missing file is fine).
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let d = Self::default();
        let builder = config::Config::builder()
            .set_default("apps_dir", d.apps_dir.to_string_lossy().to_string())?
            .set_default("source_extension", d.source_extension)?
            .set_default("component_index_url", d.component_index_url)?
            .set_default("http_timeout_secs", d.http_timeout_secs as i64)?
            .set_default("dev_server_program", d.dev_server_program)?
            .set_default("dev_server_args", d.dev_server_args)?
            .set_default("dev_server_port", d.dev_server_port as i64)?
            .set_default("dev_server_startup_grace_ms", d.dev_server_startup_grace_ms as i64)?
            .set_default("bind_addr", d.bind_addr)?
            .set_default("model_path", d.model_path.to_string_lossy().to_string())?
            .set_default("labels_path", d.labels_path.to_string_lossy().to_string())?
            .set_default("classify_body_limit_bytes", d.classify_body_limit_bytes as i64)?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("PROTOKIT").separator("__"))
            .build()?;

        built.try_deserialize()
    }

    /// Well-known URL where a launched app is served.
    pub fn app_endpoint(&self) -> String {
        format!("http://localhost:{}/", self.dev_server_port)
    }
}
