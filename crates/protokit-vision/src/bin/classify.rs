//! ProtoKit classify CLI: label a single image with the configured ONNX model.
//!
//! Usage:
//!   cargo run -p protokit-vision --bin protokit-classify -- dog.jpg [--model m.onnx] [--labels l.txt]
//!
//! Defaults come from `ToolkitConfig` (config/protokit.toml, PROTOKIT__MODEL_PATH, PROTOKIT__LABELS_PATH).

use protokit_core::ToolkitConfig;
use std::path::PathBuf;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ToolkitConfig::load()?;
    let mut model_path = config.model_path.clone();
    let mut labels_path = config.labels_path.clone();
    let mut image_path: Option<PathBuf> = None;

    let mut args = std::env::args().skip(1);
    while let Some(a) = args.next() {
        match a.as_str() {
            "--model" => {
                if let Some(p) = args.next() {
                    model_path = PathBuf::from(p);
                }
            }
            "--labels" => {
                if let Some(p) = args.next() {
                    labels_path = PathBuf::from(p);
                }
            }
            _ => image_path = Some(PathBuf::from(a)),
        }
    }

    let Some(image_path) = image_path else {
        eprintln!("ProtoKit — image classifier");
        eprintln!("  <image>            Image file to classify (PNG, JPEG, GIF, BMP, WebP)");
        eprintln!("  --model <path>     ONNX model (default {})", model_path.display());
        eprintln!("  --labels <path>    Label file, one class per line (default {})", labels_path.display());
        return Ok(());
    };

    info!("Classifying {}", image_path.display());
    let bytes = std::fs::read(&image_path)?;
    let label = protokit_vision::classify(&model_path, &labels_path, &bytes)?;
    println!("{}", label);
    Ok(())
}
