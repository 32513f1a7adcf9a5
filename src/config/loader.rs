use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use eyre::{Context, Result};
use serde::de::DeserializeOwned;

use crate::config::models::{EditorConfig, Route};

/// Load editor settings from a file using the config crate.
/// Supports multiple formats: YAML, JSON, TOML, etc.
pub async fn load_config(config_path: &str) -> Result<EditorConfig> {
    load_config_sync(config_path)
}

/// Load editor settings synchronously.
///
/// Values from `ROUTE_EDITOR_*` environment variables override the file, using
/// `__` as the nesting separator (`ROUTE_EDITOR_DIRECTORIES__SERVICES=...`).
pub fn load_config_sync(config_path: &str) -> Result<EditorConfig> {
    let config_path = Path::new(config_path);

    let format = match config_path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => FileFormat::Yaml,
        Some("json") => FileFormat::Json,
        Some("toml") => FileFormat::Toml,
        Some("ini") => FileFormat::Ini,
        _ => FileFormat::Yaml, // Default to YAML
    };

    let settings = Config::builder()
        .add_source(File::new(
            config_path
                .to_str()
                .ok_or_else(|| eyre::eyre!("Invalid UTF-8 path: {}", config_path.display()))?,
            format,
        ))
        .add_source(
            Environment::with_prefix("ROUTE_EDITOR")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .with_context(|| format!("Failed to build config from {}", config_path.display()))?;

    let editor_config: EditorConfig = settings.try_deserialize().with_context(|| {
        format!(
            "Failed to deserialize config from {}",
            config_path.display()
        )
    })?;

    Ok(editor_config)
}

/// Read a JSON document (route record, form state, directory payload).
pub async fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse JSON from {}", path.display()))
}

/// Read a persisted route record.
pub async fn load_route(path: impl AsRef<Path>) -> Result<Route> {
    load_json(path).await
}
