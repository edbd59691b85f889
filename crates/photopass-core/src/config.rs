//! Processor configuration.
//!
//! Defaults match a local deployment: uploads in `./uploads`, outputs in
//! `./processed`, 10 MiB files, 4096 px per axis. A JSON file can override
//! any subset of fields and `PHOTOPASS_*` environment variables override
//! both.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default upload size limit in bytes.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default per-axis dimension limit.
pub const DEFAULT_MAX_IMAGE_DIMENSION: u32 = 4096;

/// Extensions accepted at upload and shown by listing.
pub const DEFAULT_EXTENSIONS: [&str; 6] = [".jpg", ".jpeg", ".png", ".bmp", ".tiff", ".webp"];

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },
}

/// Settings for [`crate::service::ImageProcessor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Directory holding uploaded originals.
    pub upload_dir: PathBuf,
    /// Directory receiving processed outputs.
    pub processed_dir: PathBuf,
    /// Maximum upload size in bytes.
    pub max_file_size: u64,
    /// Maximum width and height of an uploaded image.
    pub max_image_dimension: u32,
    /// Accepted extensions, lower-case with leading dot.
    pub supported_extensions: Vec<String>,
    /// ONNX model used for background replacement, if any.
    pub segmentation_model: Option<PathBuf>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            processed_dir: PathBuf::from("processed"),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_image_dimension: DEFAULT_MAX_IMAGE_DIMENSION,
            supported_extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            segmentation_model: None,
        }
    }
}

impl ProcessorConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `PHOTOPASS_*` environment variables on top of this config.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(dir) = lookup("PHOTOPASS_UPLOAD_DIR") {
            self.upload_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("PHOTOPASS_PROCESSED_DIR") {
            self.processed_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup("PHOTOPASS_MAX_FILE_SIZE") {
            self.max_file_size = parse_env("PHOTOPASS_MAX_FILE_SIZE", value)?;
        }
        if let Some(value) = lookup("PHOTOPASS_MAX_IMAGE_DIMENSION") {
            self.max_image_dimension = parse_env("PHOTOPASS_MAX_IMAGE_DIMENSION", value)?;
        }
        if let Some(model) = lookup("PHOTOPASS_SEGMENTATION_MODEL") {
            self.segmentation_model = (!model.is_empty()).then(|| PathBuf::from(model));
        }
        Ok(self)
    }

    /// Whether `ext` (with leading dot, any case) is accepted.
    pub fn is_supported_extension(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        self.supported_extensions.iter().any(|e| *e == ext)
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    match value.trim().parse::<T>() {
        Ok(v) => Ok(v),
        Err(_) => Err(ConfigError::InvalidEnv { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ProcessorConfig::default();
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.processed_dir, PathBuf::from("processed"));
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.max_image_dimension, 4096);
        assert_eq!(config.supported_extensions.len(), 6);
        assert!(config.segmentation_model.is_none());
    }

    #[test]
    fn test_supported_extension_case_insensitive() {
        let config = ProcessorConfig::default();
        assert!(config.is_supported_extension(".JPG"));
        assert!(config.is_supported_extension(".webp"));
        assert!(!config.is_supported_extension(".gif"));
        assert!(!config.is_supported_extension(".tif"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photopass.json");
        std::fs::write(&path, r#"{"upload_dir": "/data/in", "max_file_size": 1024}"#).unwrap();

        let config = ProcessorConfig::from_file(&path).unwrap();
        assert_eq!(config.upload_dir, PathBuf::from("/data/in"));
        assert_eq!(config.max_file_size, 1024);
        assert_eq!(config.processed_dir, PathBuf::from("processed"));
        assert_eq!(config.max_image_dimension, 4096);
    }

    #[test]
    fn test_from_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = ProcessorConfig::from_file(dir.path().join("nope.json"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{not json").unwrap();
        assert!(matches!(
            ProcessorConfig::from_file(&bad),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PHOTOPASS_UPLOAD_DIR", "/srv/uploads"),
            ("PHOTOPASS_MAX_IMAGE_DIMENSION", "2048"),
            ("PHOTOPASS_SEGMENTATION_MODEL", "/models/u2net.onnx"),
        ]
        .into_iter()
        .collect();

        let config = ProcessorConfig::default()
            .with_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.upload_dir, PathBuf::from("/srv/uploads"));
        assert_eq!(config.max_image_dimension, 2048);
        assert_eq!(
            config.segmentation_model,
            Some(PathBuf::from("/models/u2net.onnx"))
        );
        assert_eq!(config.processed_dir, PathBuf::from("processed"));
    }

    #[test]
    fn test_invalid_override() {
        let result = ProcessorConfig::default().with_overrides(|k| {
            (k == "PHOTOPASS_MAX_FILE_SIZE").then(|| "ten megabytes".to_string())
        });
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnv {
                var: "PHOTOPASS_MAX_FILE_SIZE",
                ..
            })
        ));
    }

    #[test]
    fn test_serde_roundtrip_shape() {
        let json = serde_json::to_value(ProcessorConfig::default()).unwrap();
        assert_eq!(json["max_image_dimension"], 4096);
        assert_eq!(json["upload_dir"], "uploads");
        assert!(json["segmentation_model"].is_null());
    }
}
