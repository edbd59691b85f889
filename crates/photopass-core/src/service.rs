//! Storage-backed processing service.
//!
//! [`ImageProcessor`] owns an upload directory and a processed directory.
//! It stores uploads under generated identifiers and runs one operation per
//! request: read, decode, transform (or segment and composite), encode, then
//! persist atomically. Every method takes `&self`, so one processor can be
//! shared across threads.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::background::{replace_background, BackgroundError, SegmentationError, Segmenter};
use crate::config::ProcessorConfig;
use crate::decode::{decode, probe, DecodeError};
use crate::encode::{encode, EncodeError};
use crate::engine;
use crate::naming::processed_name;
use crate::operation::Operation;
use crate::transform::TransformError;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Errors raised by the processing service.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Background(#[from] BackgroundError),

    #[error(transparent)]
    Segmentation(#[from] SegmentationError),

    /// Reading or writing storage failed.
    #[error("I/O failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image {0} not found")]
    NotFound(String),

    /// The identifier is not a plain file name.
    #[error("Invalid image identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("Unsupported file extension '{0}'")]
    UnsupportedExtension(String),

    #[error("File too large: {size} bytes (limit {limit})")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Image dimensions {width}x{height} exceed the {limit}px limit")]
    DimensionsTooLarge { width: u32, height: u32, limit: u32 },

    /// A processing request failed; `operation` carries its parameters.
    #[error("{operation} failed on {filename}: {source}")]
    Request {
        operation: String,
        filename: String,
        #[source]
        source: Box<ProcessError>,
    },
}

/// Coarse classification of a [`ProcessError`], for callers that map
/// failures onto their own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedFormat,
    OutOfBounds,
    InvalidColor,
    SegmentationUnavailable,
    IoFailure,
    InvalidRequest,
    NotFound,
}

impl ProcessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProcessError::Decode(_) => ErrorKind::UnsupportedFormat,
            ProcessError::Encode(_) | ProcessError::Io { .. } => ErrorKind::IoFailure,
            ProcessError::Transform(TransformError::OutOfBounds { .. }) => ErrorKind::OutOfBounds,
            ProcessError::Transform(_) => ErrorKind::InvalidRequest,
            ProcessError::Background(BackgroundError::InvalidColor(_)) => ErrorKind::InvalidColor,
            ProcessError::Background(BackgroundError::SegmentationUnavailable(_))
            | ProcessError::Segmentation(_) => ErrorKind::SegmentationUnavailable,
            ProcessError::NotFound(_) => ErrorKind::NotFound,
            ProcessError::InvalidIdentifier(_)
            | ProcessError::UnsupportedExtension(_)
            | ProcessError::FileTooLarge { .. }
            | ProcessError::DimensionsTooLarge { .. } => ErrorKind::InvalidRequest,
            ProcessError::Request { source, .. } => source.kind(),
        }
    }
}

/// Outcome of one processing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub message: String,
    pub original_filename: String,
    pub processed_filename: String,
    /// Wall-clock seconds spent on the request.
    pub processing_time: f64,
}

/// Outcome of an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Generated identifier the image is stored under.
    pub filename: String,
    pub original_name: String,
    pub size: u64,
}

/// One entry of [`ImageProcessor::list`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredImage {
    pub filename: String,
    pub size: u64,
    pub size_mb: f64,
}

/// Metadata of a stored upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub filename: String,
    pub size: u64,
    pub size_mb: f64,
    pub width: u32,
    pub height: u32,
    pub format: String,
    /// See [`crate::decode::ImageMetadata::mode`].
    pub mode: String,
}

/// The processing service.
pub struct ImageProcessor {
    config: ProcessorConfig,
    segmenter: Option<Arc<dyn Segmenter>>,
}

impl std::fmt::Debug for ImageProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageProcessor")
            .field("config", &self.config)
            .field("segmenter", &self.segmenter.is_some())
            .finish()
    }
}

impl ImageProcessor {
    /// Create a processor, making sure both directories exist.
    ///
    /// When `segmentation_model` is set and the `onnx` feature is enabled,
    /// the model is loaded here.
    pub fn new(config: ProcessorConfig) -> Result<Self, ProcessError> {
        for dir in [&config.upload_dir, &config.processed_dir] {
            fs::create_dir_all(dir).map_err(|source| ProcessError::Io {
                path: dir.clone(),
                source,
            })?;
        }

        let segmenter = match &config.segmentation_model {
            Some(path) => load_segmenter(path)?,
            None => None,
        };

        Ok(Self { config, segmenter })
    }

    /// Use `segmenter` for background replacement.
    pub fn with_segmenter(mut self, segmenter: Arc<dyn Segmenter>) -> Self {
        self.segmenter = Some(segmenter);
        self
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Location of a processed output.
    pub fn processed_path(&self, filename: &str) -> PathBuf {
        self.config.processed_dir.join(filename)
    }

    /// Store an uploaded image under a generated identifier.
    ///
    /// The claimed extension must be supported, the payload must fit the size
    /// limit and must actually decode as a supported format within the
    /// dimension limit.
    pub fn upload(&self, original_name: &str, bytes: &[u8]) -> Result<UploadReceipt, ProcessError> {
        let ext = extension_of(original_name);
        if !self.config.is_supported_extension(&ext) {
            warn!(original_name, "upload rejected: unsupported extension");
            return Err(ProcessError::UnsupportedExtension(ext));
        }

        let size = bytes.len() as u64;
        if size > self.config.max_file_size {
            warn!(original_name, size, "upload rejected: too large");
            return Err(ProcessError::FileTooLarge {
                size,
                limit: self.config.max_file_size,
            });
        }

        let meta = probe(bytes).inspect_err(|e| {
            warn!(original_name, error = %e, "upload rejected: unreadable content");
        })?;
        let limit = self.config.max_image_dimension;
        if meta.width > limit || meta.height > limit {
            warn!(
                original_name,
                width = meta.width,
                height = meta.height,
                "upload rejected: dimensions too large"
            );
            return Err(ProcessError::DimensionsTooLarge {
                width: meta.width,
                height: meta.height,
                limit,
            });
        }

        let filename = format!("{}{}", Uuid::new_v4(), ext.to_ascii_lowercase());
        write_atomic(&self.config.upload_dir.join(&filename), bytes)?;

        info!(%filename, original_name, size, "image uploaded");
        Ok(UploadReceipt {
            filename,
            original_name: original_name.to_string(),
            size,
        })
    }

    /// Stored uploads with a supported extension, sorted by file name.
    pub fn list(&self) -> Result<Vec<StoredImage>, ProcessError> {
        let dir = &self.config.upload_dir;
        let io_err = |source| ProcessError::Io {
            path: dir.clone(),
            source,
        };

        let mut images = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let Ok(filename) = entry.file_name().into_string() else {
                continue;
            };
            if !self.config.is_supported_extension(&extension_of(&filename)) {
                continue;
            }
            let meta = entry.metadata().map_err(io_err)?;
            if !meta.is_file() {
                continue;
            }
            images.push(StoredImage {
                filename,
                size: meta.len(),
                size_mb: size_in_mb(meta.len()),
            });
        }

        images.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(images)
    }

    /// Remove a stored upload.
    pub fn delete(&self, filename: &str) -> Result<(), ProcessError> {
        let path = self.upload_path(filename)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(filename, "image deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ProcessError::NotFound(filename.to_string()))
            }
            Err(source) => Err(ProcessError::Io { path, source }),
        }
    }

    /// Size, geometry, format and color mode of a stored upload.
    pub fn info(&self, filename: &str) -> Result<ImageInfo, ProcessError> {
        let bytes = self.read_upload(filename)?;
        let meta = probe(&bytes)?;
        let size = bytes.len() as u64;
        Ok(ImageInfo {
            filename: filename.to_string(),
            size,
            size_mb: size_in_mb(size),
            width: meta.width,
            height: meta.height,
            format: meta.format.name().to_string(),
            mode: meta.mode,
        })
    }

    /// Run one operation on a stored upload and persist the result.
    ///
    /// The output is written to the processed directory under
    /// [`processed_name`]. Either the complete output exists afterwards or
    /// nothing was written.
    pub fn process(&self, filename: &str, op: &Operation) -> Result<ProcessingResult, ProcessError> {
        self.run_request(filename, op).map_err(|e| {
            warn!(filename, operation = op.name(), error = %e, "operation failed");
            ProcessError::Request {
                operation: format!("{op:?}"),
                filename: filename.to_string(),
                source: Box::new(e),
            }
        })
    }

    fn run_request(&self, filename: &str, op: &Operation) -> Result<ProcessingResult, ProcessError> {
        let start = Instant::now();
        op.validate()?;

        let bytes = self.read_upload(filename)?;
        let image = decode(&bytes)?;
        debug!(
            filename,
            operation = op.name(),
            width = image.width,
            height = image.height,
            "decoded input"
        );

        let output = match op {
            Operation::ReplaceBackground { color } => {
                replace_background(&image, self.segmenter.as_deref(), color)?
            }
            _ => engine::apply(image, op)?,
        };

        let encoded = encode(&output)?;
        let processed_filename = processed_name(filename, op);
        write_atomic(&self.processed_path(&processed_filename), &encoded)?;

        let processing_time = start.elapsed().as_secs_f64();
        info!(
            filename,
            operation = op.name(),
            output = %processed_filename,
            elapsed_s = processing_time,
            "operation completed"
        );

        Ok(ProcessingResult {
            message: format!("{} applied successfully", op.name()),
            original_filename: filename.to_string(),
            processed_filename,
            processing_time,
        })
    }

    fn upload_path(&self, filename: &str) -> Result<PathBuf, ProcessError> {
        validate_identifier(filename)?;
        Ok(self.config.upload_dir.join(filename))
    }

    fn read_upload(&self, filename: &str) -> Result<Vec<u8>, ProcessError> {
        let path = self.upload_path(filename)?;
        fs::read(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ProcessError::NotFound(filename.to_string())
            } else {
                ProcessError::Io { path, source }
            }
        })
    }
}

#[cfg(feature = "onnx")]
fn load_segmenter(path: &Path) -> Result<Option<Arc<dyn Segmenter>>, ProcessError> {
    let segmenter = crate::background::OnnxSegmenter::from_file(path)?;
    Ok(Some(Arc::new(segmenter)))
}

#[cfg(not(feature = "onnx"))]
fn load_segmenter(path: &Path) -> Result<Option<Arc<dyn Segmenter>>, ProcessError> {
    warn!(
        model = %path.display(),
        "segmentation model configured but the onnx feature is disabled"
    );
    Ok(None)
}

/// Identifiers are plain file names: no separators, no `.`/`..`.
fn validate_identifier(filename: &str) -> Result<(), ProcessError> {
    let invalid = filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains(['/', '\\', '\0']);
    if invalid {
        return Err(ProcessError::InvalidIdentifier(filename.to_string()));
    }
    Ok(())
}

/// Lower-cased extension with its dot, or an empty string.
fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

fn size_in_mb(size: u64) -> f64 {
    (size as f64 / BYTES_PER_MB * 100.0).round() / 100.0
}

/// Write through a hidden sibling file and rename it into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ProcessError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = dir.join(format!(".{name}.{}.tmp", Uuid::new_v4().simple()));

    let result = (|| {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if let Err(source) = result {
        let _ = fs::remove_file(&tmp);
        return Err(ProcessError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}
