use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use photopass_core::{FlipAxis, ImageProcessor, Operation, ProcessError, ProcessorConfig};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "photopass", version)]
struct Cli {
    /// JSON config file. `PHOTOPASS_*` variables and the flags below override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding uploaded originals.
    #[arg(long, global = true)]
    upload_dir: Option<PathBuf>,

    /// Directory receiving processed outputs.
    #[arg(long, global = true)]
    processed_dir: Option<PathBuf>,

    /// ONNX segmentation model for background replacement.
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store an image under a generated identifier.
    Upload {
        /// Image file to upload.
        path: PathBuf,
    },
    /// List stored uploads.
    List,
    /// Delete a stored upload.
    Delete { filename: String },
    /// Show size, geometry and format of a stored upload.
    Info { filename: String },
    /// Scale brightness (0.1 to 3.0, 1.0 = unchanged).
    Brightness {
        filename: String,
        #[arg(long)]
        factor: f64,
    },
    /// Scale contrast around mid-gray (0.1 to 3.0).
    Contrast {
        filename: String,
        #[arg(long)]
        factor: f64,
    },
    /// Scale color saturation (0.0 to 3.0, 0.0 = grayscale).
    Saturation {
        filename: String,
        #[arg(long)]
        factor: f64,
    },
    /// Gaussian blur (radius 1 to 20).
    Blur {
        filename: String,
        #[arg(long)]
        radius: u32,
    },
    /// Unsharp-style sharpening (0.1 to 3.0).
    Sharpen {
        filename: String,
        #[arg(long)]
        factor: f64,
    },
    /// Convert to grayscale.
    Grayscale { filename: String },
    /// Apply a sepia tone.
    Sepia { filename: String },
    /// Resample to an exact size.
    Resize {
        filename: String,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
    },
    /// Cut out a rectangle.
    Crop {
        filename: String,
        #[arg(long)]
        x: u32,
        #[arg(long)]
        y: u32,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
    },
    /// Rotate counter-clockwise by degrees, expanding the canvas.
    Rotate {
        filename: String,
        #[arg(long, allow_hyphen_values = true)]
        angle: f64,
    },
    /// Mirror the image.
    Flip {
        filename: String,
        #[arg(long, value_enum)]
        direction: FlipChoice,
    },
    /// Replace the background with a solid `#RRGGBB` color.
    Background {
        filename: String,
        #[arg(long)]
        color: String,
    },
    /// Run an operation given as JSON, e.g. `{"operation":"blur","radius":3}`.
    Apply {
        filename: String,
        #[arg(long)]
        op: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FlipChoice {
    Horizontal,
    Vertical,
}

impl From<FlipChoice> for FlipAxis {
    fn from(choice: FlipChoice) -> Self {
        match choice {
            FlipChoice::Horizontal => FlipAxis::Horizontal,
            FlipChoice::Vertical => FlipAxis::Vertical,
        }
    }
}

/// Shape of a failed request on stdout.
#[derive(Serialize)]
struct Failure {
    error: String,
    kind: photopass_core::ErrorKind,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .with_context(|| format!("invalid log level '{}'", cli.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;
    let processor = ImageProcessor::new(config).context("initialize image processor")?;

    match run(&processor, cli.cmd) {
        Ok(()) => Ok(()),
        Err(Outcome::Process(e)) => {
            print_json(&Failure {
                error: e.to_string(),
                kind: e.kind(),
            })?;
            std::process::exit(1);
        }
        Err(Outcome::Other(e)) => Err(e),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ProcessorConfig> {
    let config = match &cli.config {
        Some(path) => ProcessorConfig::from_file(path)?,
        None => ProcessorConfig::default(),
    }
    .with_env_overrides()?;
    Ok(apply_flags(cli, config))
}

/// Command-line flags win over the file and the environment.
fn apply_flags(cli: &Cli, mut config: ProcessorConfig) -> ProcessorConfig {
    if let Some(dir) = &cli.upload_dir {
        config.upload_dir = dir.clone();
    }
    if let Some(dir) = &cli.processed_dir {
        config.processed_dir = dir.clone();
    }
    if let Some(model) = &cli.model {
        config.segmentation_model = Some(model.clone());
    }
    config
}

/// Service failures are reported as JSON; anything else aborts.
enum Outcome {
    Process(ProcessError),
    Other(anyhow::Error),
}

impl From<ProcessError> for Outcome {
    fn from(e: ProcessError) -> Self {
        Outcome::Process(e)
    }
}

impl From<anyhow::Error> for Outcome {
    fn from(e: anyhow::Error) -> Self {
        Outcome::Other(e)
    }
}

fn run(processor: &ImageProcessor, cmd: Command) -> Result<(), Outcome> {
    let (filename, op) = match cmd {
        Command::Upload { path } => {
            let receipt = upload_file(processor, &path)?;
            return Ok(print_json(&receipt)?);
        }
        Command::List => return Ok(print_json(&processor.list()?)?),
        Command::Delete { filename } => {
            processor.delete(&filename)?;
            return Ok(print_json(&serde_json::json!({
                "message": format!("Image {filename} deleted successfully"),
            }))?);
        }
        Command::Info { filename } => return Ok(print_json(&processor.info(&filename)?)?),
        Command::Brightness { filename, factor } => (filename, Operation::Brightness { factor }),
        Command::Contrast { filename, factor } => (filename, Operation::Contrast { factor }),
        Command::Saturation { filename, factor } => (filename, Operation::Saturation { factor }),
        Command::Blur { filename, radius } => (filename, Operation::Blur { radius }),
        Command::Sharpen { filename, factor } => (filename, Operation::Sharpen { factor }),
        Command::Grayscale { filename } => (filename, Operation::Grayscale),
        Command::Sepia { filename } => (filename, Operation::Sepia),
        Command::Resize {
            filename,
            width,
            height,
        } => (filename, Operation::Resize { width, height }),
        Command::Crop {
            filename,
            x,
            y,
            width,
            height,
        } => (
            filename,
            Operation::Crop {
                x,
                y,
                width,
                height,
            },
        ),
        Command::Rotate { filename, angle } => (filename, Operation::Rotate { angle }),
        Command::Flip {
            filename,
            direction,
        } => (
            filename,
            Operation::Flip {
                axis: direction.into(),
            },
        ),
        Command::Background { filename, color } => {
            (filename, Operation::ReplaceBackground { color })
        }
        Command::Apply { filename, op } => {
            let op: Operation = serde_json::from_str(&op)
                .with_context(|| format!("parse operation JSON '{op}'"))?;
            (filename, op)
        }
    };

    let result = processor.process(&filename, &op)?;
    Ok(print_json(&result)?)
}

fn upload_file(
    processor: &ImageProcessor,
    path: &Path,
) -> Result<photopass_core::UploadReceipt, Outcome> {
    let bytes = std::fs::read(path).with_context(|| format!("read '{}'", path.display()))?;
    let original_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("'{}' has no file name", path.display()))?;
    Ok(processor.upload(&original_name, &bytes)?)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{text}");
    Ok(())
}
