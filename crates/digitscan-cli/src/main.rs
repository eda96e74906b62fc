// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Digitscan: command-line front end.
//
// Entry point. Initialises logging, loads the normalizer configuration, runs
// the pipeline on a file or a camera data URL, and prints a JSON report.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use digitscan_core::error::{DigitscanError, Result};
use digitscan_core::human_errors::humanize_error;
use digitscan_core::{
    ImageInput, NormalizeOptions, NormalizerConfig, ThresholdStrategy, UploadFormat,
};
use digitscan_imaging::{DigitNormalizer, ThresholdAttempt};

#[derive(Parser)]
#[command(name = "digitscan")]
#[command(about = "Normalize photos of handwritten digits into 28x28 classifier tensors")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the normalization pipeline and print a JSON report.
    Normalize(NormalizeArgs),

    /// Print the effective normalizer configuration as JSON.
    Config(ConfigArgs),
}

#[derive(Debug, Clone, Args)]
struct NormalizeArgs {
    /// Path to a PNG, JPEG, or BMP image.
    #[arg(long, conflicts_with = "data_url", required_unless_present = "data_url")]
    image: Option<PathBuf>,

    /// Path to a text file holding a `data:image/...;base64,` camera capture.
    #[arg(long)]
    data_url: Option<PathBuf>,

    /// Include the 28x28 preview as base64 PNG in the report.
    #[arg(long)]
    preview: bool,

    /// Write the 28x28 bitmap to this PNG file.
    #[arg(long)]
    debug_out: Option<PathBuf>,

    /// JSON file overriding normalizer settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pretty-print the JSON report.
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    /// JSON file overriding normalizer settings; defaults are printed without it.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// What `digitscan normalize` prints.
#[derive(Debug, Serialize)]
struct NormalizeReport {
    source: String,
    width: u32,
    height: u32,
    accepted: ThresholdStrategy,
    attempts: Vec<ThresholdAttempt>,
    tensor_shape: [usize; 4],
    foreground_fraction: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    preview: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Normalize(args) => run_normalize(&args),
        Commands::Config(args) => run_config(&args),
    };

    match outcome {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(%err, "digitscan failed");
            let human = humanize_error(&err);
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

fn run_normalize(args: &NormalizeArgs) -> Result<String> {
    let report = build_report(args)?;
    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    Ok(json)
}

fn run_config(args: &ConfigArgs) -> Result<String> {
    let normalizer = load_normalizer(args.config.as_deref())?;
    Ok(serde_json::to_string_pretty(normalizer.config())?)
}

fn load_normalizer(config: Option<&Path>) -> Result<DigitNormalizer> {
    let config = match config {
        Some(path) => NormalizerConfig::from_json_file(path)?,
        None => NormalizerConfig::default(),
    };
    DigitNormalizer::new(config)
}

fn build_report(args: &NormalizeArgs) -> Result<NormalizeReport> {
    let normalizer = load_normalizer(args.config.as_deref())?;

    let (input, source) = resolve_input(args)?;
    let options = NormalizeOptions {
        want_preview: args.preview,
        debug_output: args.debug_out.clone(),
    };
    let result = normalizer.normalize(input, &options)?;

    let preview = result
        .preview
        .as_ref()
        .map(|preview| preview.to_base64())
        .transpose()?;

    Ok(NormalizeReport {
        source,
        width: result.source_dimensions.0,
        height: result.source_dimensions.1,
        accepted: result.accepted,
        attempts: result.attempts,
        tensor_shape: result.tensor.shape(),
        foreground_fraction: result.tensor.foreground_fraction(),
        preview,
    })
}

fn resolve_input(args: &NormalizeArgs) -> Result<(ImageInput, String)> {
    if let Some(path) = &args.image {
        let format = check_upload_format(path)?;
        tracing::debug!(mime = format.mime_type(), "Upload format accepted");
        return Ok((ImageInput::File(path.clone()), path.display().to_string()));
    }
    match &args.data_url {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let input = ImageInput::from_data_url(&text)?;
            Ok((input, format!("data URL from {}", path.display())))
        }
        None => Err(DigitscanError::InvalidInput(
            "either --image or --data-url is required".into(),
        )),
    }
}

fn check_upload_format(path: &Path) -> Result<UploadFormat> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    UploadFormat::from_filename(&name).ok_or(DigitscanError::UnsupportedFormat(name))
}
