//! Command-line configuration for tiff-raster.
//!
//! Every option can also be set with a `TIFF_RASTER_` environment variable:
//!
//! - `TIFF_RASTER_IMAGE` - Image index (default: all images for `info`, current image for `decode`)
//! - `TIFF_RASTER_JSON` - Print `info` output as JSON (default: false)
//! - `TIFF_RASTER_FORMAT` - Output format of `decode`: png or raw (default: png)
//! - `TIFF_RASTER_MAX_INPUT_SIZE` - Largest input file accepted, in bytes (default: 1 GiB)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// =============================================================================
// Default Values
// =============================================================================

/// Default upper bound on the input file size (1 GiB).
///
/// The whole file is held in memory while decoding.
pub const DEFAULT_MAX_INPUT_SIZE: u64 = 1024 * 1024 * 1024;

/// Default output format of the decode command.
pub const DEFAULT_OUTPUT_FORMAT: OutputFormat = OutputFormat::Png;

// =============================================================================
// CLI Arguments
// =============================================================================

/// tiff-raster - Decode TIFF images into raw or PNG rasters.
#[derive(Parser, Debug, Clone)]
#[command(name = "tiff-raster")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the metadata of one or all images in a TIFF file.
    Info(InfoConfig),

    /// Decode one image to a raw raster or a PNG.
    Decode(DecodeConfig),
}

/// Output format of the decode command.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// PNG, for 8-bit gray, gray+alpha, RGB, RGBA and palette images
    Png,
    /// The decoded bytes exactly as produced
    Raw,
}

#[derive(Args, Debug, Clone)]
pub struct InfoConfig {
    /// TIFF file to inspect.
    pub input: PathBuf,

    /// Only report this image (zero-based).
    #[arg(short, long, env = "TIFF_RASTER_IMAGE")]
    pub image: Option<u32>,

    /// Print JSON instead of text.
    #[arg(long, default_value_t = false, env = "TIFF_RASTER_JSON")]
    pub json: bool,

    /// Largest input file accepted, in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_INPUT_SIZE, env = "TIFF_RASTER_MAX_INPUT_SIZE")]
    pub max_input_size: u64,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl InfoConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        validate_input(&self.input, self.max_input_size)
    }
}

#[derive(Args, Debug, Clone)]
pub struct DecodeConfig {
    /// TIFF file to decode.
    pub input: PathBuf,

    /// Where to write the decoded image.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Image to decode (zero-based); the first image when omitted.
    #[arg(short, long, env = "TIFF_RASTER_IMAGE")]
    pub image: Option<u32>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = DEFAULT_OUTPUT_FORMAT, env = "TIFF_RASTER_FORMAT")]
    pub format: OutputFormat,

    /// Largest input file accepted, in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_INPUT_SIZE, env = "TIFF_RASTER_MAX_INPUT_SIZE")]
    pub max_input_size: u64,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl DecodeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        validate_input(&self.input, self.max_input_size)?;

        if self.output.as_os_str().is_empty() {
            return Err("Output path is required. Set --output".to_string());
        }
        if self.output == self.input {
            return Err("Output path must differ from the input path".to_string());
        }

        Ok(())
    }
}

fn validate_input(input: &std::path::Path, max_input_size: u64) -> Result<(), String> {
    if input.as_os_str().is_empty() {
        return Err("Input path is required".to_string());
    }
    if max_input_size < 8 {
        return Err("max_input_size must be at least 8 bytes (one TIFF header)".to_string());
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
