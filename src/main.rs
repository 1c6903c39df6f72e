//! tiff-raster - Decode TIFF images from the command line.
//!
//! `info` prints image metadata, `decode` writes an image as a raw raster
//! or a PNG. Logs go to stderr so that stdout carries only results.

use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiff_raster::{
    config::{Cli, Command, DecodeConfig, InfoConfig, OutputFormat},
    decode_image, encode_png, read_image_info, Container, DecodeStatus, ImageInfo, TiffFile,
};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Info(config) => run_info(config),
        Command::Decode(config) => run_decode(config),
    }
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tiff_raster=debug"
    } else {
        "tiff_raster=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Read the whole input file, refusing files above `max_size` bytes.
fn read_input(path: &Path, max_size: u64) -> Result<Vec<u8>, String> {
    let metadata =
        std::fs::metadata(path).map_err(|e| format!("Cannot stat {}: {}", path.display(), e))?;
    if metadata.len() > max_size {
        return Err(format!(
            "{} is {} bytes, above the {} byte limit (--max-input-size)",
            path.display(),
            metadata.len(),
            max_size
        ));
    }
    std::fs::read(path).map_err(|e| format!("Cannot read {}: {}", path.display(), e))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// =============================================================================
// Info Command
// =============================================================================

fn run_info(config: InfoConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let data = match read_input(&config.input, config.max_input_size) {
        Ok(data) => data,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut file = match TiffFile::open_bytes(&data, &display_name(&config.input)) {
        Ok(file) => file,
        Err(e) => {
            error!("Cannot open {}: {}", config.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let indices: Vec<u32> = match config.image {
        Some(index) => vec![index],
        None => (0..file.image_count() as u32).collect(),
    };

    let mut images = Vec::with_capacity(indices.len());
    for index in indices {
        match read_image_info(&mut file, Some(index)) {
            Ok(info) => images.push(info),
            Err(e) => {
                error!("Image {}: {}", index, e);
                return ExitCode::FAILURE;
            }
        }
    }

    if config.json {
        match serde_json::to_string_pretty(&images) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Cannot serialize image info: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        let header = file.header();
        println!(
            "{} ({}, {:?})",
            config.input.display(),
            if header.is_bigtiff { "BigTIFF" } else { "TIFF" },
            header.byte_order
        );
        for image in &images {
            print_info(image);
        }
    }

    ExitCode::SUCCESS
}

fn print_info(info: &ImageInfo) {
    println!();
    println!(
        "Image {} of {}",
        info.image_index.unwrap_or(0) + 1,
        info.num_images
    );
    println!("  Size:          {} x {}", info.width, info.height);
    println!(
        "  Samples:       {} x {} bit ({:?})",
        info.samples_per_pixel, info.bits_per_sample, info.planar_config
    );
    println!("  Photometric:   {}", info.photometric.name());
    println!("  Compression:   {}", info.compression);
    println!("  Subfile type:  {}", info.subfile_type);
    if let Some(description) = &info.description {
        println!("  Description:   {}", description);
    }
}

// =============================================================================
// Decode Command
// =============================================================================

fn run_decode(config: DecodeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let data = match read_input(&config.input, config.max_input_size) {
        Ok(data) => data,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut file = match TiffFile::open_bytes(&data, &display_name(&config.input)) {
        Ok(file) => file,
        Err(e) => {
            error!("Cannot open {}: {}", config.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let decoded = match decode_image(&mut file, config.image) {
        Ok(decoded) => decoded,
        Err(e) => {
            error!("Cannot decode {}: {}", config.input.display(), e);
            return ExitCode::FAILURE;
        }
    };
    file.close();

    if let DecodeStatus::Aborted { row, sample, reason } = &decoded.outcome.status {
        error!(
            "Decoding stopped at row {} (sample {}): {}",
            row, sample, reason
        );
        return ExitCode::FAILURE;
    }

    let info = &decoded.outcome.info;
    let bytes = match config.format {
        OutputFormat::Raw => decoded.pixels,
        OutputFormat::Png => match encode_png(info, &decoded.pixels) {
            Ok(png) => png.to_vec(),
            Err(e) => {
                error!("{}", e);
                warn!("Use --format raw to write the decoded bytes as they are");
                return ExitCode::FAILURE;
            }
        },
    };

    if let Err(e) = std::fs::write(&config.output, &bytes) {
        error!("Cannot write {}: {}", config.output.display(), e);
        return ExitCode::FAILURE;
    }

    info!(
        "Wrote {} ({} x {}, {} bytes)",
        config.output.display(),
        info.width,
        info.height,
        bytes.len()
    );
    ExitCode::SUCCESS
}
