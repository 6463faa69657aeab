//! Pixel Portal batch driver.
//!
//! A headless shell over the document core: create, inspect, and export
//! documents from the command line. Any GUI host drives the same crates; this
//! binary doubles as the reference for wiring them together (config → history
//! capacity, document → exports).

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use core_doc::Document;
use core_raster::Color;
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "pixel-portal", version, about = "Pixel Portal document tool")]
struct Args {
    /// Configuration file path (overrides discovery of `pixel-portal.toml`).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Append logs to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print document dimensions, frames, keys, and layer structure.
    Info { file: PathBuf },
    /// Create a blank document using the new-document configuration.
    New {
        file: PathBuf,
        /// Canvas width; defaults to the configured value.
        #[arg(long)]
        width: Option<u32>,
        /// Canvas height; defaults to the configured value.
        #[arg(long)]
        height: Option<u32>,
    },
    /// Export one playback frame as a PNG.
    ExportPng {
        file: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Playback index to render (hold-last-key resolution).
        #[arg(long, default_value_t = 0)]
        frame: usize,
        /// Integer nearest-neighbor upscale factor.
        #[arg(long, default_value_t = 1)]
        pixel_size: u32,
    },
    /// Export the whole timeline as a looping GIF.
    ExportGif {
        file: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value_t = 1)]
        pixel_size: u32,
    },
    /// Export the current frame's layers as a multi-image TIFF plus sidecar.
    ExportTiff {
        file: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Cluster an image into a 16-color palette and print the hex values.
    Palette { image: PathBuf },
}

fn init_logging(log_file: Option<&PathBuf>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."));
            let name = path.file_name().unwrap_or_else(|| "pixel-portal.log".as_ref());
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging(args.log_file.as_ref());
    let config = core_config::load_from(args.config.clone());
    info!(target: "runtime", command = ?args.command, "startup");

    match args.command {
        Command::Info { file } => {
            let doc = core_io::load_document(&file)
                .with_context(|| format!("loading {}", file.display()))?;
            println!("{}x{} pixels", doc.width(), doc.height());
            println!(
                "{} frame(s), keys: {:?}, fps {}, playback length {}",
                doc.frames.frame_count(),
                doc.frames.keys().collect::<Vec<_>>(),
                doc.frames.fps,
                doc.frames.playback_total,
            );
            for (i, layer) in doc.layers().iter().enumerate() {
                let marker = if i == doc.layers().active_index() { "*" } else { " " };
                println!(
                    "{marker} [{i}] {:30} visible={} opacity={:.2}",
                    layer.name(),
                    layer.visible,
                    layer.opacity,
                );
            }
            if let Some(sel) = doc.selection() {
                println!("selection: {:?}", sel.bounding_rect());
            }
        }
        Command::New { file, width, height } => {
            let defaults = &config.file.new_document;
            let w = width.unwrap_or(defaults.width);
            let h = height.unwrap_or(defaults.height);
            let fill = Color::from_hex(&defaults.first_layer_fill_color)
                .unwrap_or(Color::TRANSPARENT);
            let mut doc = Document::with_background(w, h, fill);
            for i in 1..defaults.layers {
                doc.layers_mut()
                    .add(format!("Layer {}", i + 1))
                    .context("adding configured layers")?;
            }
            doc.frames.fps = config.file.animation.fps;
            doc.frames.playback_total = config.file.animation.total_frames;
            core_io::save_document(&file, &doc)
                .with_context(|| format!("writing {}", file.display()))?;
            println!("created {} ({w}x{h})", file.display());
        }
        Command::ExportPng {
            file,
            output,
            frame,
            pixel_size,
        } => {
            let doc = core_io::load_document(&file)?;
            if frame >= doc.frames.playback_total.max(doc.frames.frame_count()) {
                bail!(
                    "frame {frame} out of range (playback length {})",
                    doc.frames.playback_total
                );
            }
            core_io::export_png(&doc, frame, pixel_size, &output)?;
            println!("wrote {}", output.display());
        }
        Command::ExportGif {
            file,
            output,
            pixel_size,
        } => {
            let doc = core_io::load_document(&file)?;
            core_io::export_gif(&doc, pixel_size, &output)?;
            println!("wrote {}", output.display());
        }
        Command::ExportTiff { file, output } => {
            let doc = core_io::load_document(&file)?;
            core_io::save_tiff(&doc, &output)?;
            println!("wrote {}", output.display());
        }
        Command::Palette { image } => {
            let colors = core_io::extract_palette(&image)?;
            if colors.is_empty() {
                bail!("image has no opaque pixels");
            }
            for c in colors {
                println!("{c}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_export_png_flags() {
        let args = Args::parse_from([
            "pixel-portal",
            "export-png",
            "art.ppd",
            "-o",
            "out.png",
            "--frame",
            "3",
            "--pixel-size",
            "8",
        ]);
        match args.command {
            Command::ExportPng {
                frame, pixel_size, ..
            } => {
                assert_eq!(frame, 3);
                assert_eq!(pixel_size, 8);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
