pub mod error;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use framegrab_core::config::{OutputFormat, ThumbnailConfig};
use framegrab_core::media::MediaSource;
use framegrab_core::request::ThumbnailRequest;
use framegrab_media::binder::EngineBinder;
use framegrab_media::engine::EngineProvider;
use framegrab_media::thumbnail::{Thumbnail, ThumbnailGenerator};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

use crate::error::{CliError, Result};

/// Grab still frames from video files through libvlc.
#[derive(Parser, Debug)]
#[command(name = "framegrab", author, version, about, long_about = None)]
pub struct Cli {
    /// Log pipeline steps at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON config file; unspecified fields keep their defaults.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Capture one thumbnail per position.
    Grab(GrabArgs),
    /// Print the media's duration as JSON.
    Probe {
        /// File path or URL.
        media: String,
    },
    /// Print which engine library binds and its capabilities.
    Engine,
}

#[derive(Args, Debug)]
pub struct GrabArgs {
    /// File path or URL.
    pub media: String,

    /// Output width; 0 or less uses the configured default.
    #[arg(short = 'W', long, default_value_t = 0, allow_negative_numbers = true)]
    pub width: i64,

    /// Output height; 0 or less uses the configured default.
    #[arg(short = 'H', long, default_value_t = 0, allow_negative_numbers = true)]
    pub height: i64,

    /// Normalized position in the timeline. Repeat for several thumbnails.
    #[arg(short, long = "position", default_values_t = [0.4])]
    pub positions: Vec<f64>,

    /// Output file. Batches get a numeric suffix per position.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// JPEG quality, 1-100.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Print per-request seek and stage timings as JSON.
    #[arg(long)]
    pub report: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Jpeg,
    Png,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Jpeg => OutputFormat::Jpeg,
            FormatArg::Png => OutputFormat::Png,
        }
    }
}

#[derive(Serialize)]
struct GrabReport<'a> {
    output: &'a Path,
    #[serde(flatten)]
    thumbnail: &'a Thumbnail,
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .init();
}

/// Config file (or defaults), then environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<ThumbnailConfig> {
    let config = match path {
        Some(path) => ThumbnailConfig::from_json_file(path)?,
        None => ThumbnailConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}

/// Fold command-line encoder flags into `config`.
pub fn apply_grab_overrides(mut config: ThumbnailConfig, args: &GrabArgs) -> ThumbnailConfig {
    if let Some(format) = args.format {
        config.format = format.into();
    }
    if let Some(quality) = args.quality {
        config.quality = quality;
    }
    config
}

/// Where each of `count` thumbnails of `media` is written.
///
/// Without `-o` the media's file stem is used in the working directory. A
/// batch numbers its files from 1 in request order.
pub fn output_paths(
    media: &str,
    output: Option<&Path>,
    count: usize,
    format: OutputFormat,
) -> Vec<PathBuf> {
    let ext = format.extension();
    let (dir, stem) = match output {
        Some(path) => {
            if count == 1 {
                return vec![path.to_path_buf()];
            }
            (
                path.parent().map(Path::to_path_buf).unwrap_or_default(),
                stem_of(path),
            )
        }
        None => (PathBuf::new(), stem_of(Path::new(media))),
    };

    if count == 1 {
        return vec![dir.join(format!("{stem}.{ext}"))];
    }
    (1..=count)
        .map(|n| dir.join(format!("{stem}-{n}.{ext}")))
        .collect()
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "thumbnail".to_string())
}

pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Grab(args) => grab(apply_grab_overrides(config, &args), &args),
        Command::Probe { media } => {
            let generator = ThumbnailGenerator::new(EngineBinder::libvlc(&config), config);
            let info = generator.probe(&MediaSource::parse(&media))?;
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(())
        }
        Command::Engine => {
            let engine = EngineBinder::libvlc(&config).engine()?;
            println!("{}", serde_json::to_string_pretty(&engine.info())?);
            Ok(())
        }
    }
}

fn grab(config: ThumbnailConfig, args: &GrabArgs) -> Result<()> {
    let source = MediaSource::parse(&args.media);
    let paths = output_paths(
        &args.media,
        args.output.as_deref(),
        args.positions.len(),
        config.format,
    );
    let requests: Vec<_> = args
        .positions
        .iter()
        .map(|&p| ThumbnailRequest::new(source.clone(), args.width, args.height, p))
        .collect();

    let generator = ThumbnailGenerator::new(EngineBinder::libvlc(&config), config);
    let results = match requests.as_slice() {
        [single] => vec![generator.run(single)],
        batch => generator.generate_batch(batch),
    };

    let total = results.len();
    let mut failed = 0;
    let mut reports = Vec::new();
    for (result, path) in results.iter().zip(&paths) {
        match result {
            Ok(thumb) => {
                std::fs::write(path, &thumb.data).map_err(|source| CliError::Write {
                    path: path.clone(),
                    source,
                })?;
                info!(output = %path.display(), bytes = thumb.data.len(), "wrote thumbnail");
                reports.push(GrabReport {
                    output: path,
                    thumbnail: thumb,
                });
            }
            Err(e) => {
                error!(output = %path.display(), kind = ?e.kind(), error = %e, "no thumbnail");
                failed += 1;
            }
        }
    }

    if args.report {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    match (failed, results.into_iter().next()) {
        (0, _) => Ok(()),
        (1, Some(Err(e))) if total == 1 => Err(e.into()),
        _ => Err(CliError::Partial { failed, total }),
    }
}
