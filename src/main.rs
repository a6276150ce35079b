use clap::{Parser, Subcommand};
use imgcache::{FsStore, Mode, ResizeConfig, Resizer};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "imgcache")]
#[command(about = "Deterministic, content-addressed image resize cache")]
#[command(long_about = "\
Deterministic, content-addressed image resize cache

Renditions are cached under assets/images/ inside the store root, keyed by
source path, source mtime, target dimensions and resize mode. Repeating a
request returns the cached artifact without touching any pixels; changing
any input lands on a new cache path automatically.

Modes:

  proportional   fit inside the given bounding dimensions (default when
                 only one dimension is given)
  box            fit the most constraining axis
  {left,center,right}_{top,center,bottom}
                 scale to cover, then crop anchored at that position
                 (center_top is the default when both dimensions are given)
  crop           legacy alias for center_center

SVG sources are resized by rewriting the document, never rasterized.")]
#[command(version)]
struct Cli {
    /// Store root; all image paths are relative to it
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Configuration file (missing file means stock defaults)
    #[arg(long, default_value = "imgcache.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a rendition and print its store path
    Get {
        /// Source image, relative to the store root
        image: String,
        /// Target width (0 = derive from height)
        width: u32,
        /// Target height (0 = derive from width)
        height: u32,
        /// Resize mode
        #[arg(long, value_parser = parse_mode)]
        mode: Option<Mode>,
        /// Copy the result to this path as well
        #[arg(long)]
        target: Option<String>,
        /// Regenerate even when a fresh artifact exists
        #[arg(long)]
        force: bool,
    },
    /// Resize an image in place, overwriting the original
    Resize {
        image: String,
        width: u32,
        height: u32,
        #[arg(long, value_parser = parse_mode)]
        mode: Option<Mode>,
    },
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    Mode::from_str(s).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let config = match ResizeConfig::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}: {err}", cli.config.display());
            return ExitCode::FAILURE;
        }
    };
    let resizer = Resizer::new(config, FsStore::new(cli.root));

    match cli.command {
        Command::Get {
            image,
            width,
            height,
            mode,
            target,
            force,
        } => {
            let result = match target {
                Some(target) => resizer.get_to(&image, width, height, mode, &target, force),
                None => resizer.get(&image, width, height, mode),
            };
            match result {
                Some(path) => {
                    println!("{path}");
                    ExitCode::SUCCESS
                }
                None => ExitCode::FAILURE,
            }
        }
        Command::Resize {
            image,
            width,
            height,
            mode,
        } => {
            if resizer.resize(&image, width, height, mode) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
