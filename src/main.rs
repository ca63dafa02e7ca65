//! VisionLab - on-device vision analysis session
//!
//! Runs text recognition, face detection and image labeling against an
//! image through pluggable vision providers, and prints the session state
//! the way a display layer would render it.

mod app;
mod capture;
mod config;
mod overlay;
mod shared;
mod vision;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::app::AnalysisSession;
use crate::capture::load_frame;
use crate::config::AppConfig;
use crate::overlay::{wrap_index, FitTransform};
use crate::shared::{SessionCommand, UiState, CAPTURED_IMAGE_INDEX};
use crate::vision::{scripted_adapter, Capability, ProviderScript, ScriptedProvider};

/// VisionLab - text, face and label analysis of a single image
#[derive(Parser, Debug)]
#[command(name = "vision-lab")]
#[command(about = "Run on-device vision analyses against an image")]
struct Args {
    /// Sample images, in carousel order
    #[arg(short, long = "image")]
    images: Vec<PathBuf>,

    /// Ad-hoc image to analyze instead of a sample
    #[arg(long)]
    camera: Option<PathBuf>,

    /// Move through the samples by this many steps (negative = backwards)
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    advance: i64,

    /// Provider script (JSON) standing in for the vision engines
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Analyses to run, in order
    #[arg(short, long = "task", value_enum)]
    tasks: Vec<Task>,

    /// Display area as WIDTHxHEIGHT, to report overlay geometry
    #[arg(long, value_parser = parse_canvas)]
    canvas: Option<(f32, f32)>,

    /// Print snapshots as JSON
    #[arg(long)]
    json: bool,

    /// Configuration file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    write_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Task {
    Text,
    Face,
    Label,
}

impl From<Task> for Capability {
    fn from(task: Task) -> Self {
        match task {
            Task::Text => Capability::TextRecognition,
            Task::Face => Capability::FaceDetection,
            Task::Label => Capability::ImageLabeling,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => config::config_path()?,
    };
    let (config, loaded) = load_or_default_config(&config_path);

    init_logging(&config, args.verbose)?;
    match loaded {
        Ok(true) => info!("Loaded configuration from {:?}", config_path),
        Ok(false) => info!("Using default configuration"),
        Err(e) => warn!("Ignoring unreadable configuration {:?}: {:#}", config_path, e),
    }

    if args.write_config {
        config::save_config(&config, &config_path)?;
        println!("Wrote configuration to {}", config_path.display());
        return Ok(());
    }

    let script = match &args.script {
        Some(path) => ProviderScript::load(path)?,
        None => ProviderScript::default(),
    };
    let provider = ScriptedProvider::new(script)
        .with_settings(config.face_detection.clone(), config.labeling.clone());
    let session = AnalysisSession::new(scripted_adapter(provider).with_settings(&config.vision));

    select_initial_image(&session, &args)?;

    if args.tasks.is_empty() {
        print_snapshot(&session.snapshot(), &args)?;
    }

    for task in &args.tasks {
        let Some(running) = session.dispatch(SessionCommand::Analyze((*task).into())) else {
            warn!("No image selected, skipping {:?}", task);
            continue;
        };
        running.join().await?;
        print_snapshot(&session.snapshot(), &args)?;
    }

    session.shutdown();
    Ok(())
}

/// Load configuration, falling back to defaults
///
/// The second value reports whether a file was read, or why it could not be.
fn load_or_default_config(path: &Path) -> (AppConfig, Result<bool>) {
    if !path.exists() {
        return (AppConfig::default(), Ok(false));
    }
    match config::load_config(path) {
        Ok(config) => (config, Ok(true)),
        Err(e) => (AppConfig::default(), Err(e)),
    }
}

fn init_logging(config: &AppConfig, verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { config.logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Feed the session its first image, acting as the display layer
fn select_initial_image(session: &AnalysisSession, args: &Args) -> Result<()> {
    if let Some(camera) = &args.camera {
        session.select_image(load_frame(camera)?, CAPTURED_IMAGE_INDEX);
        return Ok(());
    }
    if args.images.is_empty() {
        bail!("No image given: pass --image or --camera");
    }

    session.request_step(args.advance);

    let requested = session.snapshot().image_index;
    let Some(index) = wrap_index(requested, args.images.len()) else {
        bail!("No sample images");
    };
    info!("Index {} wraps to sample {} of {}", requested, index, args.images.len());

    let frame = load_frame(&args.images[index])?;
    session.dispatch(SessionCommand::SelectImage {
        frame,
        index: index as i64,
    });
    Ok(())
}

fn print_snapshot(state: &UiState, args: &Args) -> Result<()> {
    let fit = match (args.canvas, &state.current_image) {
        (Some(canvas), Some(image)) => FitTransform::fit(image.dimensions(), canvas),
        _ => None,
    };

    if args.json {
        let overlay = fit.map(|fit| {
            json!({
                "transform": fit,
                "boxes": state.bounding_boxes.iter().map(|r| fit.map_rect(r)).collect::<Vec<_>>(),
                "contours": state
                    .face_results
                    .iter()
                    .flat_map(|face| face.contours.iter())
                    .filter_map(|contour| fit.contour_path(contour))
                    .collect::<Vec<_>>(),
            })
        });
        let snapshot = json!({
            "image_index": state.image_index,
            "image_size": state.current_image.as_ref().map(|image| image.dimensions()),
            "text_output": state.text_output,
            "bounding_boxes": state.bounding_boxes,
            "face_results": state.face_results,
            "overlay": overlay,
        });
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("{}", state.text_output);
    for rect in &state.bounding_boxes {
        match &fit {
            Some(fit) => {
                let mapped = fit.map_rect(rect);
                println!(
                    "  box ({}, {}, {}, {}) -> display ({:.1}, {:.1}) {:.1}x{:.1}",
                    rect.left, rect.top, rect.right, rect.bottom,
                    mapped.x, mapped.y, mapped.width, mapped.height
                );
            }
            None => println!(
                "  box ({}, {}, {}, {})",
                rect.left, rect.top, rect.right, rect.bottom
            ),
        }
    }
    if let Some(fit) = &fit {
        let paths = state
            .face_results
            .iter()
            .flat_map(|face| face.contours.iter())
            .filter_map(|contour| fit.contour_path(contour))
            .count();
        if paths > 0 {
            println!("  {} contour path(s) at scale {:.3}", paths, fit.scale);
        }
    }
    Ok(())
}

fn parse_canvas(value: &str) -> Result<(f32, f32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let width: f32 = width.trim().parse().map_err(|_| format!("invalid width '{}'", width))?;
    let height: f32 = height.trim().parse().map_err(|_| format!("invalid height '{}'", height))?;
    if width <= 0.0 || height <= 0.0 {
        return Err("canvas dimensions must be positive".to_string());
    }
    Ok((width, height))
}
