//! Command line front-end for offline grasp analysis

use std::fs::File;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use emg_grasp::force::ForceTrace;
use emg_grasp::{ColumnIndex, ConfigLoader, EmgPipeline, PipelineConfig, Recording, SmoothingMethod};
use serde_json::json;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "emg-analyze", version, about = "Offline EMG grasp analysis")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect grasps in a JSON recording and print a summary.
    Grasp(GraspArgs),
    /// Evaluate force tracking from a CSV export.
    Force(ForceArgs),
    /// Write the effective configuration as TOML.
    ExportConfig(ExportArgs),
}

#[derive(Args, Debug, Clone)]
struct ConfigArgs {
    /// Extra TOML file merged over the default locations.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GraspArgs {
    /// Recording bundle (JSON).
    recording: PathBuf,
    #[command(flatten)]
    config: ConfigArgs,
    /// Analyse a single channel instead of all of them.
    #[arg(long)]
    channel: Option<usize>,
    /// Myocontrol column to compare against.
    #[arg(long)]
    control_column: Option<String>,
    /// Write the feature table of the analysed channel as CSV.
    #[arg(long, requires = "channel")]
    features_csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ForceArgs {
    /// Force export (CSV).
    trace: PathBuf,
    /// Smoothing applied to the force and angle columns before scoring.
    #[arg(long, default_value = "none", value_parser = ["none", "sg", "mav", "rms"])]
    smoothing: String,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    config: ConfigArgs,
    /// Destination TOML file.
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "emg_grasp=info,emg_analyze=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Grasp(args) => grasp_command(args),
        Command::Force(args) => force_command(args),
        Command::ExportConfig(args) => export_command(args),
    }
}

fn load_config(args: &ConfigArgs) -> Result<PipelineConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        if !path.exists() {
            bail!("config file {} does not exist", path.display());
        }
        let mut paths = loader.config_paths().to_vec();
        paths.push(path.clone());
        loader = ConfigLoader::with_paths(paths);
    }
    loader.load().context("loading configuration")
}

fn grasp_command(args: GraspArgs) -> Result<()> {
    let mut config = load_config(&args.config)?;

    let recording = Recording::from_path(&args.recording)
        .with_context(|| format!("reading {}", args.recording.display()))?;

    if recording.signal.fs() != config.sampling_rate_hz {
        warn!(
            configured = config.sampling_rate_hz,
            recorded = recording.signal.fs(),
            "using the recording's sampling rate"
        );
        config.sampling_rate_hz = recording.signal.fs();
    }

    if let Some(column) = &args.control_column {
        let ColumnIndex(index) = column.parse::<ColumnIndex>()?;
        config.grasp.control_column = Some(index);
    }
    if config.grasp.control_column.is_some() && recording.control.is_none() {
        warn!("control column requested but the recording has no myocontrol data");
    }

    let pipeline = EmgPipeline::new(config)?;
    let control = recording.control.as_ref().map(|m| m.view());

    let summaries = match args.channel {
        Some(channel) => {
            let analysis = pipeline.analyze_recording_channel(&recording.signal, channel, control)?;

            if let Some(path) = &args.features_csv {
                let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
                analysis.features.write_csv(file)?;
                info!(path = %path.display(), rows = analysis.features.n_rows(), "feature table written");
            }

            vec![analysis.summary(channel, pipeline.feature_rate())]
        }
        None => pipeline
            .process_all(&recording.signal, control)?
            .iter()
            .enumerate()
            .map(|(channel, analysis)| analysis.summary(channel, pipeline.feature_rate()))
            .collect(),
    };

    let report = json!({
        "analyzer": analyzer_id(),
        "recording": args.recording.display().to_string(),
        "sampling_rate_hz": recording.signal.fs(),
        "channels": summaries,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn force_command(args: ForceArgs) -> Result<()> {
    let file = File::open(&args.trace).with_context(|| format!("opening {}", args.trace.display()))?;
    let raw = ForceTrace::from_csv_reader(file)?;
    info!(samples = raw.len(), angles = raw.has_angles(), "force trace loaded");

    let smoothing = SmoothingMethod::from_name(&args.smoothing);
    let trace = raw.smoothed(&smoothing)?;

    let report = json!({
        "analyzer": analyzer_id(),
        "samples": trace.len(),
        "smoothing": smoothing.name(),
        "angle_excursion": trace.angle_excursion(),
        "flexion": trace.flexion_error()?,
        "extension": trace.extension_error()?,
        "zones": trace.zones()?,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn analyzer_id() -> String {
    format!("{} {}", emg_grasp::NAME, emg_grasp::VERSION)
}

fn export_command(args: ExportArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    ConfigLoader::export_config(&config, &args.output)?;
    info!(path = %args.output.display(), "configuration exported");
    Ok(())
}
