//! Voiceweave CLI: weave a folder of spoken clips into one stereo soundscape.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use voiceweave_core::audio::io::{load_clips, write_wav};
use voiceweave_core::names::{next_output_path, DEFAULT_PREFIX};
use voiceweave_core::{plan_weave, render_weave, WeaveConfig};

// ─── CLI ─────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "voiceweave",
    about = "Weave spoken clips into two overlapping stereo streams",
    version,
)]
struct Cli {
    /// Target total duration in seconds (default: use every clip)
    #[arg(short = 't', long)]
    target_duration: Option<f64>,

    /// RNG seed for reproducible output
    #[arg(short, long)]
    seed: Option<u64>,

    /// Directory containing the input .wav clips
    #[arg(short, long, default_value = "spoken_affirmations")]
    input_dir: PathBuf,

    /// Directory the numbered output file is written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Output file name prefix
    #[arg(long, default_value = DEFAULT_PREFIX)]
    prefix: String,

    /// JSON weave configuration; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long, default_value_t = false)]
    print_config: bool,

    /// Print the stream plan as JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Show verbose output
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

// ─── Main ────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    if let Err(e) = run(cli) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

// ─── Helpers ─────────────────────────────────────────────────────

/// Effective configuration: defaults or `--config`, then command-line overrides.
fn build_config(cli: &Cli) -> Result<WeaveConfig> {
    let mut config = match &cli.config {
        Some(path) => WeaveConfig::from_json_file(path)?,
        None => WeaveConfig::default(),
    };
    if cli.target_duration.is_some() {
        config.target_duration_s = cli.target_duration;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    Ok(config)
}

/// All `.wav` files directly inside `dir`, sorted by path.
fn find_wav_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list input directory: {}", dir.display()))?
    {
        let path = entry?.path();
        let is_wav = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("wav"))
            .unwrap_or(false);
        if path.is_file() && is_wav {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn print_playback_hint(path: &Path) {
    println!();
    match std::env::consts::OS {
        "macos" => println!("Play with: afplay {}", path.display()),
        "linux" => {
            println!("Play with: aplay {}", path.display());
            println!("       or: paplay {}", path.display());
        }
        _ => {}
    }
}

// ─── Runner ──────────────────────────────────────────────────────

fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;

    if cli.print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let files = find_wav_files(&cli.input_dir)?;
    if files.is_empty() {
        bail!("No .wav files found in {}/", cli.input_dir.display());
    }
    println!("Found {} clips", files.len());

    let clips = load_clips(&files)?;
    let prepared = plan_weave(&clips, &config)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&prepared.plan)?);
    } else {
        for line in &prepared.diagnostics {
            println!("{}", line);
        }
    }

    let result = render_weave(prepared)?;
    println!();
    println!("Total duration: {:.1}s", result.duration_s());

    let output_path = next_output_path(&cli.output_dir, &cli.prefix)?;
    write_wav(&output_path, &result.audio)?;

    println!("Exported: {}", output_path.display());
    print_playback_hint(&output_path);
    Ok(())
}
