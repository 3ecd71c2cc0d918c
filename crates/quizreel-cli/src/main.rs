mod reporter;

use std::{
    path::PathBuf,
    process::ExitCode,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use console::style;

use quizreel_core::{
    Assembler, AssemblyConfig, AudioConfig, EncodeSettings, FfmpegEncoder, FontStrategy,
    GoogleTts, RevealMode, RunOptions, TextFrameRenderer, TimelineConfig, TtsProvider,
    VideoConfig, discover_inputs, format_duration, media::is_ffmpeg_on_path,
    tts::is_valid_language,
};

use crate::reporter::ConsoleReporter;

/// CLI wrapper for RevealMode (needed for clap ValueEnum)
#[derive(Clone, Copy, Default, ValueEnum)]
enum CliMode {
    #[default]
    Progressive,
    Single,
}

impl From<CliMode> for RevealMode {
    fn from(cli: CliMode) -> Self {
        match cli {
            CliMode::Progressive => RevealMode::Progressive,
            CliMode::Single => RevealMode::Single,
        }
    }
}

#[derive(Parser)]
#[command(name = "quizreel", version)]
#[command(about = "Turn quiz CSV rows into narrated videos")]
struct Cli {
    /// CSV file to process
    #[arg(long, conflicts_with = "all")]
    csv_file: Option<PathBuf>,

    /// Process every CSV file under --root. Scanning is already what happens
    /// without --csv-file, so this only makes the mode explicit.
    #[arg(long)]
    all: bool,

    /// Directory scanned for CSV files
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Where clips and final videos are written
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Narration language (e.g., "en", "fr", "zh-CN")
    #[arg(short, long, default_value = "en")]
    lang: String,

    /// Google Translate domain suffix, selects the regional accent
    #[arg(long, default_value = "com")]
    tld: String,

    /// Custom TTS endpoint; overrides QUIZREEL_TTS_URL
    #[arg(long)]
    tts_url: Option<String>,

    /// Per-request TTS timeout in seconds
    #[arg(long)]
    tts_timeout: Option<f64>,

    /// Records assembled in parallel
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// Font file to try before the system fonts (repeatable)
    #[arg(long)]
    font: Vec<PathBuf>,

    #[arg(long, value_enum, default_value_t = CliMode::Progressive)]
    mode: CliMode,

    #[arg(long, default_value_t = 1080)]
    width: u32,

    #[arg(long, default_value_t = 1920)]
    height: u32,

    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Directory for temporary files (defaults to the system temp dir)
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Print each clip's segment timeline
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// An explicit `--tts-url` wins; otherwise `QUIZREEL_TTS_URL`, then Google by `audio.tld`.
fn tts_provider(tts_url: Option<String>, audio: &AudioConfig) -> TtsProvider {
    match tts_url {
        Some(url) => TtsProvider::Custom { url },
        None => TtsProvider::from_env(&audio.tld),
    }
}

/// Returns whether at least one video was produced.
async fn run(cli: Cli) -> Result<bool> {
    if !is_valid_language(&cli.lang) {
        bail!("invalid language code \"{}\"", cli.lang);
    }

    // `--all` and `--csv-file` conflict, so scanning covers both `--all` and no flag.
    let inputs = match &cli.csv_file {
        Some(path) => {
            if !path.is_file() {
                bail!("CSV file not found: {}", path.display());
            }
            vec![path.clone()]
        }
        None => discover_inputs(&cli.root, Some(&cli.output_dir)),
    };
    if inputs.is_empty() {
        bail!("no CSV files found under {}", cli.root.display());
    }

    let font = FontStrategy::with_defaults(cli.font.clone()).resolve()?;
    if !is_ffmpeg_on_path().await {
        bail!("ffmpeg and ffprobe must be installed and on PATH");
    }

    let timeout = cli
        .tts_timeout
        .map(Duration::try_from_secs_f64)
        .transpose()
        .context("invalid --tts-timeout")?;

    let video = VideoConfig {
        width: cli.width,
        height: cli.height,
        fps: cli.fps,
        ..VideoConfig::default()
    };
    let audio = AudioConfig {
        language: cli.lang.clone(),
        tld: cli.tld.clone(),
        timeout,
        ..AudioConfig::default()
    };

    let provider = tts_provider(cli.tts_url, &audio);

    println!(
        "\n{}  {}\n",
        style("quizreel").cyan().bold(),
        style("Quiz Video Generator").dim()
    );
    println!(
        "{} {}  {} {}  {} {}\n",
        style("Font:").dim(),
        font.path.display(),
        style("Voice:").dim(),
        provider.name(),
        style("Inputs:").dim(),
        inputs.len()
    );

    let encoder = FfmpegEncoder::new(EncodeSettings::from_config(&video, &audio))?;
    let tts = GoogleTts::new(provider, audio.timeout)?;
    let renderer = TextFrameRenderer::new(video.clone(), font);
    let config = AssemblyConfig {
        video,
        audio,
        timeline: TimelineConfig::default(),
        mode: cli.mode.into(),
    };

    let mut assembler = Assembler::new(
        Arc::new(tts),
        Arc::new(renderer),
        Arc::new(encoder),
        config,
    );
    if let Some(dir) = cli.work_dir {
        assembler = assembler.with_work_dir(dir);
    }

    let opts = RunOptions {
        output_dir: cli.output_dir,
        jobs: cli.jobs.max(1),
    };
    let started = Instant::now();
    let summary = quizreel_core::run(
        Arc::new(assembler),
        &inputs,
        &opts,
        Arc::new(ConsoleReporter::new(cli.verbose)),
    )
    .await?;

    println!("\n{}", style("─".repeat(60)).dim());
    println!(
        "{} {} clips, {} failed, {} inputs skipped {}",
        style("Done:").bold(),
        summary.clip_count(),
        summary.failure_count(),
        summary.skipped.len(),
        style(format!("in {}", format_duration(started.elapsed()))).dim()
    );
    for path in summary.final_videos() {
        println!("{} {}", style("Saved:").dim(), style(path.display()).cyan());
    }

    if !summary.produced_any() {
        eprintln!("{} no video was produced", style("Error:").red().bold());
    }
    Ok(summary.produced_any())
}
