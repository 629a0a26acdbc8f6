//! dashsub CLI — Render drive log telemetry as a subtitle track.
//!
//! Usage:
//!   dashsub [OPTIONS] <LOG> <VIDEO> <OUTPUT>
//!
//! Reads vehicle speed and GPS fixes from a JSONL drive log, aligns them to
//! the video's frame grid and writes one SRT block per frame.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

mod pipeline;

#[derive(Parser)]
#[command(
    name = "dashsub",
    about = "Burn-in ready speed and GPS subtitles from drive logs",
    version,
    author
)]
struct Cli {
    /// Drive log (JSONL, one event per line)
    log: PathBuf,

    /// Video recorded alongside the log
    video: PathBuf,

    /// Output subtitle file (.srt)
    output: PathBuf,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Display offset from UTC for GPS wall time, in minutes
    #[arg(long, allow_hyphen_values = true)]
    utc_offset_minutes: Option<i32>,

    /// Wrap GPS lines in <font color="..."> markup
    #[arg(long)]
    highlight: Option<String>,

    /// Kill ffprobe after this many seconds
    #[arg(long)]
    probe_timeout: Option<u64>,

    /// Frame rate override (requires --duration; skips probing)
    #[arg(long, requires = "duration")]
    fps: Option<f64>,

    /// Duration override in seconds (requires --fps; skips probing)
    #[arg(long, requires = "fps")]
    duration: Option<f64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match dashsub_common::config::AppConfig::load_or_default(cli.config.as_ref())
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error [config]: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Command-line flags take precedence over the config file.
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    if let Some(minutes) = cli.utc_offset_minutes {
        config.overlay.utc_offset_minutes = minutes;
    }
    if let Some(color) = cli.highlight {
        config.overlay.highlight_color = Some(color);
    }
    if let Some(secs) = cli.probe_timeout {
        config.probe.timeout_secs = Some(secs);
    }

    dashsub_common::logging::init_logging(&config.logging);

    let request = pipeline::Request {
        log_path: cli.log,
        video_path: cli.video,
        output_path: cli.output,
        media_override: cli.fps.zip(cli.duration),
    };

    match pipeline::run(&request, &config) {
        Ok(summary) => {
            summary.print(&request);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            let code = u8::try_from(e.exit_code()).unwrap_or(1);
            ExitCode::from(code)
        }
    }
}
