//! Extract → probe → synthesize → serialize.

use std::path::{Path, PathBuf};

use tracing::info;

use dashsub_alignment::series::extract;
use dashsub_alignment::timeline::{synthesize, FrameGrid};
use dashsub_common::clock::DisplayOffset;
use dashsub_common::config::AppConfig;
use dashsub_common::error::{DashsubError, DashsubResult, Stage, StageContext, StageError};
use dashsub_log_model::reader::LogReader;
use dashsub_media_probe::probe::{MediaInfo, MediaProber};
use dashsub_subtitles::srt::{save_subtitles, SubtitleStyle};

/// Inputs of one run.
#[derive(Debug, Clone)]
pub struct Request {
    pub log_path: PathBuf,
    pub video_path: PathBuf,
    pub output_path: PathBuf,
    /// `(fps, duration_secs)` supplied by the user instead of probing.
    pub media_override: Option<(f64, f64)>,
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct Summary {
    pub records: usize,
    pub media: MediaInfo,
    pub recording_start: Option<String>,
}

impl Summary {
    pub fn print(&self, request: &Request) {
        println!("[OK] Subtitle written: {}", request.output_path.display());
        println!(
            "  Frames: {} ({:.3} fps, {:.3}s)",
            self.records, self.media.fps, self.media.duration_secs
        );
        if let Some(start) = &self.recording_start {
            println!("  Recording start: {start}");
        }
        println!();
        println!("Burn the subtitles into the video with:");
        println!(
            "  ffmpeg -i {} -vf subtitles={} -c:a copy out.mp4",
            request.video_path.display(),
            request.output_path.display()
        );
    }
}

/// Run the whole pipeline. Nothing is written unless every stage succeeds.
pub fn run(request: &Request, config: &AppConfig) -> Result<Summary, StageError> {
    let offset = DisplayOffset::from_minutes(config.overlay.utc_offset_minutes)
        .stage(Stage::Synthesize)?;

    let streams = read_log(&request.log_path).stage(Stage::Extract)?;
    let first_mono = streams.first_speed_time().stage(Stage::Extract)?;

    let recording_start = streams
        .geo
        .first_wall_time()
        .and_then(|ms| offset.format(ms));
    if let Some(start) = &recording_start {
        info!("Recording started at {start}");
    }

    let media = probe_media(request, config).stage(Stage::Probe)?;

    let grid = FrameGrid::new(media.fps, media.duration_secs, first_mono)
        .stage(Stage::Synthesize)?;
    let records =
        synthesize(&streams.speed, &streams.geo, &grid, &offset).stage(Stage::Synthesize)?;

    let style = SubtitleStyle {
        highlight_color: config.overlay.highlight_color.clone(),
    };
    save_subtitles(&records, &style, &request.output_path).stage(Stage::Serialize)?;

    Ok(Summary {
        records: records.len(),
        media,
        recording_start,
    })
}

fn read_log(path: &Path) -> DashsubResult<dashsub_alignment::series::ExtractedStreams> {
    info!("Reading log {}", path.display());
    let reader = LogReader::open(path)?;
    extract(reader)
}

fn probe_media(request: &Request, config: &AppConfig) -> DashsubResult<MediaInfo> {
    match request.media_override {
        Some((fps, duration)) => {
            info!("Using frame grid from command line: {fps} fps, {duration}s");
            MediaInfo::new(fps, duration)
        }
        None => MediaProber::from_config(config.probe.clone()).probe(&request.video_path),
    }
}
