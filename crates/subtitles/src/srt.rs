//! SubRip generation.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use dashsub_alignment::timeline::AnnotationRecord;
use dashsub_common::error::{DashsubError, DashsubResult};

/// Display options for the annotation line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtitleStyle {
    /// Wrap GPS lines in `<font color="...">`.
    pub highlight_color: Option<String>,
}

/// Render records as SRT text.
///
/// Each record becomes a sequence number, a time range, a display line and
/// a blank line. Lines are joined with `\n`, so the text ends right after
/// the last display line's newline.
pub fn generate_srt(records: &[AnnotationRecord], style: &SubtitleStyle) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(records.len() * 4);

    for (i, record) in records.iter().enumerate() {
        lines.push((i + 1).to_string());
        lines.push(format!(
            "{} --> {}",
            format_srt_time(record.start_secs),
            format_srt_time(record.end_secs),
        ));
        lines.push(display_line(record, style));
        lines.push(String::new());
    }

    lines.join("\n")
}

/// The human-readable text shown during one frame.
pub fn display_line(record: &AnnotationRecord, style: &SubtitleStyle) -> String {
    match &record.geo {
        Some(geo) => {
            let text = format!(
                "{}   {:.1}km/h   Lat: {:.6} Lon: {:.6}",
                geo.local_time, record.speed_kmh, geo.latitude, geo.longitude
            );
            match &style.highlight_color {
                Some(color) => format!("<font color=\"{color}\">{text}</font>"),
                None => text,
            }
        }
        None => format!("vEgo: {:.1} km/h", record.speed_kmh),
    }
}

/// Format seconds as SRT timestamp: HH:MM:SS,mmm
///
/// The value is first rounded to whole microseconds, then milliseconds are
/// truncated. Hours are not wrapped at 24.
pub fn format_srt_time(secs: f64) -> String {
    let total_us = (secs.max(0.0) * 1_000_000.0).round() as u64;
    let total_secs = total_us / 1_000_000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let millis = (total_us % 1_000_000) / 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Write SRT text to `path`.
///
/// The text goes to a sibling temporary file that is renamed into place,
/// so a failed run never leaves a partial track behind.
pub fn write_srt(path: &Path, content: &str) -> DashsubResult<()> {
    let tmp = temp_path(path);
    debug!("Writing {} bytes to {}", content.len(), tmp.display());

    let result = fs::File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(content.as_bytes())?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&tmp, path));

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(DashsubError::write(path, e));
    }

    info!("Subtitle written: {}", path.display());
    Ok(())
}

/// Render and save records in one call.
pub fn save_subtitles(
    records: &[AnnotationRecord],
    style: &SubtitleStyle,
    path: &Path,
) -> DashsubResult<()> {
    write_srt(path, &generate_srt(records, style))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "subtitles.srt".into());
    name.push(".tmp");
    path.with_file_name(name)
}
