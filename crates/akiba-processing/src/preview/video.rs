//! Video thumbnail pipeline.
//!
//! Probes the clip duration with `ffprobe`, grabs a single frame with
//! `ffmpeg` — never more than 10% into the clip, which avoids black intro
//! frames while still respecting short clips — and runs the frame through
//! the image thumbnail pipeline. Both tools are optional; when either is
//! missing the pipeline skips with a warning.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{anyhow, Context, Result};
use tokio::process::Command;

use akiba_storage::DocumentVault;

use super::image::ImagePipeline;

#[derive(Clone)]
pub struct VideoThumbnailer {
    vault: DocumentVault,
    ffmpeg_path: String,
    ffprobe_path: String,
    frame_offset_secs: f64,
    image: ImagePipeline,
    available: bool,
}

impl VideoThumbnailer {
    /// Probe both `ffmpeg` and `ffprobe`; the pipeline is available only
    /// when both can be executed.
    pub async fn detect(
        vault: DocumentVault,
        ffmpeg_path: &str,
        ffprobe_path: &str,
        frame_offset_secs: f64,
        image: ImagePipeline,
    ) -> Self {
        let probe = |path: String| async move {
            Command::new(&path)
                .arg("-version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await
                .is_ok()
        };

        let available =
            probe(ffmpeg_path.to_string()).await && probe(ffprobe_path.to_string()).await;

        if !available {
            tracing::warn!(
                ffmpeg = %ffmpeg_path,
                ffprobe = %ffprobe_path,
                "ffmpeg/ffprobe not available, video thumbnails will be skipped"
            );
        }

        Self {
            vault,
            ffmpeg_path: ffmpeg_path.to_string(),
            ffprobe_path: ffprobe_path.to_string(),
            frame_offset_secs,
            image,
            available,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Thumbnail for a video file, saved as `thumbnails/thumb_{stem}.jpg`.
    ///
    /// Returns `None` when the tools are unavailable or extraction fails.
    pub async fn generate_thumbnail(&self, source: &Path) -> Option<PathBuf> {
        if !self.available {
            tracing::warn!(
                path = %source.display(),
                "Skipping video thumbnail, decoder unavailable"
            );
            return None;
        }

        match self.try_generate(source).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(
                    path = %source.display(),
                    error = %e,
                    "Failed to generate video thumbnail"
                );
                None
            }
        }
    }

    /// Clip duration in seconds, via ffprobe's JSON output.
    async fn probe_duration(&self, source: &Path) -> Result<f64> {
        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(source)
            .output()
            .await
            .context("Failed to execute ffprobe")?;

        if !output.status.success() {
            return Err(anyhow!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ));
        }

        let probe_data: serde_json::Value =
            serde_json::from_slice(&output.stdout).context("Failed to parse ffprobe output")?;

        probe_data["format"]["duration"]
            .as_str()
            .and_then(|d| d.parse::<f64>().ok())
            .ok_or_else(|| anyhow!("Could not parse duration"))
    }

    async fn try_generate(&self, source: &Path) -> Result<PathBuf> {
        let filename = source
            .file_name()
            .and_then(|n| n.to_str())
            .context("Source has no filename")?;
        let stem = filename.rsplit_once('.').map(|(s, _)| s).unwrap_or(filename);

        let duration = self.probe_duration(source).await?;
        let capture_time = self.frame_offset_secs.min(duration * 0.1).max(0.0);

        // Frame named after the stem so the derived thumbnail becomes
        // thumb_{stem}.jpg.
        let frame_path = self.vault.temp_path_for(&format!("{stem}.jpg"));

        let output = Command::new(&self.ffmpeg_path)
            .arg("-y")
            .args(["-ss", &format!("{capture_time:.3}")])
            .arg("-i")
            .arg(source)
            .args(["-frames:v", "1", "-q:v", "2"])
            .arg(&frame_path)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .context("Failed to execute ffmpeg")?;

        if !output.status.success() {
            let _ = tokio::fs::remove_file(&frame_path).await;
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("ffmpeg failed: {}", stderr.trim()));
        }

        let thumbnail = self.image.generate_thumbnail(&frame_path).await;

        // The extracted frame is scratch either way.
        let _ = tokio::fs::remove_file(&frame_path).await;

        let thumbnail = thumbnail.ok_or_else(|| anyhow!("Thumbnail pipeline failed on frame"))?;

        tracing::info!(
            source = %source.display(),
            thumbnail = %thumbnail.display(),
            capture_time,
            "Generated video thumbnail"
        );
        Ok(thumbnail)
    }
}
