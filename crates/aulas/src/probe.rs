use std::{
    future::Future,
    path::{Path, PathBuf},
    process::Stdio,
};

use tokio::process::Command;

/// Reads the playable duration of a media file.
pub trait DurationProbe {
    /// Duration of `path` in seconds, `None` when it can not be determined.
    fn probe(&self, path: &Path) -> impl Future<Output = Option<f64>> + Send;
}

/// Asks `ffprobe` for the container duration.
#[derive(Debug, Clone, Default)]
pub struct FfprobeDurationProbe {
    ffprobe: Option<PathBuf>,
}

impl FfprobeDurationProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary<P: Into<PathBuf>>(mut self, ffprobe: P) -> Self {
        self.ffprobe = Some(ffprobe.into());
        self
    }
}

impl DurationProbe for FfprobeDurationProbe {
    async fn probe(&self, path: &Path) -> Option<f64> {
        let ffprobe = match &self.ffprobe {
            Some(ffprobe) => ffprobe.clone(),
            None => match which::which("ffprobe") {
                Ok(ffprobe) => ffprobe,
                Err(e) => {
                    tracing::error!("ffprobe not found: {e}");
                    return None;
                }
            },
        };

        let output = Command::new(ffprobe)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await;
        let output = match output {
            Ok(output) if output.status.success() => output,
            Ok(output) => {
                tracing::warn!(
                    "ffprobe failed on {}: {}",
                    path.display(),
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                return None;
            }
            Err(e) => {
                tracing::warn!("Failed to run ffprobe: {e}");
                return None;
            }
        };

        parse_duration(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parses the first line of ffprobe output, which is `N/A` for unknown durations.
pub fn parse_duration(output: &str) -> Option<f64> {
    output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.parse::<f64>().ok())
        .filter(|duration| duration.is_finite())
}
