use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
};

use tokio::process::Command;

use crate::{
    error::{AulasError, AulasResult},
    merge::Remuxer,
};

/// Remuxes with the ffmpeg CLI: `-c copy` and `aac_adtstoasc` so that ADTS
/// audio from MPEG-TS segments fits into MP4 containers.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRemuxer {
    ffmpeg: Option<PathBuf>,
}

impl FfmpegRemuxer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this binary instead of looking up `ffmpeg` in `PATH`.
    pub fn with_binary<P: Into<PathBuf>>(mut self, ffmpeg: P) -> Self {
        self.ffmpeg = Some(ffmpeg.into());
        self
    }

    fn args(playlist: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "error", "-y", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(playlist.into());
        args.extend(
            ["-c", "copy", "-bsf:a", "aac_adtstoasc"]
                .into_iter()
                .map(OsString::from),
        );
        args.push(output.into());
        args
    }
}

impl Remuxer for FfmpegRemuxer {
    async fn remux(&self, playlist: &Path, output: &Path) -> AulasResult<()> {
        let ffmpeg = match &self.ffmpeg {
            Some(ffmpeg) => ffmpeg.clone(),
            None => which::which("ffmpeg")?,
        };

        let result = Command::new(ffmpeg)
            .args(Self::args(playlist, output))
            .stdin(Stdio::null())
            .output()
            .await?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(AulasError::RemuxError(format!(
                "ffmpeg exited with {}: {}",
                result.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}
