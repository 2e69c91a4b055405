mod ffmpeg;

pub use ffmpeg::FfmpegRemuxer;

use std::{future::Future, path::Path};

use crate::{
    error::{AulasError, AulasResult},
    hls::MediaPlaylist,
    staging::StagingArea,
};

/// Lossless container rewrite of a local playlist.
pub trait Remuxer {
    /// Stream-copies every segment listed in `playlist` into `output`,
    /// overwriting `output` if it exists.
    fn remux(&self, playlist: &Path, output: &Path)
        -> impl Future<Output = AulasResult<()>> + Send;
}

/// Turns a filled [StagingArea] into one output file.
pub struct RemuxAssembler<R> {
    remuxer: R,
}

impl<R> RemuxAssembler<R>
where
    R: Remuxer + Sync,
{
    pub fn new(remuxer: R) -> Self {
        Self { remuxer }
    }

    pub fn remuxer(&self) -> &R {
        &self.remuxer
    }

    /// Writes the local playlist, remuxes it into `output` and clears `staging`.
    ///
    /// Staging is cleared whether the remux succeeded or not.
    pub async fn assemble(
        &self,
        staging: StagingArea,
        playlist: &MediaPlaylist,
        output: &Path,
    ) -> AulasResult<()> {
        let result = self.remux_staged(&staging, playlist, output).await;

        let staging_dir = staging.path().to_path_buf();
        if let Err(e) = staging.clear().await {
            tracing::warn!(
                "Failed to clear staging directory {}: {e}",
                staging_dir.display()
            );
        }

        result
    }

    async fn remux_staged(
        &self,
        staging: &StagingArea,
        playlist: &MediaPlaylist,
        output: &Path,
    ) -> AulasResult<()> {
        let playlist_path = staging.playlist_path();
        tokio::fs::write(&playlist_path, playlist.local_manifest()?).await?;

        tracing::info!("Remuxing {} segments into {}.", playlist.len(), output.display());
        self.remuxer.remux(&playlist_path, output).await?;

        let size = tokio::fs::metadata(output)
            .await
            .map(|m| m.len())
            .unwrap_or_default();
        if size == 0 {
            return Err(AulasError::RemuxError(format!(
                "{} is missing or empty",
                output.display()
            )));
        }
        Ok(())
    }
}
