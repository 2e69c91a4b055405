use std::path::{Path, PathBuf};

use rand::Rng;

use crate::error::AulasResult;

/// Default root of all staging directories, relative to the working directory.
pub const DEFAULT_STAGING_ROOT: &str = ".temp";

const STAGING_ID_LEN: usize = 5;

/// Per-attempt working directory `<root>/<5 random letters>/` holding the
/// downloaded segments and the rewritten local playlist.
///
/// A staging area belongs to exactly one download attempt. [StagingArea::clear]
/// consumes it, and dropping it without clearing removes the directory as well.
#[derive(Debug)]
pub struct StagingArea {
    dir: PathBuf,
    cleared: bool,
}

impl StagingArea {
    pub const PLAYLIST_NAME: &'static str = "playlist.m3u8";

    pub async fn create<P: AsRef<Path>>(root: P) -> AulasResult<Self> {
        Self::create_with(root.as_ref(), random_id).await
    }

    async fn create_with<F>(root: &Path, mut next_id: F) -> AulasResult<Self>
    where
        F: FnMut() -> String,
    {
        tokio::fs::create_dir_all(root).await?;
        let dir = loop {
            let dir = root.join(next_id());
            // create_dir fails on an existing leaf, so two attempts never share one
            match tokio::fs::create_dir(&dir).await {
                Ok(()) => break dir,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        };
        tracing::debug!("Staging directory {} created.", dir.display());

        Ok(Self {
            dir,
            cleared: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn playlist_path(&self) -> PathBuf {
        self.dir.join(Self::PLAYLIST_NAME)
    }

    pub fn segment_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Removes every staged file and the directory itself. The staging root is
    /// removed too once no other staging directory is left in it.
    pub async fn clear(mut self) -> AulasResult<()> {
        self.cleared = true;
        if self.dir.exists() {
            tokio::fs::remove_dir_all(&self.dir).await?;
        }
        if let Some(root) = self.dir.parent() {
            _ = tokio::fs::remove_dir(root).await;
        }
        Ok(())
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if self.cleared || !self.dir.exists() {
            return;
        }

        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            tracing::error!(
                "Failed to remove staging directory {}: {e}",
                self.dir.display()
            );
        }
        if let Some(root) = self.dir.parent() {
            _ = std::fs::remove_dir(root);
        }
    }
}

fn random_id() -> String {
    let mut rng = rand::thread_rng();
    (0..STAGING_ID_LEN)
        .map(|_| rng.gen_range(b'A'..=b'Z') as char)
        .collect()
}
