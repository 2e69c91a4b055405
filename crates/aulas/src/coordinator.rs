use std::{
    fmt,
    path::{Path, PathBuf},
};

use reqwest::header::HeaderMap;

use crate::{
    download::SegmentFetcherPool,
    error::AulasError,
    hls::{ManifestResolver, SelectionPolicy},
    merge::{FfmpegRemuxer, RemuxAssembler, Remuxer},
    probe::{DurationProbe, FfprobeDurationProbe},
    source::MediaSource,
    staging::{StagingArea, DEFAULT_STAGING_ROOT},
    util::{http::HttpClient, path::PathExt},
};

/// Outputs not longer than this many seconds are considered broken.
pub const MIN_VALID_DURATION: f64 = 10.0;

/// Variant path used on the secondary origin when its master playlist does
/// not declare any resolution.
pub const SECONDARY_FALLBACK_VARIANT: &str = "1080p/video.m3u8";

/// A host serving media identifiers, with the headers it expects.
#[derive(Debug, Clone)]
pub struct Origin {
    pub host: String,
    pub headers: HeaderMap,
    pub policy: SelectionPolicy,
    pub fallback_variant: Option<String>,
}

impl Origin {
    /// Streaming origin, the best variant is selected.
    pub fn primary<S: Into<String>>(host: S) -> Self {
        Self {
            host: host.into(),
            headers: HeaderMap::new(),
            policy: SelectionPolicy::Best,
            fallback_variant: None,
        }
    }

    /// CDN origin, the second best variant is selected.
    pub fn secondary<S: Into<String>>(host: S) -> Self {
        Self {
            host: host.into(),
            headers: HeaderMap::new(),
            policy: SelectionPolicy::SecondBest,
            fallback_variant: Some(SECONDARY_FALLBACK_VARIANT.to_string()),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_fallback_variant(mut self, fallback_variant: Option<String>) -> Self {
        self.fallback_variant = fallback_variant;
        self
    }

    pub fn source<S: Into<String>>(&self, identifier: S) -> MediaSource {
        MediaSource::new(identifier, self.host.clone()).with_headers(self.headers.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    /// Destination existed before, nothing was requested.
    AlreadyExists,
    Primary,
    Secondary,
    /// Both origins failed. The destination was not touched.
    Failed,
}

impl DownloadStatus {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed)
    }
}

enum AttemptState {
    TryPrimary,
    TrySecondary,
    Done(DownloadStatus),
}

enum AttemptFailure {
    Error(AulasError),
    TooShort(Option<f64>),
}

impl From<AulasError> for AttemptFailure {
    fn from(e: AulasError) -> Self {
        Self::Error(e)
    }
}

impl From<std::io::Error> for AttemptFailure {
    fn from(e: std::io::Error) -> Self {
        Self::Error(e.into())
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(e) => write!(f, "{e}"),
            Self::TooShort(Some(duration)) => write!(f, "output only lasts {duration:.2}s"),
            Self::TooShort(None) => write!(f, "output duration is unreadable"),
        }
    }
}

/// Downloads one media identifier into one file, trying the primary origin
/// first and the secondary origin when the primary output does not validate.
pub struct Coordinator<R, P> {
    primary: Origin,
    secondary: Origin,
    resolver: ManifestResolver,
    pool: SegmentFetcherPool,
    assembler: RemuxAssembler<R>,
    probe: P,
    staging_root: PathBuf,
    min_duration: f64,
}

impl Coordinator<FfmpegRemuxer, FfprobeDurationProbe> {
    /// The built coordinator uses whatever remuxer and probe are passed to
    /// [CoordinatorBuilder::build].
    pub fn builder(primary: Origin, secondary: Origin) -> CoordinatorBuilder {
        CoordinatorBuilder::new(primary, secondary)
    }
}

impl<R, P> Coordinator<R, P>
where
    R: Remuxer + Sync,
    P: DurationProbe + Sync,
{
    pub fn primary(&self) -> &Origin {
        &self.primary
    }

    pub fn secondary(&self) -> &Origin {
        &self.secondary
    }

    pub fn resolver(&self) -> &ManifestResolver {
        &self.resolver
    }

    /// Never fails: every error is logged and folded into [DownloadStatus::Failed].
    pub async fn download<O: AsRef<Path>>(&self, identifier: &str, output: O) -> DownloadStatus {
        let output = output.as_ref();
        if output.exists() {
            tracing::info!("{} already exists, skipping.", output.display());
            return DownloadStatus::AlreadyExists;
        }
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                tracing::error!("Failed to create {}: {e}", parent.display());
                return DownloadStatus::Failed;
            }
        }

        let mut state = AttemptState::TryPrimary;
        loop {
            state = match state {
                AttemptState::TryPrimary => {
                    match self.attempt(&self.primary, identifier, output).await {
                        Ok(()) => AttemptState::Done(DownloadStatus::Primary),
                        Err(reason) => {
                            tracing::warn!(
                                "Primary origin failed for {identifier}: {reason}. Trying secondary origin."
                            );
                            AttemptState::TrySecondary
                        }
                    }
                }
                AttemptState::TrySecondary => {
                    match self.attempt(&self.secondary, identifier, output).await {
                        Ok(()) => AttemptState::Done(DownloadStatus::Secondary),
                        Err(reason) => {
                            tracing::error!("Secondary origin failed for {identifier}: {reason}");
                            AttemptState::Done(DownloadStatus::Failed)
                        }
                    }
                }
                AttemptState::Done(status) => return status,
            };
        }
    }

    /// Runs one attempt into a sibling `_partial` file, which is renamed onto
    /// `output` only after validation.
    async fn attempt(
        &self,
        origin: &Origin,
        identifier: &str,
        output: &Path,
    ) -> Result<(), AttemptFailure> {
        let partial = output.with_suffix("partial");

        let result = match self.attempt_into(origin, identifier, &partial).await {
            Ok(()) => tokio::fs::rename(&partial, output)
                .await
                .map_err(AttemptFailure::from),
            Err(e) => Err(e),
        };

        if result.is_err() && partial.exists() {
            if let Err(e) = tokio::fs::remove_file(&partial).await {
                tracing::error!("Failed to remove {}: {e}", partial.display());
            }
        }
        result
    }

    async fn attempt_into(
        &self,
        origin: &Origin,
        identifier: &str,
        partial: &Path,
    ) -> Result<(), AttemptFailure> {
        let source = origin.source(identifier);
        tracing::info!("Downloading {identifier} from {}.", origin.host);

        let playlist = self
            .resolver
            .resolve_with_fallback(&source, &origin.policy, origin.fallback_variant.as_deref())
            .await?;

        let staging = StagingArea::create(&self.staging_root).await?;
        let report = self
            .pool
            .fetch_all(&playlist, source.headers(), &staging)
            .await?;
        if !report.is_complete() {
            tracing::warn!(
                "{} of {} segments failed, remuxing the rest.",
                report.failed.len(),
                report.total
            );
        }

        self.assembler.assemble(staging, &playlist, partial).await?;

        match self.probe.probe(partial).await {
            Some(duration) if duration > self.min_duration => {
                tracing::info!("Output lasts {duration:.2}s.");
                Ok(())
            }
            duration => Err(AttemptFailure::TooShort(duration)),
        }
    }
}

pub struct CoordinatorBuilder {
    primary: Origin,
    secondary: Origin,
    client: HttpClient,
    pool: Option<SegmentFetcherPool>,
    manifest_retries: u32,
    staging_root: PathBuf,
    min_duration: f64,
}

impl CoordinatorBuilder {
    pub fn new(primary: Origin, secondary: Origin) -> Self {
        Self {
            primary,
            secondary,
            client: HttpClient::default(),
            pool: None,
            manifest_retries: 3,
            staging_root: PathBuf::from(DEFAULT_STAGING_ROOT),
            min_duration: MIN_VALID_DURATION,
        }
    }

    /// Client used for manifests, and for segments unless [CoordinatorBuilder::pool] is set.
    pub fn client(mut self, client: HttpClient) -> Self {
        self.client = client;
        self
    }

    pub fn pool(mut self, pool: SegmentFetcherPool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn manifest_retries(mut self, retries: u32) -> Self {
        self.manifest_retries = retries;
        self
    }

    pub fn staging_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.staging_root = root.into();
        self
    }

    pub fn min_duration(mut self, seconds: f64) -> Self {
        self.min_duration = seconds;
        self
    }

    pub fn build<R, P>(self, remuxer: R, probe: P) -> Coordinator<R, P>
    where
        R: Remuxer + Sync,
        P: DurationProbe + Sync,
    {
        let pool = self.pool.unwrap_or_else(|| {
            SegmentFetcherPool::builder()
                .client(self.client.clone())
                .build()
        });

        Coordinator {
            primary: self.primary,
            secondary: self.secondary,
            resolver: ManifestResolver::new(self.client).with_retry(self.manifest_retries),
            pool,
            assembler: RemuxAssembler::new(remuxer),
            probe,
            staging_root: self.staging_root,
            min_duration: self.min_duration,
        }
    }
}
