use m3u8_rs::Playlist;
use reqwest::Url;

use crate::{
    error::{AulasError, AulasResult},
    fetch::{fetch_bytes, fetch_content_length},
    hls::{MediaPlaylist, SelectionPolicy, VariantPlaylist},
    source::MediaSource,
    util::http::HttpClient,
};

/// Finds the media playlist to download for a [MediaSource].
#[derive(Clone)]
pub struct ManifestResolver {
    client: HttpClient,
    retries: u32,
}

impl ManifestResolver {
    pub fn new(client: HttpClient) -> Self {
        Self { client, retries: 3 }
    }

    /// Attempts per manifest request. Defaults to 3.
    pub fn with_retry(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub async fn resolve(
        &self,
        source: &MediaSource,
        policy: &SelectionPolicy,
    ) -> AulasResult<MediaPlaylist> {
        self.resolve_with_fallback(source, policy, None).await
    }

    /// Same as [ManifestResolver::resolve], except that a master playlist none of whose
    /// variants declares a resolution is resolved to `fallback_variant` instead of
    /// being ranked.
    pub async fn resolve_with_fallback(
        &self,
        source: &MediaSource,
        policy: &SelectionPolicy,
        fallback_variant: Option<&str>,
    ) -> AulasResult<MediaPlaylist> {
        let manifest_url = source.manifest_url()?;

        let (playlist_url, playlist) = match self.load(source, manifest_url.clone()).await? {
            Playlist::MasterPlaylist(master) => {
                let variants: Vec<VariantPlaylist> = master
                    .variants
                    .iter()
                    .filter(|variant| !variant.is_i_frame)
                    .map(VariantPlaylist::from)
                    .collect();
                log::info!("Master playlist detected with {} variants.", variants.len());

                let uri = match fallback_variant {
                    Some(fallback)
                        if !variants.is_empty()
                            && variants.iter().all(|v| v.resolution.is_none()) =>
                    {
                        log::warn!("No variant declares a resolution, using {fallback}.");
                        fallback
                    }
                    _ => {
                        let variant = policy.select(&variants)?;
                        log::info!("Selected variant {variant} with {policy:?} policy.");
                        variant.uri.as_str()
                    }
                };

                let url = source.resolve(uri)?;
                match self.load(source, url.clone()).await? {
                    Playlist::MediaPlaylist(playlist) => (url, playlist),
                    Playlist::MasterPlaylist(_) => {
                        return Err(AulasError::M3u8ParseError(format!(
                            "{url} is a master playlist, expected a media playlist"
                        )))
                    }
                }
            }
            Playlist::MediaPlaylist(playlist) => (manifest_url, playlist),
        };

        if playlist.segments.is_empty() {
            return Err(AulasError::EmptyPlaylist(format!(
                "{playlist_url} has no segments"
            )));
        }

        log::info!(
            "Media playlist {playlist_url} has {} segments.",
            playlist.segments.len()
        );
        Ok(MediaPlaylist::new(playlist, playlist_url))
    }

    async fn load(&self, source: &MediaSource, url: Url) -> AulasResult<Playlist> {
        log::debug!("Start fetching M3U8 file {url}.");

        let mut retry = self.retries.max(1);
        let mut last_error = AulasError::M3u8FetchError;
        while retry > 0 {
            retry -= 1;

            match fetch_bytes(&self.client, url.clone(), source.headers()).await {
                Ok(m3u8_bytes) => match m3u8_rs::parse_playlist_res(&m3u8_bytes) {
                    Ok(parsed) => return Ok(parsed),
                    Err(error) => {
                        log::warn!("Failed to parse M3U8 file: {error}");
                        last_error = AulasError::M3u8ParseError(url.to_string());
                    }
                },
                Err(error) => {
                    log::warn!("Failed to fetch M3U8 file: {error}");
                    last_error = AulasError::M3u8FetchError;
                }
            }
        }

        Err(last_error)
    }

    /// Sums the `Content-Length` of every segment with HEAD requests.
    ///
    /// Segments that fail or do not report a length are counted as zero.
    pub async fn estimate_size(
        &self,
        source: &MediaSource,
        playlist: &MediaPlaylist,
    ) -> AulasResult<u64> {
        let mut total = 0;
        for segment in &playlist.segments {
            let url = playlist.segment_url(segment)?;
            match fetch_content_length(&self.client, url, source.headers()).await {
                Ok(length) => total += length.unwrap_or_default(),
                Err(e) => log::debug!("Can not estimate size of {}: {e}", segment.uri),
            }
        }
        Ok(total)
    }
}
