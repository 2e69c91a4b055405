use reqwest::{header::HeaderMap, Url};

use crate::error::AulasResult;

/// Name of the top-level manifest below every media identifier.
pub const MASTER_PLAYLIST: &str = "playlist.m3u8";

/// One media identifier served by one origin.
///
/// A new source is created for every origin tried, so that headers of one
/// origin never leak into requests sent to another.
#[derive(Debug, Clone)]
pub struct MediaSource {
    identifier: String,
    origin_host: String,
    headers: HeaderMap,
}

impl MediaSource {
    /// `origin_host` is a bare host (`b-vz.example.com`), which implies https,
    /// or a base including its scheme (`http://127.0.0.1:8080`).
    pub fn new<I, H>(identifier: I, origin_host: H) -> Self
    where
        I: Into<String>,
        H: Into<String>,
    {
        Self {
            identifier: identifier.into(),
            origin_host: origin_host.into(),
            headers: HeaderMap::new(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn origin_host(&self) -> &str {
        &self.origin_host
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// `https://{origin}/{identifier}/`
    pub fn base_url(&self) -> AulasResult<Url> {
        let origin = self.origin_host.trim_end_matches('/');
        let base = if origin.starts_with("http://") || origin.starts_with("https://") {
            format!("{origin}/{}/", self.identifier)
        } else {
            format!("https://{origin}/{}/", self.identifier)
        };
        Ok(Url::parse(&base)?)
    }

    /// `https://{origin}/{identifier}/playlist.m3u8`
    pub fn manifest_url(&self) -> AulasResult<Url> {
        Ok(self.base_url()?.join(MASTER_PLAYLIST)?)
    }

    /// Absolute http(s) URIs are kept untouched, anything else is joined
    /// with [MediaSource::base_url].
    pub fn resolve(&self, uri: &str) -> AulasResult<Url> {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            return Ok(Url::parse(uri)?);
        }
        Ok(self.base_url()?.join(uri)?)
    }
}
