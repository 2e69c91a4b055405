use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;

use crate::{error::AulasResult, util::path::uri_file_name};

static DIGITS_REGEXP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// One segment line of a media playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRef {
    pub uri: String,
    /// Numeric token of the file name, `video137.ts` -> `137`
    pub sequence_hint: Option<u64>,
}

impl SegmentRef {
    pub fn new<S: Into<String>>(uri: S) -> Self {
        let uri = uri.into();
        let sequence_hint = sequence_hint(&uri);
        Self { uri, sequence_hint }
    }

    /// Name of the staged file, which is also the line written to the local playlist.
    pub fn file_name(&self) -> &str {
        uri_file_name(&self.uri)
    }
}

/// Extracts the last run of digits in the file stem of `uri`.
pub fn sequence_hint(uri: &str) -> Option<u64> {
    let file_name = uri_file_name(uri);
    let stem = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name);
    DIGITS_REGEXP
        .find_iter(stem)
        .last()
        .and_then(|m| m.as_str().parse().ok())
}

/// Sorts `items` by their sequence hint.
///
/// Origins do not always list segments in emission order, so the numeric token
/// of the file name wins over the listing order. When any item has no hint the
/// listing order is kept as is.
pub fn order_by_sequence_hint<T, F>(items: &mut [T], hint: F)
where
    F: Fn(&T) -> Option<u64>,
{
    if items.iter().all(|item| hint(item).is_some()) {
        items.sort_by_key(|item| hint(item));
    }
}

/// A parsed media playlist whose segments are already in final order.
#[derive(Debug, Clone)]
pub struct MediaPlaylist {
    pub segments: Vec<SegmentRef>,
    /// URL of the playlist itself, relative segment URIs are joined onto it.
    pub base_uri: Url,
    playlist: m3u8_rs::MediaPlaylist,
}

impl MediaPlaylist {
    pub fn new(mut playlist: m3u8_rs::MediaPlaylist, base_uri: Url) -> Self {
        let mut entries: Vec<_> = std::mem::take(&mut playlist.segments)
            .into_iter()
            .map(|segment| (SegmentRef::new(segment.uri.clone()), segment))
            .collect();
        order_by_sequence_hint(&mut entries, |(segment, _)| segment.sequence_hint);

        let (segments, raw_segments): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
        playlist.segments = raw_segments;

        Self {
            segments,
            base_uri,
            playlist,
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment_url(&self, segment: &SegmentRef) -> AulasResult<Url> {
        if segment.uri.starts_with("http://") || segment.uri.starts_with("https://") {
            return Ok(Url::parse(&segment.uri)?);
        }
        Ok(self.base_uri.join(&segment.uri)?)
    }

    /// Renders the playlist with every segment line replaced by its bare
    /// file name, so that a remux tool reads the staged copies.
    pub fn local_manifest(&self) -> AulasResult<String> {
        let mut playlist = self.playlist.clone();
        for (raw, segment) in playlist.segments.iter_mut().zip(&self.segments) {
            raw.uri = segment.file_name().to_string();
        }

        let mut buffer = Vec::new();
        playlist.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
