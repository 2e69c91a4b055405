use bytes::Bytes;
use reqwest::{header::HeaderMap, Url};

use crate::{
    error::{AulasError, AulasResult},
    util::http::HttpClient,
};

/// GET `url` with the origin headers and return the whole body.
///
/// Any non-2xx status is an error, the body is only logged.
pub(crate) async fn fetch_bytes(
    client: &HttpClient,
    url: Url,
    headers: &HeaderMap,
) -> AulasResult<Bytes> {
    let response = client.get(url).headers(headers.clone()).send().await?;
    if !response.status().is_success() {
        let status = response.status();
        if let Ok(body) = response.text().await {
            tracing::debug!("Error body: {body}");
        }
        return Err(AulasError::HttpError(status));
    }

    Ok(response.bytes().await?)
}

/// HEAD `url` and read its `Content-Length`.
pub(crate) async fn fetch_content_length(
    client: &HttpClient,
    url: Url,
    headers: &HeaderMap,
) -> AulasResult<Option<u64>> {
    let response = client.head(url).headers(headers.clone()).send().await?;
    if !response.status().is_success() {
        return Err(AulasError::HttpError(response.status()));
    }

    Ok(response
        .headers()
        .get(reqwest::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok()))
}
