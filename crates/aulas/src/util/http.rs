use std::{ops::Deref, str::FromStr, sync::Arc};

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client, ClientBuilder, IntoUrl, Url,
};
use reqwest_cookie_store::{CookieStore, CookieStoreMutex};

use crate::error::{AulasError, AulasResult};

/// A reqwest client sharing one cookie jar between all of its clones.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    cookies_store: Arc<CookieStoreMutex>,
}

impl HttpClient {
    pub fn new(builder: ClientBuilder) -> AulasResult<Self> {
        let cookies_store = Arc::new(CookieStoreMutex::new(CookieStore::default()));
        let client = builder.cookie_provider(cookies_store.clone()).build()?;

        Ok(Self {
            client,
            cookies_store,
        })
    }

    pub fn add_cookies(&self, cookies: Vec<String>, url: impl IntoUrl) -> AulasResult<()> {
        let url = url.into_url()?;
        let mut lock = self.cookies_store.lock().unwrap();
        for cookie in cookies {
            if let Err(e) = lock.parse(&cookie, &url) {
                tracing::warn!("Ignoring invalid cookie for {url}: {e}");
            }
        }
        Ok(())
    }

    /// Cookies that would be sent to `url`, in `name=value` form.
    pub fn cookies(&self, url: &Url) -> Vec<String> {
        let lock = self.cookies_store.lock().unwrap();
        lock.get_request_values(url)
            .map(|(name, value)| format!("{name}={value}"))
            .collect()
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        let cookies_store = Arc::new(CookieStoreMutex::new(CookieStore::default()));
        let client = Client::builder()
            .cookie_provider(cookies_store.clone())
            .build()
            .unwrap_or_default();

        Self {
            client,
            cookies_store,
        }
    }
}

impl Deref for HttpClient {
    type Target = Client;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

/// Build a [HeaderMap] from name/value pairs.
pub fn header_map<I, K, V>(headers: I) -> AulasResult<HeaderMap>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        let (key, value) = (key.as_ref(), value.as_ref());
        let name = HeaderName::from_str(key.trim())
            .map_err(|_| AulasError::InvalidHeader(key.to_string()))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|_| AulasError::InvalidHeader(format!("{key}: {value}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Parse a `Name: value` header line.
pub fn parse_header_line(line: &str) -> AulasResult<(HeaderName, HeaderValue)> {
    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| AulasError::InvalidHeader(line.to_string()))?;
    let map = header_map([(key, value)])?;
    map.into_iter()
        .next()
        .and_then(|(name, value)| name.map(|name| (name, value)))
        .ok_or_else(|| AulasError::InvalidHeader(line.to_string()))
}
