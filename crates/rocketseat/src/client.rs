use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use anyhow::{anyhow, bail};
use aulas::HttpClient;
use regex::Regex;
use reqwest::{
    header::{AUTHORIZATION, REFERER},
    RequestBuilder,
};
use serde_json::json;

use crate::{
    model::{CatalogPage, JourneyEnvelope, JourneyNodeDetail, SessionResponse},
    Account, Group, JourneyNode, SessionState, Specialization,
};

pub const API_BASE: &str = "https://skylab-api.rocketseat.com.br";
pub const APP_BASE: &str = "https://app.rocketseat.com.br";

/// Where the contents page is dumped when the journey script is missing.
pub const RESPONSE_DUMP_PATH: &str = "server_response.html";

static SCRIPT_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<script[^>]*>(.*?)</script>").unwrap());

pub struct RocketseatClient {
    client: HttpClient,
    api_base: String,
    app_base: String,
    authorization: Option<String>,
    response_dump: PathBuf,
}

impl RocketseatClient {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            api_base: API_BASE.to_string(),
            app_base: APP_BASE.to_string(),
            authorization: None,
            response_dump: PathBuf::from(RESPONSE_DUMP_PATH),
        }
    }

    pub fn with_endpoints<A, B>(mut self, api_base: A, app_base: B) -> Self
    where
        A: Into<String>,
        B: Into<String>,
    {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self.app_base = app_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_response_dump<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.response_dump = path.into();
        self
    }

    pub fn http_client(&self) -> &HttpClient {
        &self.client
    }

    /// Authenticates every following request with `session`.
    pub fn use_session(&mut self, session: &SessionState) -> anyhow::Result<()> {
        self.authorization = Some(session.authorization());
        self.client
            .add_cookies(session.cookies(), self.api_base.as_str())?;
        self.client
            .add_cookies(session.cookies(), self.app_base.as_str())?;
        Ok(())
    }

    pub async fn login(&mut self, email: &str, password: &str) -> anyhow::Result<SessionState> {
        let response: SessionResponse = self
            .client
            .post(format!("{}/sessions", self.api_base))
            .header(REFERER, self.referer())
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let session = SessionState {
            token_type: response.token_type,
            access_token: response.token,
            refresh_token: response.refresh_token,
        };
        self.use_session(&session)?;
        Ok(session)
    }

    pub async fn account(&self) -> anyhow::Result<Account> {
        let account = self
            .get(format!("{}/account", self.api_base))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(account)
    }

    pub async fn list_specializations(&self) -> anyhow::Result<Vec<Specialization>> {
        let page: CatalogPage = self
            .get(format!("{}/catalog/list", self.api_base))
            .query(&[
                ("types[0]", "SPECIALIZATION"),
                ("limit", "12"),
                ("offset", "0"),
                ("page", "1"),
                ("sort_by", "relevance"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        log::debug!("{} specializations found.", page.items.len());
        Ok(page.items)
    }

    /// Levels of a specialization, read from the data embedded in its contents page.
    pub async fn load_journey_nodes(
        &self,
        specialization: &Specialization,
    ) -> anyhow::Result<Vec<JourneyNode>> {
        let url = format!(
            "{}/{}/contents",
            self.app_base,
            specialization.uri.trim_matches('/')
        );
        let html = self.get(url).send().await?.error_for_status()?.text().await?;

        let Some(script) = find_journey_script(&html) else {
            tokio::fs::write(&self.response_dump, &html).await?;
            bail!(
                "journey script not found in contents page of {}, response saved to {}",
                specialization.title,
                self.response_dump.display()
            );
        };
        parse_journey_nodes(script)
    }

    /// Groups of a `cluster` level.
    pub async fn journey_groups(&self, slug: &str) -> anyhow::Result<Vec<Group>> {
        let detail: JourneyNodeDetail = self
            .get(format!("{}/journey-nodes/{slug}", self.api_base))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(detail.into_groups())
    }

    pub async fn download_file<P: AsRef<Path>>(&self, url: &str, path: P) -> anyhow::Result<()> {
        let bytes = self.get(url).send().await?.error_for_status()?.bytes().await?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    /// Platform requests carry the app as referer. Media origins never see it.
    fn referer(&self) -> String {
        format!("{}/", self.app_base)
    }

    fn get<U: reqwest::IntoUrl>(&self, url: U) -> RequestBuilder {
        let request = self.client.get(url).header(REFERER, self.referer());
        match &self.authorization {
            Some(authorization) => request.header(AUTHORIZATION, authorization),
            None => request,
        }
    }
}

fn find_journey_script(html: &str) -> Option<&str> {
    SCRIPT_REGEXP
        .captures_iter(html)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str())
        .find(|script| script.contains("journeyId"))
}

/// The contents page carries the journey as an escaped JSON string inside a
/// script. Only the `journey` object is cut out of it.
fn parse_journey_nodes(script: &str) -> anyhow::Result<Vec<JourneyNode>> {
    let script = script.trim().replace(r#"\""#, "\"").replace(r"\\", r"\");
    let start = script
        .find(r#"{"journey"#)
        .ok_or_else(|| anyhow!("journey object not found in script"))?;
    let journey = script[start..]
        .split(r#","children"#)
        .next()
        .unwrap_or_default();

    let envelope: JourneyEnvelope = serde_json::from_str(&format!("{journey}}}"))?;
    Ok(envelope.journey.nodes)
}
