use std::time::Duration;

use anyhow::Context;
use aulas::{util::http::parse_header_line, HttpClient};
use aulas_rocketseat::{RocketseatClient, SessionState};
use clap::{Args, Subcommand};
use fake_user_agent::get_chrome_rua;
use reqwest::{header::HeaderMap, Client};

use crate::{config::Config, prompt::read_line};

mod courses;
mod download;
mod login;

#[derive(Subcommand, Clone, Debug)]
pub enum AulasCommand {
    Login(login::LoginCommand),
    Courses(courses::CoursesCommand),
    Download(download::DownloadCommand),
}

impl AulasCommand {
    pub async fn run(self, config: Config) -> anyhow::Result<()> {
        match self {
            Self::Login(command) => command.run(config).await,
            Self::Courses(command) => command.run(config).await,
            Self::Download(command) => command.run(config).await,
        }
    }
}

#[derive(Args, Clone, Debug, Default)]
pub struct HttpOptions {
    /// Additional HTTP headers sent with every request, eg. "User-Agent: xxxxx"
    #[clap(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// HTTP timeout in seconds, overrides the configuration file
    #[clap(short, long)]
    pub timeout: Option<u64>,
}

impl HttpOptions {
    pub fn into_client(self, config: &Config) -> anyhow::Result<HttpClient> {
        let mut headers = HeaderMap::new();
        for header in &self.headers {
            let (name, value) = parse_header_line(header)?;
            headers.insert(name, value);
        }

        let timeout = self.timeout.unwrap_or(config.download.timeout);
        let client = HttpClient::new(
            Client::builder()
                .default_headers(headers)
                .user_agent(get_chrome_rua())
                .timeout(Duration::from_secs(timeout)),
        )?;
        Ok(client)
    }
}

/// Restores the saved session, or logs in interactively when there is none.
pub async fn authenticated_client(
    config: &Config,
    client: HttpClient,
) -> anyhow::Result<RocketseatClient> {
    let mut platform = RocketseatClient::new(client)
        .with_endpoints(&config.api.api_base, &config.api.app_base);

    match SessionState::load(&config.paths.session)? {
        Some(session) => platform.use_session(&session)?,
        None => {
            log::info!("No saved session found, please login.");
            let email = read_line("Rocketseat email: ")?;
            let password = read_line("Password: ")?;
            login::login(&mut platform, config, &email, &password)
                .await
                .context("login failed")?;
        }
    }

    Ok(platform)
}
