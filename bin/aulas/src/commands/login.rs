use aulas_rocketseat::RocketseatClient;
use clap::Parser;

use crate::{
    commands::HttpOptions,
    config::Config,
    prompt::read_line,
};

/// Login and save the session for later commands
#[derive(Parser, Clone, Debug)]
pub struct LoginCommand {
    #[clap(flatten)]
    pub http: HttpOptions,

    #[clap(long, env = "AULAS_EMAIL")]
    pub email: Option<String>,

    #[clap(long, env = "AULAS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl LoginCommand {
    pub async fn run(self, config: Config) -> anyhow::Result<()> {
        let email = match self.email {
            Some(email) => email,
            None => read_line("Rocketseat email: ")?,
        };
        let password = match self.password {
            Some(password) => password,
            None => read_line("Password: ")?,
        };

        let client = self.http.into_client(&config)?;
        let mut platform = RocketseatClient::new(client)
            .with_endpoints(&config.api.api_base, &config.api.app_base);
        login(&mut platform, &config, &email, &password).await
    }
}

/// Logs in, saves the session and greets the account owner.
pub async fn login(
    platform: &mut RocketseatClient,
    config: &Config,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let session = platform.login(email, password).await?;
    session.save(&config.paths.session)?;

    let account = platform.account().await?;
    log::info!("Welcome, {}!", account.name);
    Ok(())
}
