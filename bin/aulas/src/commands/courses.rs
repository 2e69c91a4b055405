use clap::Parser;

use crate::{
    commands::{authenticated_client, HttpOptions},
    config::Config,
};

/// List the available specializations
#[derive(Parser, Clone, Debug)]
pub struct CoursesCommand {
    #[clap(flatten)]
    pub http: HttpOptions,
}

impl CoursesCommand {
    pub async fn run(self, config: Config) -> anyhow::Result<()> {
        let client = self.http.into_client(&config)?;
        let platform = authenticated_client(&config, client).await?;

        for (i, specialization) in platform.list_specializations().await?.iter().enumerate() {
            println!("[{}] - {}", i + 1, specialization.title);
        }
        Ok(())
    }
}
