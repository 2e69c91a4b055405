use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SESSION_PATH: &str = ".session.json";

const ACCESS_TOKEN_COOKIE: &str = "skylab_next_access_token_v3";
const REFRESH_TOKEN_COOKIE: &str = "skylab_next_refresh_token_v3";

/// Everything needed to resume an authenticated session without logging in again.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub token_type: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl SessionState {
    /// Value of the `Authorization` header, `Bearer <token>`.
    pub fn authorization(&self) -> String {
        format!("{} {}", capitalize(&self.token_type), self.access_token)
    }

    /// Session cookies in `name=value` form.
    pub fn cookies(&self) -> Vec<String> {
        vec![
            format!("{ACCESS_TOKEN_COOKIE}={}", self.access_token),
            format!("{REFRESH_TOKEN_COOKIE}={}", self.refresh_token),
        ]
    }

    /// Returns `None` when no session has been saved yet.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        log::info!("Loading saved session from {}.", path.display());
        let data = std::fs::read_to_string(path)?;
        let session = serde_json::from_str(&data).with_context(|| {
            format!(
                "invalid session file, delete {} and login again",
                path.display()
            )
        })?;
        Ok(Some(session))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::debug!("Session saved to {}.", path.display());
        Ok(())
    }
}

/// First character uppercased, the rest lowercased.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
