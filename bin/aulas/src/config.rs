use std::{
    collections::BTreeMap,
    num::NonZeroU32,
    path::{Path, PathBuf},
};

use aulas::{
    coordinator::{Origin, MIN_VALID_DURATION},
    util::http::header_map,
};
use aulas_rocketseat::{API_BASE, APP_BASE, DEFAULT_OUTPUT_ROOT, DEFAULT_SESSION_PATH};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "aulas.toml";

const PRIMARY_HOST: &str = "b-vz-762f4670-e04.tv.pandavideo.com.br";
const SECONDARY_HOST: &str = "vz-762f4670-e04.b-cdn.net";
const PLAYER_ORIGIN: &str = "https://player-vz-762f4670-e04.tv.pandavideo.com.br";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub primary: OriginConfig,
    pub secondary: OriginConfig,
    pub download: DownloadConfig,
    pub paths: PathsConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub api_base: String,
    pub app_base: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OriginConfig {
    pub host: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DownloadConfig {
    pub concurrency: NonZeroU32,
    pub segment_retries: u32,
    pub manifest_retries: u32,
    /// HTTP timeout, in seconds
    pub timeout: u64,
    /// Outputs not longer than this, in seconds, fall back to the secondary origin
    pub min_duration: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    pub temp_root: PathBuf,
    pub output_root: PathBuf,
    pub session: PathBuf,
}

impl Config {
    /// Defaults are used when `path` does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("{} not found, using default configuration.", path.display());
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)?;
        let config = toml::from_str(&data)?;
        Ok(config)
    }
}

impl OriginConfig {
    pub fn primary_origin(&self) -> anyhow::Result<Origin> {
        Ok(Origin::primary(&self.host).with_headers(header_map(&self.headers)?))
    }

    pub fn secondary_origin(&self) -> anyhow::Result<Origin> {
        Ok(Origin::secondary(&self.host).with_headers(header_map(&self.headers)?))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            primary: OriginConfig {
                host: PRIMARY_HOST.to_string(),
                headers: BTreeMap::from([
                    ("Origin".to_string(), APP_BASE.to_string()),
                    ("Referer".to_string(), format!("{APP_BASE}/")),
                ]),
            },
            secondary: OriginConfig {
                host: SECONDARY_HOST.to_string(),
                headers: BTreeMap::from([
                    ("Origin".to_string(), PLAYER_ORIGIN.to_string()),
                    ("Referer".to_string(), format!("{PLAYER_ORIGIN}/")),
                    ("Sec-Fetch-Dest".to_string(), "empty".to_string()),
                    ("Sec-Fetch-Mode".to_string(), "cors".to_string()),
                    ("Sec-Fetch-Site".to_string(), "cross-site".to_string()),
                ]),
            },
            download: DownloadConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_base: API_BASE.to_string(),
            app_base: APP_BASE.to_string(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            concurrency: NonZeroU32::new(10).unwrap(),
            segment_retries: 3,
            manifest_retries: 3,
            timeout: 30,
            min_duration: MIN_VALID_DURATION,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            temp_root: PathBuf::from(aulas::staging::DEFAULT_STAGING_ROOT),
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            session: PathBuf::from(DEFAULT_SESSION_PATH),
        }
    }
}
