use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Optional config file read from the working directory
pub const CONFIG_FILE: &str = "rental-calendar.toml";

/// Runtime configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server root; the REST API lives under `{api_url}/API`
    pub api_url: String,
    /// Bearer token to start the session with
    pub token: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Per-request timeout in seconds, `0` disables it
    pub timeout_secs: u64,
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5228".to_string(),
            token: None,
            email: None,
            password: None,
            timeout_secs: 30,
            log_json: false,
        }
    }
}

impl Config {
    /// Defaults, then `rental-calendar.toml`, then `RENTAL_*` variables
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed("RENTAL_"))
    }

    pub fn load() -> Result<Self> {
        Self::figment().extract().context("Failed to load config")
    }

    /// Base URL of the REST API
    pub fn api_base(&self) -> String {
        format!("{}/API", self.api_url.trim_end_matches('/'))
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("log_json", &self.log_json)
            .finish()
    }
}
