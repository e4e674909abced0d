use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_BASE_URL: &str = "https://financialmodelingprep.com/stable";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SEARCH_EXCHANGES: &str = "NASDAQ,NYSE,AMEX";

pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub upstream: UpstreamConfig,
}

/// Connection settings for the FMP provider.
#[derive(Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub search_exchanges: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr: SocketAddr = lookup("GATEWAY_ADDR")
            .unwrap_or_else(|| DEFAULT_ADDR.to_string())
            .parse()
            .context("invalid GATEWAY_ADDR")?;

        let api_key = match lookup("FMP_API_KEY") {
            Some(key) if !key.trim().is_empty() => key.trim().to_string(),
            _ => bail!("FMP_API_KEY is not set; configure it in the environment or a .env file"),
        };

        let base_url = lookup("FMP_BASE_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout = parse_duration(&lookup, "FMP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

        let search_exchanges = lookup("FMP_SEARCH_EXCHANGES")
            .unwrap_or_else(|| DEFAULT_SEARCH_EXCHANGES.to_string());

        Ok(Self {
            listen_addr,
            upstream: UpstreamConfig {
                base_url,
                api_key,
                timeout,
                search_exchanges,
            },
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("search_exchanges", &self.search_exchanges)
            .finish()
    }
}

fn parse_duration<F>(lookup: &F, env_key: &str, default_secs: u64) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(env_key).unwrap_or_else(|| default_secs.to_string());
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{env_key} must be an integer number of seconds"))?;

    if secs == 0 {
        bail!("{env_key} must be greater than zero");
    }

    Ok(Duration::from_secs(secs))
}
