use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub predictor: PredictorConfig,
    pub forecast: ForecastConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            enable_cors: false,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Delimited file with region, subregion, latitude, longitude, timestamp, usage
    pub csv_path: PathBuf,
    /// Number of trailing daily points used as the historical window
    pub history_window_days: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("data/usage.csv"),
            history_window_days: 90,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictorConfig {
    pub enabled: bool,
    pub interpreter: String,
    /// Candidate scripts, most capable first
    pub scripts: Vec<PathBuf>,
    /// Per-attempt limit
    pub timeout_secs: u64,
    /// Overall limit for the whole external chain
    pub chain_timeout_secs: u64,
    pub models_dir: PathBuf,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interpreter: "python3".to_string(),
            scripts: vec![
                PathBuf::from("scripts/advanced-model-predictor.py"),
                PathBuf::from("scripts/model-predictor.py"),
                PathBuf::from("scripts/model-predictor-simple.py"),
            ],
            timeout_secs: 10,
            chain_timeout_secs: 20,
            models_dir: PathBuf::from("models"),
        }
    }
}

impl PredictorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn chain_timeout(&self) -> Duration {
        Duration::from_secs(self.chain_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JitterMode {
    Random,
    Seeded,
    Off,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub reference_latitude: f64,
    pub reference_longitude: f64,
    pub jitter: JitterMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter_seed: Option<u64>,
    /// Furthest target date accepted, in days after today
    pub max_horizon_days: u32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            reference_latitude: 20.0,
            reference_longitude: 78.0,
            jitter: JitterMode::Random,
            jitter_seed: None,
            max_horizon_days: 365,
        }
    }
}

/// Headroom between the external chain deadline and the request timeout,
/// enough for the statistical stage and serialization.
const FALLBACK_HEADROOM: Duration = Duration::from_secs(5);

impl Config {
    /// Request timeout actually applied to the router. Never shorter than the
    /// external chain deadline plus headroom, so the statistical fallback
    /// always gets to answer.
    pub fn request_timeout(&self) -> Duration {
        let configured = Duration::from_secs(self.server.request_timeout_secs.max(1));
        if !self.predictor.enabled {
            return configured;
        }
        configured.max(self.predictor.chain_timeout() + FALLBACK_HEADROOM)
    }

    pub fn load() -> Result<Self> {
        // .env is optional; deployments set variables directly
        let _ = dotenvy::dotenv();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("DEMAND__").split("__"));
        Ok(figment.extract()?)
    }
}
