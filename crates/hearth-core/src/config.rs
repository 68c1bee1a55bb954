use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 18920;
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Top-level config (hearth.toml + HEARTH_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub supervisor: SupervisorConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Bridges allowed to push events into the hub, keyed by claimed id.
    #[serde(default)]
    pub bridges: Vec<BridgeConfig>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            supervisor: SupervisorConfig::default(),
            auth: AuthConfig::default(),
            bridges: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// Daemon restart throttling knobs. These are policy defaults, not protocol:
/// operators tune them per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Delay before relaunching a failed daemon.
    #[serde(default = "default_restart_delay_secs")]
    pub restart_delay_secs: u64,
    /// Sliding window over which failures are counted.
    #[serde(default = "default_failure_window_mins")]
    pub failure_window_mins: u64,
    /// Minimum failed attempts in the window before the rate test applies.
    #[serde(default = "default_failure_min_attempts")]
    pub failure_min_attempts: usize,
    /// Failure rate (per minute) above which the supervisor panics.
    #[serde(default = "default_failure_max_per_min")]
    pub failure_max_per_min: f64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            restart_delay_secs: default_restart_delay_secs(),
            failure_window_mins: default_failure_window_mins(),
            failure_min_attempts: default_failure_min_attempts(),
            failure_max_per_min: default_failure_max_per_min(),
        }
    }
}

/// Ingress authentication windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Requests with a timestamp older than this are rejected as stale.
    #[serde(default = "default_freshness_window_secs")]
    pub freshness_window_secs: u64,
    /// Consumed tokens older than this are pruned from the replay cache.
    #[serde(default = "default_replay_retention_secs")]
    pub replay_retention_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            freshness_window_secs: default_freshness_window_secs(),
            replay_retention_secs: default_replay_retention_secs(),
        }
    }
}

/// Credential for one external bridge: `{id, pre-shared key}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Identifier the bridge claims in X-Bridge-Id.
    pub id: String,
    /// Secret shared out-of-band, used to compute request signatures.
    pub psk: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_restart_delay_secs() -> u64 {
    30
}
fn default_failure_window_mins() -> u64 {
    20
}
fn default_failure_min_attempts() -> usize {
    5
}
fn default_failure_max_per_min() -> f64 {
    1.0
}
fn default_freshness_window_secs() -> u64 {
    60
}
fn default_replay_retention_secs() -> u64 {
    300
}

impl HubConfig {
    /// Load config from a TOML file with HEARTH_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.hearth/hearth.toml
    ///
    /// Env sections are separated by double underscores so multi-word keys
    /// survive: `HEARTH_SUPERVISOR__RESTART_DELAY_SECS` →
    /// `supervisor.restart_delay_secs`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: HubConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("HEARTH_").split("__"))
            .extract()
            .map_err(|e| crate::error::HubError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.hearth/hearth.toml", home)
}
