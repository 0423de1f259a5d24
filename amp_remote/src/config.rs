use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// The unit's own access point hands out this address.
pub const DEFAULT_HOST: &str = "192.168.4.1";
pub const DEFAULT_PORT: u16 = 80;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(250);
const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_EXIT_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub struct AmpConfig {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
    /// Silence after the first response byte that ends a message.
    pub idle_timeout: Duration,
    /// Upper bound on a whole exchange once connected.
    pub response_timeout: Duration,
    /// How long the host waits before exiting when there is no network.
    pub exit_grace: Duration,
}

impl Default for AmpConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            exit_grace: DEFAULT_EXIT_GRACE,
        }
    }
}

impl AmpConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("AMP_HOST")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.host),
            port: env_parse("AMP_PORT", defaults.port),
            connect_timeout: env_millis("AMP_CONNECT_TIMEOUT_MS", defaults.connect_timeout),
            idle_timeout: env_millis("AMP_IDLE_TIMEOUT_MS", defaults.idle_timeout),
            response_timeout: env_millis("AMP_RESPONSE_TIMEOUT_MS", defaults.response_timeout),
            exit_grace: env_millis("AMP_EXIT_GRACE_MS", defaults.exit_grace),
        }
    }

    pub fn with_endpoint(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_parse<T: FromStr + Copy + std::fmt::Debug>(key: &str, default: T) -> T {
    let Ok(raw) = std::env::var(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!("ignoring {key}={raw:?}, using {default:?}");
            default
        }
    }
}

fn env_millis(key: &str, default: Duration) -> Duration {
    Duration::from_millis(env_parse(key, default.as_millis() as u64))
}
