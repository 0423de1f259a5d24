use crate::config::AmpConfig;
use crate::connection::{ConnectionError, ConnectionManager, ConnectionState};
use crate::network::{InterfaceProbe, NetworkStatus};
use crate::settings::SettingsState;
use amp_protocol::{codec, DeviceSettings, Effect, Param, ProtocolError};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

pub const STATUS_OK: &str = "Status OK";
pub const STATUS_READ_ERROR: &str = "ERROR reading from amp";
pub const STATUS_NO_NETWORK: &str = "Please Enable Wi-Fi!";

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ExchangeError {
    /// One-line notice for the user.
    pub fn notice(&self) -> &'static str {
        match self {
            ExchangeError::Connection(ConnectionError::NetworkUnavailable) => STATUS_NO_NETWORK,
            ExchangeError::Connection(ConnectionError::ConnectFailed { .. }) => {
                "Could not connect to amp"
            }
            ExchangeError::Connection(_) | ExchangeError::Protocol(_) => STATUS_READ_ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Exchanged(DeviceSettings),
    /// "Send" was pressed while a connection was live, so it was torn down.
    Disconnected,
}

/// What the session reports back to the presentation layer.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum SessionEvent {
    Settings {
        settings: DeviceSettings,
        dirty: bool,
        labels: Vec<String>,
        connection: ConnectionState,
    },
    ExchangeSucceeded {
        settings: DeviceSettings,
        notice: String,
    },
    ExchangeFailed {
        reason: String,
        notice: String,
    },
    NetworkUnavailable {
        notice: String,
    },
    Disconnected,
}

impl SessionEvent {
    pub fn from_outcome(result: &Result<SendOutcome, ExchangeError>) -> Self {
        match result {
            Ok(SendOutcome::Exchanged(settings)) => SessionEvent::ExchangeSucceeded {
                settings: *settings,
                notice: STATUS_OK.to_string(),
            },
            Ok(SendOutcome::Disconnected) => SessionEvent::Disconnected,
            Err(ExchangeError::Connection(ConnectionError::NetworkUnavailable)) => {
                SessionEvent::NetworkUnavailable {
                    notice: STATUS_NO_NETWORK.to_string(),
                }
            }
            Err(e) => SessionEvent::ExchangeFailed {
                reason: e.to_string(),
                notice: e.notice().to_string(),
            },
        }
    }

    pub fn settings(state: &SettingsState, connection: ConnectionState) -> Self {
        SessionEvent::Settings {
            settings: state.device_settings(),
            dirty: state.is_dirty(),
            labels: state.labels(),
            connection,
        }
    }
}

/// The controller the GUI host talks to: user edits go into the settings
/// state, and "send" runs one exchange with the device.
pub struct Session {
    state: SettingsState,
    connection: ConnectionManager,
    network: Box<dyn NetworkStatus + Send + Sync>,
}

impl Session {
    pub fn new(config: AmpConfig) -> Self {
        let probe = InterfaceProbe::new(config.endpoint());
        Self::with_network(config, probe)
    }

    pub fn with_network<N>(config: AmpConfig, network: N) -> Self
    where
        N: NetworkStatus + Send + Sync + 'static,
    {
        Self {
            state: SettingsState::new(),
            connection: ConnectionManager::new(config),
            network: Box::new(network),
        }
    }

    pub fn settings(&self) -> &SettingsState {
        &self.state
    }

    pub fn config(&self) -> &AmpConfig {
        self.connection.config()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn is_network_available(&self) -> bool {
        self.network.is_available()
    }

    pub fn on_effect_toggled(&mut self, effect: Effect) -> bool {
        let enabled = self.state.toggle_effect(effect);
        info!("{effect} {}", if enabled { "on" } else { "off" });
        enabled
    }

    pub fn on_parameter_changed(&mut self, param: Param, value: f64) -> f64 {
        let stored = self.state.set_param(param, value);
        if stored != value {
            info!("{param} clamped from {value} to {stored}");
        }
        stored
    }

    /// Connects and runs one exchange, or tears the connection down if one is
    /// already live. On any failure the settings are left as they were.
    pub async fn on_send_pressed(&mut self) -> Result<SendOutcome, ExchangeError> {
        if self.connection.is_active() {
            info!("send pressed while connected; disconnecting");
            self.connection.disconnect().await;
            return Ok(SendOutcome::Disconnected);
        }

        if !self.network.is_available() {
            warn!("network unavailable; not contacting {}", self.config().endpoint());
            return Err(ConnectionError::NetworkUnavailable.into());
        }

        self.state.mark_sent();
        let request = self.state.request_line();
        let result = self.connection.send_and_receive(&request).await;

        let reached_device = match &result {
            Ok(_) => true,
            Err(e) => e.reached_device(),
        };
        if reached_device {
            self.state.complete_exchange();
        }

        let raw = result.inspect_err(|e| warn!("exchange failed: {e}"))?;
        let decoded = codec::parse_response(&raw).inspect_err(|e| warn!("{e}"))?;
        let settings = self.state.apply_device_settings(decoded);
        if settings != decoded {
            warn!("device reported out-of-range values; clamped");
        }
        info!("device settings applied (mode {})", self.state.mode());
        Ok(SendOutcome::Exchanged(settings))
    }

    pub async fn disconnect(&mut self) {
        self.connection.disconnect().await;
    }
}
