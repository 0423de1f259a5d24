pub mod actor;
pub mod config;
pub mod connection;
pub mod logging;
pub mod mock_device;
pub mod network;
pub mod session;
pub mod settings;

pub use actor::{UiCommand, COMMAND_CAP, EVENT_CAP};
pub use config::AmpConfig;
pub use connection::{ConnectionError, ConnectionManager, ConnectionState};
pub use mock_device::MockDevice;
pub use network::{AlwaysAvailable, InterfaceProbe, NetworkStatus};
pub use session::{ExchangeError, SendOutcome, Session, SessionEvent};
pub use settings::SettingsState;
