use std::net::UdpSocket;
use tracing::debug;

/// Reports whether the host has any network path at all.
pub trait NetworkStatus {
    fn is_available(&self) -> bool;
}

impl<F> NetworkStatus for F
where
    F: Fn() -> bool,
{
    fn is_available(&self) -> bool {
        self()
    }
}

/// Asks the OS which local address would route to the device. An unspecified
/// address (0.0.0.0) or a routing failure means there is no usable network.
/// A UDP "connect" only selects a route; nothing is sent.
pub struct InterfaceProbe {
    target: String,
}

impl InterfaceProbe {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

impl NetworkStatus for InterfaceProbe {
    fn is_available(&self) -> bool {
        let Ok(socket) = UdpSocket::bind("0.0.0.0:0") else {
            return false;
        };
        if let Err(e) = socket.connect(&self.target) {
            debug!("no route to {}: {e}", self.target);
            return false;
        }
        match socket.local_addr() {
            Ok(addr) => !addr.ip().is_unspecified(),
            Err(_) => false,
        }
    }
}

pub struct AlwaysAvailable;

impl NetworkStatus for AlwaysAvailable {
    fn is_available(&self) -> bool {
        true
    }
}
