use amp_protocol::{codec, DeviceRequest, DeviceSettings};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

const MAX_REQUEST_BYTES: usize = 1024;

/// A stand-in for the amplifier: a TCP server that answers fetch and apply
/// requests from its stored settings, one request per connection.
pub struct MockDevice {
    shutdown: Arc<AtomicBool>,
    join_handle: Mutex<Option<JoinHandle<()>>>,
    listen_addr: SocketAddr,
    settings: Arc<Mutex<DeviceSettings>>,
    requests: Receiver<String>,
}

impl MockDevice {
    pub fn spawn_with_addr(addr: &str, initial: DeviceSettings) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        let listen_addr = listener.local_addr()?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let settings = Arc::new(Mutex::new(initial));
        let (req_tx, requests) = unbounded();

        let shutdown_for_thread = Arc::clone(&shutdown);
        let settings_for_thread = Arc::clone(&settings);
        let join_handle = thread::spawn(move || {
            run_device(listener, settings_for_thread, req_tx, shutdown_for_thread)
        });

        Ok(Self {
            shutdown,
            join_handle: Mutex::new(Some(join_handle)),
            listen_addr,
            settings,
            requests,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    /// Every request line received, in arrival order.
    pub fn requests(&self) -> &Receiver<String> {
        &self.requests
    }

    pub fn settings(&self) -> DeviceSettings {
        self.settings.lock().map(|s| *s).unwrap_or_default()
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Ok(mut h) = self.join_handle.lock() {
            if let Some(h) = h.take() {
                let _ = h.join();
            }
        }
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_device(
    listener: TcpListener,
    settings: Arc<Mutex<DeviceSettings>>,
    req_tx: Sender<String>,
    shutdown: Arc<AtomicBool>,
) {
    while !shutdown.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, peer)) => {
                if let Err(e) = serve(stream, &settings, &req_tx) {
                    warn!("mock device: client {peer} failed: {e}");
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(10));
            }
            Err(e) => {
                warn!("mock device: accept failed: {e}");
                thread::sleep(Duration::from_millis(10));
            }
        }
    }
}

fn serve(
    mut stream: TcpStream,
    settings: &Mutex<DeviceSettings>,
    req_tx: &Sender<String>,
) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(Duration::from_millis(500)))?;
    stream.set_write_timeout(Some(Duration::from_millis(500)))?;

    let line = read_request_line(&mut stream)?;
    debug!("mock device: request {:?}", line.trim_end());
    let _ = req_tx.send(line.clone());

    let Ok(mut current) = settings.lock() else {
        return Err(io::Error::other("settings lock poisoned"));
    };
    let reply = match codec::parse_request(&line) {
        Ok(DeviceRequest::Fetch) => codec::encode_response(&current),
        Ok(DeviceRequest::Apply(new_settings)) => {
            *current = new_settings;
            codec::encode_response(&current)
        }
        Err(e) => format!("ERROR {e}\r\n"),
    };
    drop(current);

    stream.write_all(reply.as_bytes())?;
    stream.flush()?;
    Ok(())
}

fn read_request_line(stream: &mut TcpStream) -> io::Result<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 256];
    while !buf.ends_with(b"\r\n") && buf.len() < MAX_REQUEST_BYTES {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
