use amp_protocol::DeviceSettings;
use amp_remote::{logging, MockDevice, SettingsState};
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

const DEFAULT_ADDR: &str = "127.0.0.1:0";

fn parse_arg_value(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn main() {
    logging::init();
    let args: Vec<String> = std::env::args().collect();

    let addr = parse_arg_value(&args, "--addr")
        .or_else(|| std::env::var("AMP_MOCK_ADDR").ok())
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());

    let addr_file = parse_arg_value(&args, "--addr-file").map(PathBuf::from);
    let run_for_ms = parse_arg_value(&args, "--run-for-ms")
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis);

    let initial: DeviceSettings = SettingsState::new().device_settings();
    let device = match MockDevice::spawn_with_addr(&addr, initial) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("mock_amp bind failed on {addr}: {e}");
            std::process::exit(1);
        }
    };

    if let Some(path) = &addr_file {
        let _ = fs::write(path, device.listen_addr().to_string());
    }

    println!("mock_amp listening on {}", device.listen_addr());

    let start = Instant::now();
    loop {
        while let Ok(line) = device.requests().try_recv() {
            println!("request: {}", line.trim_end());
        }
        thread::sleep(Duration::from_millis(33));
        if let Some(max) = run_for_ms {
            if start.elapsed() >= max {
                break;
            }
        }
    }

    device.shutdown();
}
