//! evdev-based combo listener
//!
//! Runs as its own process (`padtalk listen`) so a wedged or crashed
//! input loop can be killed and relaunched by the daemon without
//! touching the recording pipeline. The only outputs are the signal
//! file (combo state) and the PID file (liveness).
//!
//! The user must be in the 'input' group to access /dev/input/* devices.

use super::{resolve_combo, ComboEdge, ComboTracker, RawEvent};
use crate::config::{ComboConfig, Config};
use crate::error::{ComboError, PadtalkError};
use crate::signal::{PidFile, SignalFile};
use evdev::{Device, InputEventKind};
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::oneshot;

/// The combo detector process: one gamepad, one tracker, one signal file.
pub struct ComboListener {
    config: ComboConfig,
    device_path: PathBuf,
    signal: SignalFile,
    pid_file: PidFile,
}

impl ComboListener {
    /// Resolve the combo and locate the gamepad. Both failures here are
    /// fatal: the process exits and the daemon reports the launch failure.
    pub fn new(config: &ComboConfig) -> Result<Self, ComboError> {
        // Validate the combo before touching any device
        resolve_combo(&config.buttons)?;

        let device_path = find_gamepad(&config.device_match)?;

        Ok(Self {
            config: config.clone(),
            device_path,
            signal: SignalFile::new(Config::signal_path()),
            pid_file: PidFile::new(Config::listener_pid_path()),
        })
    }

    /// Run the listener until the device dies or a termination signal
    /// arrives. Always removes the signal and PID files on the way out so
    /// a stale "1" cannot be misread by a future daemon.
    pub async fn run(self) -> Result<(), PadtalkError> {
        let combo_desc = self.config.buttons.join("+");

        self.pid_file
            .write_self()
            .map_err(PadtalkError::Io)?;
        self.signal.set(false).map_err(PadtalkError::Io)?;

        tracing::info!(
            "Combo listener started (pid {}), combo: {}",
            std::process::id(),
            combo_desc
        );

        let (stop_tx, stop_rx) = oneshot::channel();
        let tracker = ComboTracker::new(
            resolve_combo(&self.config.buttons).map_err(PadtalkError::Combo)?,
        );
        let device_path = self.device_path.clone();
        let signal_file = self.signal.clone();

        let mut loop_handle = tokio::task::spawn_blocking(move || {
            listener_loop(device_path, tracker, signal_file, stop_rx)
        });

        let mut sigterm = signal(SignalKind::terminate())
            .map_err(|e| PadtalkError::Config(format!("Failed to set up SIGTERM handler: {}", e)))?;

        let result = tokio::select! {
            joined = &mut loop_handle => match joined {
                Ok(loop_result) => loop_result.map_err(PadtalkError::Combo),
                Err(e) => Err(PadtalkError::Config(format!("Listener task panicked: {}", e))),
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received SIGINT, shutting down");
                let _ = stop_tx.send(());
                let _ = (&mut loop_handle).await;
                Ok(())
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, shutting down");
                let _ = stop_tx.send(());
                let _ = (&mut loop_handle).await;
                Ok(())
            }
        };

        self.signal.clear();
        self.pid_file.remove();

        result
    }
}

/// Main listener loop running in a blocking task
fn listener_loop(
    device_path: PathBuf,
    mut tracker: ComboTracker,
    signal_file: SignalFile,
    mut stop_rx: oneshot::Receiver<()>,
) -> Result<(), ComboError> {
    let mut device = Device::open(&device_path)
        .map_err(|_| ComboError::DeviceAccess(device_path.display().to_string()))?;

    // Non-blocking so fetch_events returns immediately when idle and the
    // stop signal is noticed within one sleep interval
    let fd = device.as_raw_fd();
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL);
        if flags != -1 {
            libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
        }
    }

    tracing::info!(
        "Listening on {:?} ({})",
        device_path,
        device.name().unwrap_or("unknown")
    );

    loop {
        match stop_rx.try_recv() {
            Ok(_) | Err(oneshot::error::TryRecvError::Closed) => {
                tracing::debug!("Combo listener stopping");
                return Ok(());
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
        }

        match device.fetch_events() {
            Ok(events) => {
                for event in events {
                    let raw = match event.kind() {
                        InputEventKind::Key(key) => RawEvent::Key {
                            code: key.code(),
                            down: event.value() != 0,
                        },
                        InputEventKind::AbsAxis(axis) => RawEvent::Axis {
                            code: axis.0,
                            value: event.value(),
                        },
                        _ => continue,
                    };

                    if let Some(edge) = tracker.handle(raw) {
                        let active = edge == ComboEdge::Pressed;
                        tracing::info!(
                            "Combo {}",
                            if active { "pressed" } else { "released" }
                        );
                        if let Err(e) = signal_file.set(active) {
                            tracing::warn!("Failed to write signal file: {}", e);
                        }
                    }
                }
            }
            Err(e) if e.raw_os_error() == Some(libc::EAGAIN) => {
                // No events pending
            }
            Err(e) => {
                // Device unplugged or revoked; exit so the daemon relaunches us
                return Err(ComboError::Evdev(format!(
                    "{:?}: {}",
                    device_path, e
                )));
            }
        }

        // Small sleep to avoid busy-waiting
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
}

/// Find the gamepad device by name substring match
fn find_gamepad(device_match: &[String]) -> Result<PathBuf, ComboError> {
    let mut available = Vec::new();

    let input_dir = std::fs::read_dir("/dev/input")
        .map_err(|e| ComboError::DeviceAccess(format!("/dev/input: {}", e)))?;

    for entry in input_dir {
        let entry = entry.map_err(|e| ComboError::DeviceAccess(e.to_string()))?;
        let path = entry.path();

        let is_event_device = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("event"))
            .unwrap_or(false);

        if !is_event_device {
            continue;
        }

        match Device::open(&path) {
            Ok(device) => {
                let name = device.name().unwrap_or("unknown").to_string();
                if device_match.iter().any(|m| name.contains(m.as_str())) {
                    tracing::debug!("Found gamepad: {:?} ({})", path, name);
                    return Ok(path);
                }
                available.push(format!("{}: {}", path.display(), name));
            }
            Err(e) => {
                // Permission denied is common for non-input-group users
                if e.kind() == std::io::ErrorKind::PermissionDenied {
                    return Err(ComboError::DeviceAccess(path.display().to_string()));
                }
                tracing::trace!("Skipping {:?}: {}", path, e);
            }
        }
    }

    if !available.is_empty() {
        tracing::error!("No gamepad matched. Available devices:");
        for line in &available {
            tracing::error!("  {}", line);
        }
    }

    Err(ComboError::NoGamepad)
}
