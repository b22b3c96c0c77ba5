//! Detector supervision and signal polling
//!
//! The bridge owns the `padtalk listen` child process: it launches it,
//! probes it on a coarse schedule, and relaunches it whenever it dies
//! (controller unplugged, Steam input grabbing the device, a crash).
//! Retries are unbounded and unthrottled; a dead detector costs one
//! health-check period of deafness, nothing more.
//!
//! Between health checks it polls the signal file and turns value changes
//! into session edges. Level polling means two full flips inside one poll
//! interval cancel out unseen; at 50 ms against human button presses that
//! window is accepted rather than engineered away.

use crate::config::{BridgeConfig, Config};
use crate::error::BridgeError;
use crate::session::ChatSession;
use crate::signal::{PidFile, SignalFile};
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::{Child, Command};

/// Rising/falling edge detection over the polled signal value
#[derive(Debug, Default)]
struct EdgeWatcher {
    last: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalEdge {
    Rising,
    Falling,
}

impl EdgeWatcher {
    /// Compare the freshly read value against the last observed one
    fn observe(&mut self, current: bool) -> Option<SignalEdge> {
        let edge = match (self.last, current) {
            (false, true) => Some(SignalEdge::Rising),
            (true, false) => Some(SignalEdge::Falling),
            _ => None,
        };
        self.last = current;
        edge
    }
}

/// Launches, health-checks, and restarts the combo detector, and
/// translates its signal into session transitions.
pub struct Bridge {
    config: BridgeConfig,
    /// Combo listening toggle; when false, poll() does nothing
    enabled: bool,
    /// Passed through to the spawned detector
    config_path: Option<PathBuf>,
    signal: SignalFile,
    listener_pid: PidFile,
    child: Option<Child>,
    watcher: EdgeWatcher,
    ticks_since_health_check: u32,
}

impl Bridge {
    pub fn new(config: BridgeConfig, enabled: bool, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            enabled,
            config_path,
            signal: SignalFile::new(Config::signal_path()),
            listener_pid: PidFile::new(Config::listener_pid_path()),
            child: None,
            watcher: EdgeWatcher::default(),
            ticks_since_health_check: 0,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.config.poll_interval_ms)
    }

    /// Start (or restart) the detector process.
    ///
    /// Any previous detector is force-killed first, via our child handle
    /// and via the PID file in case one survived a previous daemon. Stale
    /// signal files are cleared so the first read cannot see a dead "1".
    pub async fn launch(&mut self) -> Result<(), BridgeError> {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill().await;
        }
        self.listener_pid.kill_recorded();
        self.signal.clear();
        self.listener_pid.remove();

        let exe = std::env::current_exe()
            .map_err(|e| BridgeError::SpawnFailed(format!("current_exe: {}", e)))?;

        let mut command = Command::new(exe);
        command.arg("listen");
        if let Some(ref path) = self.config_path {
            command.arg("--config").arg(path);
        }
        command.kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|e| BridgeError::SpawnFailed(e.to_string()))?;

        tracing::info!(
            "Started combo detector (pid {})",
            child.id().unwrap_or_default()
        );

        // Give it a moment; an immediate exit means a bad combo config or
        // no gamepad, which relaunching will not fix by itself
        tokio::time::sleep(Duration::from_millis(self.config.launch_grace_ms)).await;

        match child.try_wait() {
            Ok(Some(status)) => Err(BridgeError::LaunchFailed(format!(" ({})", status))),
            Ok(None) => {
                self.child = Some(child);
                Ok(())
            }
            Err(e) => Err(BridgeError::SpawnFailed(e.to_string())),
        }
    }

    /// One poll iteration: deliver signal edges to the session, and every
    /// `health_check_ticks` iterations make sure the detector is alive.
    pub async fn poll(&mut self, session: &ChatSession) {
        if !self.enabled {
            return;
        }

        match self.watcher.observe(self.signal.read()) {
            Some(SignalEdge::Rising) => session.combo_pressed().await,
            Some(SignalEdge::Falling) => session.combo_released().await,
            None => {}
        }

        self.ticks_since_health_check += 1;
        if self.ticks_since_health_check >= self.config.health_check_ticks {
            self.ticks_since_health_check = 0;
            self.check_health().await;
        }
    }

    async fn check_health(&mut self) {
        let alive = match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        };

        if !alive {
            tracing::warn!("Combo detector died, restarting...");
            if let Err(e) = self.launch().await {
                tracing::error!("Failed to relaunch combo detector: {}", e);
            }
        }
    }

    /// Kill the detector and remove its runtime files. The detector
    /// removes them itself on a clean exit; this is the belt to that
    /// suspenders for the SIGKILL path.
    pub async fn shutdown(&mut self) {
        self.enabled = false;

        if let Some(mut child) = self.child.take() {
            let _ = child.kill().await;
            let _ = child.wait().await;
        }
        self.listener_pid.kill_recorded();

        self.signal.clear();
        self.listener_pid.remove();

        tracing::info!("Bridge shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_only_on_changes() {
        let mut watcher = EdgeWatcher::default();

        assert_eq!(watcher.observe(false), None);
        assert_eq!(watcher.observe(true), Some(SignalEdge::Rising));
        assert_eq!(watcher.observe(true), None);
        assert_eq!(watcher.observe(false), Some(SignalEdge::Falling));
        assert_eq!(watcher.observe(false), None);
    }

    #[test]
    fn test_initial_high_signal_is_a_rising_edge() {
        // A stale "1" from before our launch reads as an ordinary press;
        // launch() clearing the file makes this unreachable in practice,
        // but the watcher itself stays consistent either way
        let mut watcher = EdgeWatcher::default();
        assert_eq!(watcher.observe(true), Some(SignalEdge::Rising));
    }
}
