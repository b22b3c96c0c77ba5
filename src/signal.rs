//! On-disk signaling between the combo detector and the daemon
//!
//! The two processes share no memory and no sockets; the whole protocol is
//! one byte in a file plus a PID file for liveness probing. The detector is
//! the only writer of both; the daemon is the only reader.
//!
//! A missing signal file reads as "not active", so a crashed detector can
//! never leave the daemon stuck recording.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

/// The single-byte combo signal file. Contains exactly "1" while the combo
/// is held and "0" otherwise.
#[derive(Debug, Clone)]
pub struct SignalFile {
    path: PathBuf,
}

impl SignalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current combo state. The content is a single byte, so a
    /// whole-file rewrite is atomic enough for the one concurrent reader.
    pub fn set(&self, active: bool) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, if active { "1" } else { "0" })
    }

    /// Read the current combo state. Absence of the file means "0".
    pub fn read(&self) -> bool {
        match fs::read_to_string(&self.path) {
            Ok(contents) => contents.trim() == "1",
            Err(_) => false,
        }
    }

    /// Remove the signal file so no stale "1" outlives the writer.
    pub fn clear(&self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                tracing::warn!("Failed to remove signal file: {}", e);
            }
        }
    }
}

/// A PID file: decimal process id as text. Used to force-kill a previous
/// detector on relaunch and to probe whether the current one is alive.
#[derive(Debug, Clone)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the calling process's PID.
    pub fn write_self(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, std::process::id().to_string())
    }

    /// Read the recorded PID, if the file exists and parses.
    pub fn read(&self) -> Option<i32> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }

    /// Probe whether the recorded process is still alive (signal 0).
    pub fn is_alive(&self) -> bool {
        match self.read() {
            Some(pid) => kill(Pid::from_raw(pid), None).is_ok(),
            None => false,
        }
    }

    /// Best-effort SIGKILL of the recorded process.
    pub fn kill_recorded(&self) {
        if let Some(pid) = self.read() {
            if kill(Pid::from_raw(pid), Signal::SIGKILL).is_ok() {
                tracing::info!("Killed old process {}", pid);
            }
        }
    }

    pub fn remove(&self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                tracing::warn!("Failed to remove PID file: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_absent_reads_inactive() {
        let dir = tempfile::tempdir().unwrap();
        let signal = SignalFile::new(dir.path().join("combo"));
        assert!(!signal.read());
    }

    #[test]
    fn test_signal_set_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let signal = SignalFile::new(dir.path().join("combo"));

        signal.set(true).unwrap();
        assert!(signal.read());

        signal.set(false).unwrap();
        assert!(!signal.read());
    }

    #[test]
    fn test_signal_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let signal = SignalFile::new(dir.path().join("combo"));

        signal.set(true).unwrap();
        signal.clear();
        assert!(!signal.path().exists());
        assert!(!signal.read());
    }

    #[test]
    fn test_signal_garbage_reads_inactive() {
        let dir = tempfile::tempdir().unwrap();
        let signal = SignalFile::new(dir.path().join("combo"));
        std::fs::write(signal.path(), "banana").unwrap();
        assert!(!signal.read());
    }

    #[test]
    fn test_pid_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = PidFile::new(dir.path().join("listener.pid"));

        assert_eq!(pid_file.read(), None);
        assert!(!pid_file.is_alive());

        pid_file.write_self().unwrap();
        assert_eq!(pid_file.read(), Some(std::process::id() as i32));
        // We are, presumably, alive
        assert!(pid_file.is_alive());

        pid_file.remove();
        assert_eq!(pid_file.read(), None);
    }

    #[test]
    fn test_pid_file_dead_process_not_alive() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = PidFile::new(dir.path().join("listener.pid"));
        // PID 0 is never a valid child; kill(0, ..) targets the process
        // group, so use an implausibly large PID instead.
        std::fs::write(pid_file.path(), "999999999").unwrap();
        assert!(!pid_file.is_alive());
    }
}
