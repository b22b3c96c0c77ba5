//! ydotool-based keystroke injection
//!
//! Uses ydotool to simulate keyboard input. This works on all Wayland
//! compositors (and X11, and the TTY the game actually runs on) because
//! ydotool uses the uinput kernel interface.
//!
//! Requires:
//! - ydotool installed
//! - ydotoold daemon running (systemctl --user start ydotool)
//! - User in 'input' group

use super::KeyOutput;
use crate::error::InjectError;
use std::process::Stdio;
use tokio::process::Command;

/// Linux input keycode for a preset key name. ydotool's `key` subcommand
/// takes raw keycodes, not names.
fn key_code(name: &str) -> Result<u16, InjectError> {
    match name.to_ascii_lowercase().as_str() {
        "enter" | "return" => Ok(28), // KEY_ENTER
        "tab" => Ok(15),              // KEY_TAB
        "space" => Ok(57),            // KEY_SPACE
        "escape" | "esc" => Ok(1),    // KEY_ESC
        _ => Err(InjectError::UnknownKey(name.to_string())),
    }
}

/// ydotool-based keystroke output
pub struct YdotoolOutput;

impl YdotoolOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Default for YdotoolOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl KeyOutput for YdotoolOutput {
    async fn press_key(&self, key: &str) -> Result<(), InjectError> {
        let code = key_code(key)?;

        // ydotool key takes <code>:1 (down) and <code>:0 (up) pairs
        let output = Command::new("ydotool")
            .args(["key", &format!("{}:1", code), &format!("{}:0", code)])
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    InjectError::YdotoolNotFound
                } else {
                    InjectError::KeyFailed(e.to_string())
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("socket") || stderr.contains("connect") || stderr.contains("daemon")
            {
                return Err(InjectError::YdotoolNotRunning);
            }
            return Err(InjectError::KeyFailed(stderr.to_string()));
        }

        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), InjectError> {
        if text.is_empty() {
            return Ok(());
        }

        // The -- ensures text starting with - isn't treated as an option
        let output = Command::new("ydotool")
            .args(["type", "--", text])
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    InjectError::YdotoolNotFound
                } else {
                    InjectError::TypeFailed(e.to_string())
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("socket") || stderr.contains("connect") || stderr.contains("daemon")
            {
                return Err(InjectError::YdotoolNotRunning);
            }
            return Err(InjectError::TypeFailed(stderr.to_string()));
        }

        Ok(())
    }

    async fn is_available(&self) -> bool {
        // Check if ydotool exists in PATH
        let which_result = Command::new("which")
            .arg("ydotool")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        if !which_result.map(|s| s.success()).unwrap_or(false) {
            return false;
        }

        // Check if ydotoold is running by trying a no-op
        // ydotool type "" should succeed quickly if daemon is running
        Command::new("ydotool")
            .args(["type", ""])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "ydotool"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_codes() {
        assert_eq!(key_code("enter").unwrap(), 28);
        assert_eq!(key_code("Enter").unwrap(), 28);
        assert_eq!(key_code("tab").unwrap(), 15);
        assert_eq!(key_code("escape").unwrap(), 1);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            key_code("hyperspace"),
            Err(InjectError::UnknownKey(_))
        ));
    }
}
