//! VLC executable detection and process spawning.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use thiserror::Error;

#[cfg(windows)]
const DEFAULT_VLC_PATH: &str = r"C:\Program Files (x86)\VideoLAN\VLC\vlc.exe";
#[cfg(not(windows))]
const DEFAULT_VLC_PATH: &str = "vlc";

#[derive(Error, Debug)]
pub enum ProcessError {
  #[error("Failed to spawn VLC: {0}")]
  SpawnFailed(#[from] std::io::Error),
}

/// Find the VLC executable, falling back to the platform's usual location.
pub fn find_vlc() -> PathBuf {
  // Check PATH first
  if let Ok(path) = which::which("vlc") {
    return path;
  }

  PathBuf::from(DEFAULT_VLC_PATH)
}

/// Flags that enable the remote-control interface on `host:port`.
pub fn rc_args(host: &str, port: u16) -> Vec<String> {
  let mut args = vec![
    "--extraintf=rc".to_string(),
    format!("--rc-host={}:{}", host, port),
    "--one-instance".to_string(),
  ];

  if cfg!(windows) {
    args.push("--rc-quiet".to_string());
  }

  args
}

/// Spawn VLC with the remote-control interface enabled.
pub fn spawn_vlc(
  exe: &Path,
  host: &str,
  port: u16,
  extra_args: &[String],
) -> Result<Child, ProcessError> {
  log::info!("Spawning VLC: {:?} with rc on {}:{}", exe, host, port);
  if !extra_args.is_empty() {
    log::info!("Extra VLC args: {:?}", extra_args);
  }

  let child = Command::new(exe)
    .args(rc_args(host, port))
    .args(extra_args)
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .spawn()?;

  Ok(child)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_rc_args_bind_control_socket() {
    let args = rc_args("localhost", 2019);
    assert_eq!(args[0], "--extraintf=rc");
    assert_eq!(args[1], "--rc-host=localhost:2019");
    assert_eq!(args[2], "--one-instance");
    assert_eq!(args.contains(&"--rc-quiet".to_string()), cfg!(windows));
  }

  #[test]
  fn test_spawn_missing_executable_fails() {
    let result = spawn_vlc(Path::new("/nonexistent/vlc-binary"), "localhost", 2019, &[]);
    assert!(matches!(result, Err(ProcessError::SpawnFailed(_))));
  }
}
