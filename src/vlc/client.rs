//! High-level VLC client with command methods.

use std::num::ParseIntError;
use std::process::{Child, ExitStatus};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use super::envelope::{command_queue, CommandQueue};
use super::process::{spawn_vlc, ProcessError};
use super::protocol::{PlayTime, TrackList, VlcCommand};
use super::rc::{RcError, TcpRcConnection};
use super::version::Dialect;
use crate::config::PlayerConfig;

#[derive(Error, Debug)]
pub enum VlcError {
  #[error("Process error: {0}")]
  Process(#[from] ProcessError),
  #[error("rc error: {0}")]
  Rc(#[from] RcError),
  #[error("Not connected")]
  NotConnected,
  #[error("Unexpected empty output of a '{command}' command")]
  EmptyOutput { command: String },
  #[error("Can't convert {output:?} from '{command}' to a number: {source}")]
  InvalidNumber {
    command: String,
    output: Vec<String>,
    source: ParseIntError,
  },
}

/// Snapshot of the player's state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerState {
  pub connected: bool,
  pub playing: bool,
  pub position: Option<PlayTime>,
  pub length: Option<PlayTime>,
}

/// Live rc session: the queue into the connection task and its dialect.
#[derive(Debug, Clone)]
struct Session {
  queue: CommandQueue,
  dialect: Dialect,
}

/// High-level VLC client.
#[derive(Clone)]
pub struct VlcClient {
  config: Arc<PlayerConfig>,
  process: Arc<Mutex<Option<Child>>>,
  session: Arc<Mutex<Option<Session>>>,
}

impl VlcClient {
  /// Create a new VLC client.
  pub fn new(config: PlayerConfig) -> Self {
    Self {
      config: Arc::new(config),
      process: Arc::new(Mutex::new(None)),
      session: Arc::new(Mutex::new(None)),
    }
  }

  pub fn config(&self) -> &PlayerConfig {
    &self.config
  }

  /// Launch VLC, give it time to open the rc socket, then connect.
  pub async fn start(&self) -> Result<(), VlcError> {
    let exe = self.config.actual_exe_path();
    let child = spawn_vlc(
      &exe,
      &self.config.host,
      self.config.actual_tcp_port(),
      &self.config.extra_args,
    )?;
    *self.process.lock() = Some(child);

    // Wait for VLC to open the rc socket
    tokio::time::sleep(self.config.startup_delay()).await;

    self.connect().await
  }

  /// Connect to an rc interface that is already listening.
  pub async fn connect(&self) -> Result<(), VlcError> {
    let conn = TcpRcConnection::open(&self.config.address(), self.config.read_timeouts()).await?;
    let dialect = conn.dialect().clone();

    let (queue, commands) = command_queue();
    tokio::spawn(conn.run(commands));

    *self.session.lock() = Some(Session { queue, dialect });

    log::info!("VLC client connected");
    Ok(())
  }

  /// Check if connected.
  pub fn is_connected(&self) -> bool {
    self
      .session
      .lock()
      .as_ref()
      .is_some_and(|s| !s.queue.is_closed())
  }

  /// Dialect resolved during the handshake.
  pub fn dialect(&self) -> Option<Dialect> {
    self.session.lock().as_ref().map(|s| s.dialect.clone())
  }

  fn get_session(&self) -> Result<Session, VlcError> {
    let guard = self.session.lock();
    guard.clone().ok_or(VlcError::NotConnected)
  }

  /// Send a command and wait for its reply lines.
  async fn send(&self, cmd: VlcCommand) -> Result<Vec<String>, VlcError> {
    let session = self.get_session()?;
    Ok(session.queue.submit(cmd.into_string()).await?)
  }

  /// End the rc session with the dialect's command, which also quits VLC.
  pub async fn shutdown(&self) -> Result<(), VlcError> {
    let session = self.get_session()?;
    let cmd = VlcCommand::raw(session.dialect.shutdown_command.clone());
    log::info!("Shutting down VLC with '{}'", cmd);

    let result = session.queue.submit(cmd.into_string()).await;
    self.session.lock().take();

    if let Some(mut child) = self.process.lock().take() {
      match child.try_wait() {
        Ok(Some(status)) => log::info!("VLC process exited with: {}", status),
        Ok(None) => log::debug!("VLC process (pid: {}) still exiting", child.id()),
        Err(e) => log::warn!("try_wait() failed: {}", e),
      }
    }

    result?;
    Ok(())
  }

  /// Tear down a player that no longer answers on the rc socket: drop the
  /// session, kill VLC unless it already quit, and reap it.
  ///
  /// Returns the exit status, or `None` if this client never launched VLC.
  pub async fn stop_process(&self) -> Option<ExitStatus> {
    if let Some(session) = self.session.lock().take() {
      session.queue.close();
    }

    let mut child = self.process.lock().take()?;
    let pid = child.id();

    let reaped = tokio::task::spawn_blocking(move || -> std::io::Result<ExitStatus> {
      if let Some(status) = child.try_wait()? {
        return Ok(status);
      }
      log::info!("Killing unresponsive VLC (pid: {})", pid);
      child.kill()?;
      child.wait()
    })
    .await;

    match reaped {
      Ok(Ok(status)) => {
        log::info!("VLC (pid: {}) stopped with: {}", pid, status);
        Some(status)
      }
      Ok(Err(e)) => {
        log::error!("Could not stop VLC (pid: {}): {}", pid, e);
        None
      }
      Err(e) => {
        log::error!("Reaping VLC (pid: {}) panicked: {}", pid, e);
        None
      }
    }
  }

  /// Add a file to the playlist and start playing it.
  pub async fn play(&self, path: &str) -> Result<(), VlcError> {
    log::info!("Playing: {}", path);
    self.send(VlcCommand::add(path)).await?;
    Ok(())
  }

  pub async fn is_playing(&self) -> Result<bool, VlcError> {
    let output = self.send(VlcCommand::is_playing()).await?;
    Ok(output.first().is_some_and(|line| line == "1"))
  }

  /// Toggle pause.
  pub async fn pause(&self) -> Result<(), VlcError> {
    self.send(VlcCommand::pause()).await?;
    Ok(())
  }

  pub async fn stop(&self) -> Result<(), VlcError> {
    self.send(VlcCommand::stop()).await?;
    Ok(())
  }

  /// Length of the current item. Always known once something plays.
  pub async fn length(&self) -> Result<PlayTime, VlcError> {
    let cmd = VlcCommand::get_length();
    let output = self.send(cmd.clone()).await?;
    parse_time(&cmd, output)?.ok_or(VlcError::EmptyOutput {
      command: cmd.into_string(),
    })
  }

  /// Current position, `None` before playback has started.
  pub async fn position(&self) -> Result<Option<PlayTime>, VlcError> {
    let cmd = VlcCommand::get_time();
    let output = self.send(cmd.clone()).await?;
    parse_time(&cmd, output)
  }

  /// Seek to an absolute position.
  pub async fn seek(&self, position: PlayTime) -> Result<(), VlcError> {
    self.send(VlcCommand::seek(position)).await?;
    Ok(())
  }

  pub async fn speed_slower(&self) -> Result<(), VlcError> {
    self.send(VlcCommand::slower()).await?;
    Ok(())
  }

  pub async fn speed_faster(&self) -> Result<(), VlcError> {
    self.send(VlcCommand::faster()).await?;
    Ok(())
  }

  pub async fn speed_normal(&self) -> Result<(), VlcError> {
    self.send(VlcCommand::normal()).await?;
    Ok(())
  }

  pub async fn audio_tracks(&self) -> Result<TrackList, VlcError> {
    self.tracks(VlcCommand::audio_tracks()).await
  }

  /// Select an audio track; `-1` disables audio.
  pub async fn set_audio_track(&self, index: i64) -> Result<(), VlcError> {
    self.send(VlcCommand::set_audio_track(index)).await?;
    Ok(())
  }

  pub async fn subtitle_tracks(&self) -> Result<TrackList, VlcError> {
    self.tracks(VlcCommand::subtitle_tracks()).await
  }

  /// Select a subtitle track; `-1` disables subtitles.
  pub async fn set_subtitle_track(&self, index: i64) -> Result<(), VlcError> {
    self.send(VlcCommand::set_subtitle_track(index)).await?;
    Ok(())
  }

  async fn tracks(&self, cmd: VlcCommand) -> Result<TrackList, VlcError> {
    let output = self.send(cmd.clone()).await?;
    // The player always lists at least the "Disable" entry
    if output.is_empty() {
      return Err(VlcError::EmptyOutput {
        command: cmd.into_string(),
      });
    }
    Ok(TrackList::parse(&output))
  }

  /// Query everything a status display needs.
  pub async fn state(&self) -> Result<PlayerState, VlcError> {
    if !self.is_connected() {
      return Ok(PlayerState::default());
    }

    let playing = self.is_playing().await?;
    let position = self.position().await?;
    let length = match self.length().await {
      Ok(length) => Some(length),
      Err(VlcError::EmptyOutput { .. }) | Err(VlcError::InvalidNumber { .. }) => None,
      Err(e) => return Err(e),
    };

    Ok(PlayerState {
      connected: true,
      playing,
      position,
      length,
    })
  }
}

/// First reply line as a time value; `None` when the reply was empty.
fn parse_time(cmd: &VlcCommand, output: Vec<String>) -> Result<Option<PlayTime>, VlcError> {
  let Some(first) = output.first() else {
    return Ok(None);
  };

  match first.parse::<i64>() {
    Ok(value) => Ok(Some(PlayTime(value))),
    Err(source) => Err(VlcError::InvalidNumber {
      command: cmd.to_string(),
      output,
      source,
    }),
  }
}
