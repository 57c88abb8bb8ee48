//! TCP connection to VLC's remote-control (rc) interface.
//!
//! After the handshake the connection is moved into [`RcConnection::run`],
//! which becomes the only reader and writer of the socket. Callers reach it
//! through the command queue in [`super::envelope`].

use async_channel::Receiver;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use super::envelope::Envelope;
use super::protocol::{ReadTimeouts, ResponseFramer, VlcCommand};
use super::version::{Dialect, VersionCatalog};

#[derive(Error, Debug)]
pub enum RcError {
  #[error("Connection failed: {0}")]
  ConnectionFailed(std::io::Error),
  #[error("Write failed: {0}")]
  WriteFailed(std::io::Error),
  #[error("Command contains a line break: {0:?}")]
  InvalidCommand(String),
  #[error("Disconnected")]
  Disconnected,
}

/// rc connection over a TCP socket.
pub type TcpRcConnection = RcConnection<BufReader<OwnedReadHalf>, OwnedWriteHalf>;

/// Connection to the rc interface.
pub struct RcConnection<R, W> {
  reader: R,
  writer: W,
  timeouts: ReadTimeouts,
  dialect: Dialect,
}

impl TcpRcConnection {
  /// Dial the rc socket at `addr` and perform the handshake.
  pub async fn open(addr: &str, timeouts: ReadTimeouts) -> Result<Self, RcError> {
    log::info!("Connecting to VLC rc interface at {}", addr);

    let stream = TcpStream::connect(addr)
      .await
      .map_err(RcError::ConnectionFailed)?;
    let (reader, writer) = stream.into_split();

    Self::handshake(BufReader::new(reader), writer, timeouts).await
  }
}

impl<R, W> RcConnection<R, W>
where
  R: AsyncBufRead + Unpin,
  W: AsyncWrite + Unpin,
{
  /// Wrap an unverified stream. Speaks the legacy dialect until a handshake.
  pub fn new(reader: R, writer: W, timeouts: ReadTimeouts) -> Self {
    Self {
      reader,
      writer,
      timeouts,
      dialect: VersionCatalog::default().fallback().clone(),
    }
  }

  /// Send a harmless command and pick the dialect from the banner in the reply.
  pub async fn handshake(reader: R, writer: W, timeouts: ReadTimeouts) -> Result<Self, RcError> {
    let mut conn = Self::new(reader, writer, timeouts);

    let output = conn.exec(VlcCommand::help().as_str()).await?;
    conn.dialect = VersionCatalog::default().detect(&output).clone();

    log::info!(
      "VLC rc handshake done ({} lines), dialect {} ends sessions with '{}'",
      output.len(),
      conn.dialect.version,
      conn.dialect.shutdown_command
    );
    Ok(conn)
  }

  pub fn dialect(&self) -> &Dialect {
    &self.dialect
  }

  pub fn shutdown_command(&self) -> &str {
    &self.dialect.shutdown_command
  }

  /// Send one command and collect its reply.
  ///
  /// The reply ends when the player goes quiet: the first line may take up
  /// to `timeouts.initial`, every later one `timeouts.follow_up`. Running
  /// into a deadline, EOF or a read error ends the reply and is not an
  /// error. Only a failed write is, or a command that would span lines.
  pub async fn exec(&mut self, command: &str) -> Result<Vec<String>, RcError> {
    // A line break would smuggle a second command onto the wire
    if command.contains(['\n', '\r']) {
      log::warn!("Refusing multi-line command: {:?}", command);
      return Err(RcError::InvalidCommand(command.to_string()));
    }

    log::debug!("CMD: {}", command);

    let mut data = Vec::with_capacity(command.len() + 1);
    data.extend_from_slice(command.as_bytes());
    data.push(b'\n');
    self
      .writer
      .write_all(&data)
      .await
      .map_err(RcError::WriteFailed)?;
    self.writer.flush().await.map_err(RcError::WriteFailed)?;

    let mut framer = ResponseFramer::new(self.timeouts);
    let mut buf = Vec::new();

    loop {
      // Partial bytes left by a timed-out read are dropped here
      buf.clear();

      let read = tokio::time::timeout(framer.deadline(), self.reader.read_until(b'\n', &mut buf));
      match read.await {
        Err(_) => break,
        Ok(Ok(0)) => {
          log::debug!("VLC rc connection closed by player");
          break;
        }
        Ok(Ok(_)) => framer.push(&String::from_utf8_lossy(&buf)),
        Ok(Err(e)) => {
          log::warn!("VLC rc read error: {}", e);
          break;
        }
      }
    }

    Ok(framer.finish())
  }

  /// Serve queued commands in order until the session-ending command has
  /// been answered or the queue is closed, then close the socket.
  pub async fn run(mut self, commands: Receiver<Envelope>) {
    log::info!("VLC rc loop started");

    while let Ok(envelope) = commands.recv().await {
      let result = self.exec(envelope.text()).await;
      let is_shutdown = envelope.text() == self.dialect.shutdown_command;
      envelope.reply(result);

      if is_shutdown {
        log::info!("VLC rc session ended by '{}'", self.dialect.shutdown_command);
        break;
      }
    }

    commands.close();
    while let Ok(envelope) = commands.try_recv() {
      log::warn!("Dropping command queued after shutdown: {}", envelope.text());
      envelope.reply(Err(RcError::Disconnected));
    }

    if let Err(e) = self.writer.shutdown().await {
      log::debug!("VLC rc socket shutdown: {}", e);
    }
    log::info!("VLC rc loop stopped");
  }
}
