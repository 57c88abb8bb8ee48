//! Hands commands to the connection task and carries back the one reply.

use async_channel::{Receiver, Sender};
use tokio::sync::oneshot;

use super::rc::RcError;

/// Result of one command: the reply lines, or why there are none.
pub type Reply = Result<Vec<String>, RcError>;

/// A command waiting to be sent, paired with its reply slot.
#[derive(Debug)]
pub struct Envelope {
  text: String,
  reply: oneshot::Sender<Reply>,
}

impl Envelope {
  pub fn new(text: impl Into<String>) -> (Self, oneshot::Receiver<Reply>) {
    let (reply, rx) = oneshot::channel();
    (
      Self {
        text: text.into(),
        reply,
      },
      rx,
    )
  }

  pub fn text(&self) -> &str {
    &self.text
  }

  /// Deliver the reply. Consumes the envelope, so it happens at most once.
  pub fn reply(self, result: Reply) {
    if self.reply.send(result).is_err() {
      log::debug!("Caller stopped waiting for reply to '{}'", self.text);
    }
  }
}

/// Create the shared command queue and its single consuming end.
pub fn command_queue() -> (CommandQueue, Receiver<Envelope>) {
  let (tx, rx) = async_channel::unbounded();
  (CommandQueue { tx }, rx)
}

/// Producer side of the command queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CommandQueue {
  tx: Sender<Envelope>,
}

impl CommandQueue {
  /// Queue `text` and wait for its reply.
  pub async fn submit(&self, text: impl Into<String>) -> Reply {
    let (envelope, rx) = Envelope::new(text);

    self
      .tx
      .send(envelope)
      .await
      .map_err(|_| RcError::Disconnected)?;

    rx.await.map_err(|_| RcError::Disconnected)?
  }

  /// Stop accepting commands. The connection task exits once it drains.
  pub fn close(&self) {
    self.tx.close();
  }

  pub fn is_closed(&self) -> bool {
    self.tx.is_closed()
  }
}
