//! VLC rc module - spawns and controls an external VLC player over its
//! line-oriented remote-control interface.
//!
//! Architecture:
//! - `process.rs` - VLC binary detection and process spawning
//! - `version.rs` - Banner parsing and per-version protocol dialects
//! - `protocol.rs` - Command text, line filtering, reply framing and track lists
//! - `rc.rs` - TCP connection and the task that owns it
//! - `envelope.rs` - Command queue with one-shot replies
//! - `client.rs` - High-level VLC client with command methods

mod client;
mod envelope;
mod process;
mod protocol;
mod rc;
mod version;

pub use client::{PlayerState, VlcClient, VlcError};
pub use envelope::{command_queue, CommandQueue, Envelope, Reply};
pub use process::{find_vlc, rc_args, spawn_vlc, ProcessError};
pub use protocol::{
  classify_line, clean_line, FrameState, Line, PlayTime, ReadTimeouts, ResponseFramer, Track,
  TrackList, VlcCommand, STATUS_CHANGE_PREFIX,
};
pub use rc::{RcConnection, RcError, TcpRcConnection};
pub use version::{Dialect, VersionCatalog};
