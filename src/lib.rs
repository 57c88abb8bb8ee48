//! Client library for driving a VLC media player through its rc
//! (remote-control) interface over a local TCP socket.
//!
//! ```no_run
//! use vlc_rc::{PlayerConfig, VlcClient};
//!
//! # async fn demo() -> Result<(), vlc_rc::VlcError> {
//! let player = VlcClient::new(PlayerConfig::default());
//! player.start().await?;
//! player.play("/media/sample.mkv").await?;
//! let length = player.length().await?;
//! log::info!("playing {} seconds", length);
//! player.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod vlc;

pub use config::{ConfigError, PlayerConfig, DEFAULT_TCP_PORT};
pub use vlc::*;
