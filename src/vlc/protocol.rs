//! VLC rc interface text protocol.
//!
//! Commands are single lines. Replies carry no terminator or length, so a
//! reply is over once the player stays silent for a while; see
//! [`ResponseFramer`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

/// Prompt markers (`> `, possibly repeated) at the start of a line.
static PROMPT_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^(?:>\s+)+").expect("prompt regex"));

/// Track list entry, e.g. `| 2 - English - [English] *`.
static TRACK_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\| (\d+) - (.*)$").expect("track regex"));

/// Prefix of unsolicited notifications the player pushes between replies.
pub const STATUS_CHANGE_PREFIX: &str = "status change:";

/// Command line sent to the rc interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlcCommand(String);

impl VlcCommand {
  /// Arbitrary command text, sent verbatim.
  pub fn raw(text: impl Into<String>) -> Self {
    Self(text.into())
  }

  /// Harmless command used to check the connection works.
  pub fn help() -> Self {
    Self::raw("help")
  }

  /// Add a file to the playlist and play it.
  pub fn add(path: &str) -> Self {
    Self(format!("add {}", path))
  }

  pub fn is_playing() -> Self {
    Self::raw("is_playing")
  }

  /// Toggle pause.
  pub fn pause() -> Self {
    Self::raw("pause")
  }

  pub fn stop() -> Self {
    Self::raw("stop")
  }

  pub fn get_length() -> Self {
    Self::raw("get_length")
  }

  pub fn get_time() -> Self {
    Self::raw("get_time")
  }

  /// Seek to an absolute position.
  pub fn seek(position: PlayTime) -> Self {
    Self(format!("seek {}", position.0))
  }

  pub fn slower() -> Self {
    Self::raw("slower")
  }

  pub fn faster() -> Self {
    Self::raw("faster")
  }

  pub fn normal() -> Self {
    Self::raw("normal")
  }

  /// List audio tracks.
  pub fn audio_tracks() -> Self {
    Self::raw("atrack")
  }

  pub fn set_audio_track(index: i64) -> Self {
    Self(format!("atrack {}", index))
  }

  /// List subtitle tracks.
  pub fn subtitle_tracks() -> Self {
    Self::raw("strack")
  }

  pub fn set_subtitle_track(index: i64) -> Self {
    Self(format!("strack {}", index))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn into_string(self) -> String {
    self.0
  }
}

impl fmt::Display for VlcCommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Position or length in the player's own unit (whole seconds for VLC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayTime(pub i64);

impl fmt::Display for PlayTime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<i64> for PlayTime {
  fn from(value: i64) -> Self {
    PlayTime(value)
  }
}

/// Strip prompt markers and surrounding whitespace.
pub fn clean_line(raw: &str) -> String {
  PROMPT_RE.replace(raw.trim_start(), "").trim().to_string()
}

/// What a line read from the socket turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
  /// Part of the reply to the current command.
  Content(String),
  /// Unsolicited status notification.
  StatusChange,
}

pub fn classify_line(raw: &str) -> Line {
  let line = clean_line(raw);
  if line.starts_with(STATUS_CHANGE_PREFIX) {
    Line::StatusChange
  } else {
    Line::Content(line)
  }
}

/// Read deadlines used to detect the end of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadTimeouts {
  /// Wait for the first line of a reply.
  pub initial: Duration,
  /// Wait for each following line.
  pub follow_up: Duration,
}

impl Default for ReadTimeouts {
  fn default() -> Self {
    Self {
      initial: Duration::from_millis(500),
      follow_up: Duration::from_millis(200),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
  /// Nothing but status notifications seen so far.
  AwaitingFirstLine,
  /// The player has started answering.
  Draining,
}

/// Collects the lines of one reply and picks the deadline for the next read.
#[derive(Debug)]
pub struct ResponseFramer {
  timeouts: ReadTimeouts,
  state: FrameState,
  lines: Vec<String>,
}

impl ResponseFramer {
  pub fn new(timeouts: ReadTimeouts) -> Self {
    Self {
      timeouts,
      state: FrameState::AwaitingFirstLine,
      lines: Vec::new(),
    }
  }

  pub fn state(&self) -> FrameState {
    self.state
  }

  /// How long to wait for the next line before calling the reply complete.
  pub fn deadline(&self) -> Duration {
    match self.state {
      FrameState::AwaitingFirstLine => self.timeouts.initial,
      FrameState::Draining => self.timeouts.follow_up,
    }
  }

  /// Feed one raw line read from the socket.
  pub fn push(&mut self, raw: &str) {
    match classify_line(raw) {
      Line::StatusChange => {
        log::debug!("Skipping status notification: {}", raw.trim());
      }
      Line::Content(line) => {
        log::debug!("    {}", line);
        self.lines.push(line);
        self.state = FrameState::Draining;
      }
    }
  }

  pub fn finish(self) -> Vec<String> {
    self.lines
  }
}

/// One entry of an `atrack`/`strack` listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
  pub index: u32,
  pub title: String,
  pub is_active: bool,
}

impl Track {
  /// Parse a `| <index> - <title>` line; a trailing `*` marks the active track.
  pub fn parse(line: &str) -> Option<Self> {
    let caps = TRACK_RE.captures(line)?;
    let index = caps[1].parse().ok()?;
    let title = &caps[2];

    match title.strip_suffix('*') {
      Some(stripped) => Some(Self {
        index,
        title: stripped.trim().to_string(),
        is_active: true,
      }),
      None => Some(Self {
        index,
        title: title.to_string(),
        is_active: false,
      }),
    }
  }
}

/// Tracks of one kind, keyed by index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackList {
  pub tracks: BTreeMap<u32, String>,
  /// Index of the track marked active, if any.
  pub active: Option<u32>,
}

impl TrackList {
  /// Build from reply lines; lines that are not track entries are ignored.
  pub fn parse<S: AsRef<str>>(lines: &[S]) -> Self {
    let mut list = Self::default();
    for track in lines.iter().filter_map(|l| Track::parse(l.as_ref())) {
      if track.is_active {
        list.active = Some(track.index);
      }
      list.tracks.insert(track.index, track.title);
    }
    list
  }

  pub fn active_title(&self) -> Option<&str> {
    self
      .active
      .and_then(|i| self.tracks.get(&i))
      .map(String::as_str)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_command_text() {
    assert_eq!(VlcCommand::add("/media/sample.mkv").as_str(), "add /media/sample.mkv");
    assert_eq!(VlcCommand::seek(PlayTime(90)).as_str(), "seek 90");
    assert_eq!(VlcCommand::set_audio_track(2).as_str(), "atrack 2");
    assert_eq!(VlcCommand::set_subtitle_track(-1).as_str(), "strack -1");
    assert_eq!(VlcCommand::audio_tracks().to_string(), "atrack");
  }

  #[test]
  fn test_clean_line_strips_prompts() {
    assert_eq!(clean_line("> 600\r\n"), "600");
    assert_eq!(clean_line("> > > 1\n"), "1");
    assert_eq!(clean_line("  plain  "), "plain");
    assert_eq!(clean_line("> "), "");
    // Only leading markers are prompts
    assert_eq!(clean_line("| 1 - a > b"), "| 1 - a > b");
  }

  #[test]
  fn test_classify_status_change() {
    assert_eq!(
      classify_line("> status change: ( play state: 3 )\r\n"),
      Line::StatusChange
    );
    assert_eq!(classify_line("600"), Line::Content("600".to_string()));
  }

  #[test]
  fn test_framer_starts_awaiting() {
    let framer = ResponseFramer::new(ReadTimeouts::default());
    assert_eq!(framer.state(), FrameState::AwaitingFirstLine);
    assert_eq!(framer.deadline(), Duration::from_millis(500));
    assert!(framer.finish().is_empty());
  }

  #[test]
  fn test_framer_status_change_keeps_initial_deadline() {
    let mut framer = ResponseFramer::new(ReadTimeouts::default());
    framer.push("status change: ( new input: file:///a.mkv )\n");
    assert_eq!(framer.state(), FrameState::AwaitingFirstLine);
    assert_eq!(framer.deadline(), Duration::from_millis(500));
    assert!(framer.finish().is_empty());
  }

  #[test]
  fn test_framer_first_content_shrinks_deadline() {
    let mut framer = ResponseFramer::new(ReadTimeouts::default());
    framer.push("> 600\r\n");
    assert_eq!(framer.state(), FrameState::Draining);
    assert_eq!(framer.deadline(), Duration::from_millis(200));

    framer.push("status change: ( audio volume: 256 )\n");
    assert_eq!(framer.state(), FrameState::Draining);
    framer.push("done\n");
    assert_eq!(framer.finish(), vec!["600", "done"]);
  }

  #[test]
  fn test_track_active_marker() {
    let track = Track::parse("| 3 - English *").unwrap();
    assert_eq!(track.index, 3);
    assert_eq!(track.title, "English");
    assert!(track.is_active);

    let track = Track::parse("| 3 - English").unwrap();
    assert_eq!(track.index, 3);
    assert_eq!(track.title, "English");
    assert!(!track.is_active);

    assert!(Track::parse("+----[ Audio Track ]").is_none());
    assert!(Track::parse("| -1 - Disable").is_none());
  }

  #[test]
  fn test_track_list() {
    let lines = [
      "+----[ Audio Track ]",
      "| -1 - Disable",
      "| 1 - Track 1 - [English] *",
      "| 2 - Track 2 - [Japanese]",
      "+----[ end of Audio Track ]",
    ];
    let list = TrackList::parse(&lines);
    assert_eq!(list.tracks.len(), 2);
    assert_eq!(list.tracks[&2], "Track 2 - [Japanese]");
    assert_eq!(list.active, Some(1));
    assert_eq!(list.active_title(), Some("Track 1 - [English]"));
  }

  #[test]
  fn test_track_list_without_active() {
    let list = TrackList::parse(&["| 3 - English", "| 4 - French"]);
    assert_eq!(list.tracks.len(), 2);
    assert_eq!(list.active, None);
    assert_eq!(list.active_title(), None);
  }
}
