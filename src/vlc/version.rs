//! Player version detection and protocol dialects.
//!
//! The rc interface changed its session-ending command between releases, so
//! the banner VLC prints on connect is matched against a small catalog.

use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

/// Banner line printed by the rc interface, e.g. `VLC media player 3.0.20 Vetinari`.
static BANNER_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"VLC media player (\d+\.\d+\.\d+)").expect("banner regex"));

/// Protocol dialect spoken by players from `version` onwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
  pub version: Version,
  /// Command that ends the rc session.
  pub shutdown_command: String,
}

impl Dialect {
  fn new(version: Version, shutdown_command: &str) -> Self {
    Self {
      version,
      shutdown_command: shutdown_command.to_string(),
    }
  }
}

/// Known dialects, newest first. Never empty.
#[derive(Debug, Clone)]
pub struct VersionCatalog {
  dialects: Vec<Dialect>,
}

impl Default for VersionCatalog {
  fn default() -> Self {
    Self::from_dialects(vec![
      Dialect::new(Version::new(0, 0, 0), "quit"),
      Dialect::new(Version::new(4, 0, 0), "shutdown"),
    ])
  }
}

impl VersionCatalog {
  fn from_dialects(mut dialects: Vec<Dialect>) -> Self {
    debug_assert!(!dialects.is_empty());
    dialects.sort_by(|a, b| b.version.cmp(&a.version));
    Self { dialects }
  }

  /// Legacy dialect used whenever the version is unknown.
  pub fn fallback(&self) -> &Dialect {
    &self.dialects[self.dialects.len() - 1]
  }

  /// Newest dialect not newer than `version`.
  pub fn resolve(&self, version: &str) -> &Dialect {
    let Ok(version) = Version::parse(version.trim()) else {
      log::debug!("Unrecognized VLC version {:?}, using legacy dialect", version);
      return self.fallback();
    };

    self
      .dialects
      .iter()
      .find(|d| version >= d.version)
      .unwrap_or_else(|| self.fallback())
  }

  /// Resolve the dialect from the first banner line among `lines`.
  pub fn detect<S: AsRef<str>>(&self, lines: &[S]) -> &Dialect {
    for line in lines {
      if let Some(caps) = BANNER_RE.captures(line.as_ref()) {
        return self.resolve(&caps[1]);
      }
    }
    self.resolve("")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn resolved(catalog: &VersionCatalog, v: &str) -> String {
    catalog.resolve(v).version.to_string()
  }

  #[test]
  fn test_resolve_floor_match() {
    let catalog = VersionCatalog::default();

    assert_eq!(resolved(&catalog, "5.0.0"), "4.0.0");
    assert_eq!(resolved(&catalog, "4.0.0"), "4.0.0");
    assert_eq!(resolved(&catalog, "3.9.0"), "0.0.0");
    assert_eq!(resolved(&catalog, "0.0.0"), "0.0.0");
  }

  #[test]
  fn test_resolve_unparseable_uses_fallback() {
    let catalog = VersionCatalog::default();

    assert_eq!(resolved(&catalog, ""), "0.0.0");
    assert_eq!(resolved(&catalog, "bad"), "0.0.0");
    assert_eq!(resolved(&catalog, "4.x.1"), "0.0.0");
    assert_eq!(catalog.resolve("bad").shutdown_command, "quit");
  }

  #[test]
  fn test_resolve_below_every_entry_uses_fallback() {
    let catalog = VersionCatalog::from_dialects(vec![
      Dialect::new(Version::new(2, 0, 0), "quit"),
      Dialect::new(Version::new(4, 0, 0), "shutdown"),
    ]);

    assert_eq!(resolved(&catalog, "1.9.9"), "2.0.0");
    assert_eq!(resolved(&catalog, "2.0.0"), "2.0.0");
  }

  #[test]
  fn test_dialect_keywords() {
    let catalog = VersionCatalog::default();

    assert_eq!(catalog.resolve("3.0.20").shutdown_command, "quit");
    assert_eq!(catalog.resolve("4.1.3").shutdown_command, "shutdown");
  }

  #[test]
  fn test_resolve_pre_release_sorts_below_release() {
    let catalog = VersionCatalog::default();

    assert_eq!(catalog.resolve("4.0.0-dev").shutdown_command, "quit");
    assert_eq!(resolved(&catalog, "4.0.0-rc1"), "0.0.0");
    assert_eq!(resolved(&catalog, "4.0.1-dev"), "4.0.0");
    assert_eq!(resolved(&catalog, "4.0.0+git"), "4.0.0");
  }

  #[test]
  fn test_resolve_requires_full_version() {
    let catalog = VersionCatalog::default();

    assert_eq!(resolved(&catalog, "4"), "0.0.0");
    assert_eq!(resolved(&catalog, "4.1"), "0.0.0");
    assert_eq!(resolved(&catalog, " 4.1.0 "), "4.0.0");
  }

  #[test]
  fn test_detect() {
    let catalog = VersionCatalog::default();
    let text = [
      "Command Line Interface initialized. Type 'help' for help.",
      "VLC media player 4.1.3",
      "Command Line Interface initialized. Type 'help' for help.",
    ];

    assert_eq!(catalog.detect(&text).version.to_string(), "4.0.0");
  }

  #[test]
  fn test_detect_first_match_wins() {
    let catalog = VersionCatalog::default();
    let text = ["VLC media player 3.0.20 Vetinari", "VLC media player 4.1.3"];

    assert_eq!(catalog.detect(&text).shutdown_command, "quit");
  }

  #[test]
  fn test_detect_failed() {
    let catalog = VersionCatalog::default();
    let text = [
      "Command Line Interface initialized. Type 'help' for help.",
      "VLC 4.1.3",
      "Command Line Interface initialized. Type 'help' for help.",
    ];

    assert_eq!(catalog.detect(&text).version.to_string(), "0.0.0");
    assert_eq!(catalog.detect::<&str>(&[]).version.to_string(), "0.0.0");
  }
}
