//! Resolved engine configuration.
//!
//! The engine never reads host settings itself: integration glue resolves
//! whatever per-language or per-user lookup the host offers into a
//! [`LeapConfig`] snapshot and hands it over once. The decoration style is
//! an opaque JSON payload passed straight through to the marker renderer.

use std::{
  fmt,
  str::FromStr,
};

use serde::{
  Deserialize,
  Deserializer,
  Serialize,
  Serializer,
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
  #[error("trigger pair {0:?} is not exactly two characters")]
  InvalidTriggerPair(String),
}

/// Trigger pairs recognised when no host configuration says otherwise.
pub const DEFAULT_TRIGGER_PAIRS: &[(char, char)] = &[('(', ')'), ('[', ']'), ('{', '}')];

/// A two-character delimiter pair eligible for tracking when the host
/// auto-inserts it around a cursor, e.g. `()` or `""`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerPair {
  pub open:  char,
  pub close: char,
}

impl TriggerPair {
  /// True when `text` is exactly this pair's two characters.
  pub fn matches(&self, text: &str) -> bool {
    let mut chars = text.chars();
    chars.next() == Some(self.open) && chars.next() == Some(self.close) && chars.next().is_none()
  }

  /// Columns between the pair's sides at creation: the UTF-16 width of the
  /// open delimiter.
  pub fn close_offset(&self) -> usize {
    self.open.len_utf16()
  }
}

impl From<(char, char)> for TriggerPair {
  fn from((open, close): (char, char)) -> Self {
    Self { open, close }
  }
}

impl FromStr for TriggerPair {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self> {
    let mut chars = s.chars();
    match (chars.next(), chars.next(), chars.next()) {
      (Some(open), Some(close), None) => Ok(Self { open, close }),
      _ => Err(ConfigError::InvalidTriggerPair(s.to_owned())),
    }
  }
}

impl fmt::Display for TriggerPair {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{}", self.open, self.close)
  }
}

impl Serialize for TriggerPair {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for TriggerPair {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}

/// Opaque visual style for the close-side marker, forwarded untouched to
/// the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecorationStyle(pub serde_json::Value);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeapConfig {
  /// Two-character insertions recognised as freshly auto-closed pairs.
  pub trigger_pairs: Vec<TriggerPair>,
  /// Decorate every tracked pair instead of only the innermost one.
  pub decorate_all:  bool,
  pub style:         DecorationStyle,
}

impl LeapConfig {
  /// The trigger pair matching `text`, if any.
  pub fn trigger_for(&self, text: &str) -> Option<&TriggerPair> {
    self.trigger_pairs.iter().find(|pair| pair.matches(text))
  }
}

impl Default for LeapConfig {
  fn default() -> Self {
    Self {
      trigger_pairs: DEFAULT_TRIGGER_PAIRS.iter().map(|&p| p.into()).collect(),
      decorate_all:  false,
      style:         DecorationStyle::default(),
    }
  }
}
