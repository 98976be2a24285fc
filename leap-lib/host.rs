//! Collaborator seams towards the host editor.
//!
//! The engine never talks to an editor API directly. It reads document text
//! through [`DocumentView`], draws and clears close-side markers through
//! [`MarkerRenderer`], and receives cursor state as plain
//! [`CursorSelection`] values. Hosts adapt their own buffer, decoration,
//! and selection types behind these seams; a [`ropey::Rope`] adapter ships
//! here because the test suite (and any rope-backed host) needs one.

use std::num::NonZeroU64;

use leap_core::{
  Position,
  Range,
};
use ropey::Rope;

use crate::config::DecorationStyle;

/// Read access to the tracked document.
pub trait DocumentView {
  /// Plain text between two positions, in document order.
  fn text_in(&self, range: Range) -> String;
}

/// Handle to one applied close-side marker.
///
/// Produced by the renderer; the engine only stores and returns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(NonZeroU64);

impl MarkerId {
  pub fn new(id: NonZeroU64) -> Self {
    Self(id)
  }

  pub fn get(self) -> u64 {
    self.0.get()
  }
}

/// Decoration side effects, assumed infallible and idempotent from the
/// engine's perspective. A failing renderer must never affect tracking.
pub trait MarkerRenderer {
  fn apply_marker(&mut self, pos: Position, style: &DecorationStyle) -> MarkerId;
  fn remove_marker(&mut self, id: MarkerId);
}

/// One cursor as reported by the host: the `anchor` end stays put while a
/// selection extends, the `active` end is where the caret visually is.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CursorSelection {
  pub anchor: Position,
  pub active: Position,
}

impl CursorSelection {
  pub fn new(anchor: Position, active: Position) -> Self {
    Self { anchor, active }
  }

  /// An empty selection at `pos`.
  pub fn point(pos: Position) -> Self {
    Self {
      anchor: pos,
      active: pos,
    }
  }

  pub fn is_point(&self) -> bool {
    self.anchor == self.active
  }
}

/// Char index of a `(line, UTF-16 column)` position in `doc`.
///
/// Out-of-range lines clamp to the last line, out-of-range columns to the
/// line's end, matching how hosts clamp stale positions.
fn char_idx_at(doc: &Rope, pos: Position) -> usize {
  let line = pos.line.min(doc.len_lines().saturating_sub(1));
  let line_start = doc.line_to_char(line);
  let line_end = if line + 1 < doc.len_lines() {
    doc.line_to_char(line + 1)
  } else {
    doc.len_chars()
  };

  let line_start_cu = doc.char_to_utf16_cu(line_start);
  let line_end_cu = doc.char_to_utf16_cu(line_end);
  let target_cu = (line_start_cu + pos.column).min(line_end_cu);

  doc.utf16_cu_to_char(target_cu).min(line_end)
}

impl DocumentView for Rope {
  fn text_in(&self, range: Range) -> String {
    let from = char_idx_at(self, range.start);
    let to = char_idx_at(self, range.end).max(from);
    self.slice(from..to).to_string()
  }
}
