//! A single tracked delimiter pair.

use leap_core::{
  Position,
  shift,
};

use crate::{
  config::{
    DecorationStyle,
    TriggerPair,
  },
  edit::ContentEdit,
  host::{
    MarkerId,
    MarkerRenderer,
  },
};

/// One auto-closed pair under tracking: the positions of its open and close
/// delimiters, plus the close-side marker when decorated.
///
/// Invariant: `open < close` and both sides share a line. Edits that would
/// break either invariant kill the pair instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedPair {
  open:   Position,
  close:  Position,
  marker: Option<MarkerId>,
}

/// Read-only dump of one pair for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairSnapshot {
  pub open:      Position,
  pub close:     Position,
  pub decorated: bool,
}

impl TrackedPair {
  /// A pair freshly auto-inserted at `at`: the close side sits immediately
  /// after the open delimiter.
  pub fn from_trigger(at: Position, trigger: &TriggerPair) -> Self {
    Self {
      open:   at,
      close:  at.right(trigger.close_offset()),
      marker: None,
    }
  }

  pub fn open(&self) -> Position {
    self.open
  }

  pub fn close(&self) -> Position {
    self.close
  }

  /// Where a leap over this pair lands: one column past the close side.
  pub fn leap_target(&self) -> Position {
    self.close.right(1)
  }

  /// `open < pos <= close`: anywhere inside the pair, including directly
  /// before the close delimiter.
  pub fn encloses(&self, pos: Position) -> bool {
    self.open < pos && pos <= self.close
  }

  /// Shift both sides through `edit`. Returns false (leaving the fields
  /// untouched) when the pair dies: a side was overwritten, or the sides no
  /// longer share a line. Must not be called with the edit that created the
  /// pair; that one is consumed at creation.
  pub fn apply_edit(&mut self, edit: &ContentEdit) -> bool {
    let (Some(open), Some(close)) = (
      shift(self.open, edit.range, &edit.text),
      shift(self.close, edit.range, &edit.text),
    ) else {
      tracing::trace!(pair = ?self.snapshot(), "pair side overwritten");
      return false;
    };

    if open.line != close.line {
      tracing::trace!(pair = ?self.snapshot(), "pair split across lines");
      return false;
    }

    self.open = open;
    self.close = close;
    true
  }

  pub fn decorated(&self) -> bool {
    self.marker.is_some()
  }

  /// Place the close-side marker; a no-op when already decorated.
  pub fn decorate(&mut self, renderer: &mut dyn MarkerRenderer, style: &DecorationStyle) {
    if self.marker.is_none() {
      self.marker = Some(renderer.apply_marker(self.close, style));
    }
  }

  /// Remove the close-side marker; a no-op when not decorated.
  pub fn undecorate(&mut self, renderer: &mut dyn MarkerRenderer) {
    if let Some(marker) = self.marker.take() {
      renderer.remove_marker(marker);
    }
  }

  /// Re-place the marker after the close side moved.
  pub fn refresh_marker(&mut self, renderer: &mut dyn MarkerRenderer, style: &DecorationStyle) {
    if let Some(marker) = self.marker.take() {
      renderer.remove_marker(marker);
      self.marker = Some(renderer.apply_marker(self.close, style));
    }
  }

  pub fn snapshot(&self) -> PairSnapshot {
    PairSnapshot {
      open:      self.open,
      close:     self.close,
      decorated: self.marker.is_some(),
    }
  }
}
