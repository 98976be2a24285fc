//! Multi-cursor orchestration.
//!
//! A [`Coordinator`] owns one [`Tracker`] per cursor, index-aligned with
//! the host's cursor list, and fans every update out to them. It is an
//! explicitly constructed object with an explicit lifecycle: integration
//! glue creates one per document it watches and disposes it when tracking
//! ends, there is no process-wide instance.
//!
//! # Update ordering
//!
//! Hosts deliver content changes and selection changes in whatever order
//! their event loop produces, which can momentarily show a cursor outside
//! a pair it is really inside. The coordinator therefore never prunes on a
//! raw selection event: [`Coordinator::on_cursor_change`] only arms a
//! single pending flag, and the host's scheduling primitive calls
//! [`Coordinator::flush_cursor_update`] once the current turn's edits have
//! all been applied. Arming while already armed coalesces.

use leap_core::Position;
use smallvec::SmallVec;

use crate::{
  config::LeapConfig,
  edit::EditBatch,
  host::{
    CursorSelection,
    DocumentView,
    MarkerRenderer,
  },
  pair::PairSnapshot,
  tracker::Tracker,
};

#[derive(Debug)]
pub struct Coordinator {
  config:        LeapConfig,
  /// The nth tracker follows the host's nth cursor.
  trackers:      Vec<Tracker>,
  /// Single-slot deferred selection update (see module docs).
  pending_flush: bool,
  visible_lines: Option<std::ops::Range<usize>>,
}

impl Coordinator {
  pub fn new(config: LeapConfig) -> Self {
    Self {
      config,
      trackers: Vec::new(),
      pending_flush: false,
      visible_lines: None,
    }
  }

  pub fn config(&self) -> &LeapConfig {
    &self.config
  }

  pub fn cursor_count(&self) -> usize {
    self.trackers.len()
  }

  /// Realign the tracker list with the host's cursors. Surplus trackers
  /// are disposed (their markers released), new cursors start with empty
  /// stacks.
  pub fn resize(&mut self, selections: &[CursorSelection], renderer: &mut dyn MarkerRenderer) {
    if selections.len() < self.trackers.len() {
      for tracker in &mut self.trackers[selections.len()..] {
        tracker.clear(renderer);
      }
      self.trackers.truncate(selections.len());
    } else {
      for selection in &selections[self.trackers.len()..] {
        self.trackers.push(Tracker::new(*selection));
      }
    }
    tracing::trace!(cursors = self.trackers.len(), "tracker list resized");
  }

  /// Fan one content-edit batch out to every tracker.
  ///
  /// `selections`, when the host supplies it, is the post-batch cursor
  /// list; a tracker whose index has no matching cursor is skipped rather
  /// than fed a guess.
  pub fn on_content_change(
    &mut self,
    batch: &EditBatch,
    selections: Option<&[CursorSelection]>,
    renderer: &mut dyn MarkerRenderer,
  ) {
    for (index, tracker) in self.trackers.iter_mut().enumerate() {
      let reported = match selections {
        Some(selections) => match selections.get(index) {
          Some(selection) => Some(selection),
          // Stale index: this tracker's cursor is gone, skip it.
          None => continue,
        },
        None => None,
      };
      tracker.apply_content_changes(batch, reported, &self.config, renderer);
    }

    // Edits may have moved tracked lines across the viewport edge.
    self.sync_visibility(renderer);
  }

  /// Arm the deferred selection update. Returns true when a flush was
  /// newly requested; the host should then schedule a call to
  /// [`Self::flush_cursor_update`] at the end of the current turn.
  /// Returns false when one is already pending.
  pub fn on_cursor_change(&mut self) -> bool {
    if self.pending_flush {
      return false;
    }
    self.pending_flush = true;
    true
  }

  /// Run the deferred selection update, pruning every tracker against its
  /// cursor's current anchor. A no-op unless armed.
  pub fn flush_cursor_update(
    &mut self,
    selections: &[CursorSelection],
    renderer: &mut dyn MarkerRenderer,
  ) {
    if !self.pending_flush {
      return;
    }
    self.pending_flush = false;

    for (index, tracker) in self.trackers.iter_mut().enumerate() {
      let Some(selection) = selections.get(index) else {
        continue;
      };
      tracker.prune_to_selection(selection, &self.config, renderer);
    }
  }

  pub fn on_visible_range_change(
    &mut self,
    lines: std::ops::Range<usize>,
    renderer: &mut dyn MarkerRenderer,
  ) {
    self.visible_lines = Some(lines);
    self.sync_visibility(renderer);
  }

  fn sync_visibility(&mut self, renderer: &mut dyn MarkerRenderer) {
    for tracker in &mut self.trackers {
      tracker.sync_visibility(self.visible_lines.as_ref(), &self.config, renderer);
    }
  }

  /// Leap every cursor with a tracked pair past its innermost close side.
  ///
  /// Returns `(cursor index, target)` for each cursor that moves; the host
  /// applies the moves as empty selections. Cursors with nothing tracked
  /// are untouched. Decoration bookkeeping runs once after the whole
  /// batch.
  pub fn leap(&mut self, renderer: &mut dyn MarkerRenderer) -> SmallVec<[(usize, Position); 1]> {
    let mut moves = SmallVec::new();

    for (index, tracker) in self.trackers.iter_mut().enumerate() {
      if let Some(target) = tracker.pop_innermost(renderer) {
        moves.push((index, target));
      }
    }

    for tracker in &mut self.trackers {
      tracker.update_decorations(&self.config, renderer);
    }

    moves
  }

  /// Escape hatch: stop tracking everything without moving any cursor.
  pub fn reset_all(&mut self, renderer: &mut dyn MarkerRenderer) {
    for tracker in &mut self.trackers {
      tracker.clear(renderer);
    }
  }

  /// True when no tracker holds a pair.
  pub fn is_empty(&self) -> bool {
    self.trackers.iter().all(Tracker::is_empty)
  }

  /// True when some cursor has an unobstructed path to its innermost
  /// close delimiter, i.e. the predicate gating the leap keybinding.
  pub fn has_line_of_sight(&self, doc: &dyn DocumentView) -> bool {
    self.trackers.iter().any(|t| t.has_line_of_sight(doc))
  }

  /// Per-cursor dump of every tracked pair, for diagnostics and tests.
  pub fn snapshot(&self) -> Vec<Vec<PairSnapshot>> {
    self.trackers.iter().map(Tracker::snapshot).collect()
  }

  /// Tear down: release every marker and drop any pending flush.
  pub fn dispose(mut self, renderer: &mut dyn MarkerRenderer) {
    self.reset_all(renderer);
    self.pending_flush = false;
  }
}
