//! Per-cursor pair tracking.
//!
//! A [`Tracker`] owns the ordered stack of pairs around one cursor,
//! outermost first. Content-edit batches shift or kill the tracked pairs
//! and may create a new innermost one; cursor movement prunes pairs the
//! cursor's anchor has left; the innermost pair answers line-of-sight and
//! leap queries.
//!
//! The tracker keeps the last selection it was told about. Because hosts
//! report selection changes after (and decoupled from) the content changes
//! that caused them, that stored selection is still in pre-batch
//! coordinates while a batch is being applied. That is exactly the frame
//! the batch's own positions use, so new-pair detection compares the two
//! directly.

use leap_core::{
  Position,
  Range,
  shift,
};
use smallvec::SmallVec;

use crate::{
  config::LeapConfig,
  edit::EditBatch,
  host::{
    CursorSelection,
    DocumentView,
    MarkerRenderer,
  },
  pair::{
    PairSnapshot,
    TrackedPair,
  },
};

#[derive(Debug)]
pub struct Tracker {
  /// Outermost first, innermost last. All pairs share one line.
  stack:     SmallVec<[TrackedPair; 4]>,
  /// Last selection this tracker was told about for its cursor.
  selection: CursorSelection,
  /// Whether the tracked line is inside the host's viewport.
  visible:   bool,
}

impl Tracker {
  pub fn new(selection: CursorSelection) -> Self {
    Self {
      stack: SmallVec::new(),
      selection,
      visible: true,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.stack.is_empty()
  }

  pub fn selection(&self) -> CursorSelection {
    self.selection
  }

  pub fn snapshot(&self) -> Vec<PairSnapshot> {
    self.stack.iter().map(TrackedPair::snapshot).collect()
  }

  /// Apply one simultaneous edit batch: shift or drop every tracked pair,
  /// then look for a freshly auto-inserted trigger pair at this cursor.
  ///
  /// `reported` is the host's post-batch selection for this cursor, when
  /// the host delivers one alongside the content change; otherwise the
  /// stored selection is advanced by the batch as a stand-in until the
  /// deferred selection update arrives.
  pub fn apply_content_changes(
    &mut self,
    batch: &EditBatch,
    reported: Option<&CursorSelection>,
    config: &LeapConfig,
    renderer: &mut dyn MarkerRenderer,
  ) {
    if batch.is_empty() {
      if let Some(reported) = reported {
        self.selection = *reported;
      }
      return;
    }

    tracing::trace!(edits = batch.len(), pairs = self.stack.len(), "content batch");

    self.shift_existing(batch, config, renderer);

    let created = self.detect_new_pair(batch, config);

    if let Some(reported) = reported {
      self.selection = *reported;
    } else if let Some(pair) = &created {
      // Hosts place the cursor between a freshly auto-closed pair.
      self.selection = CursorSelection::point(pair.close());
    } else {
      self.selection = CursorSelection::new(
        shift_through_batch(self.selection.anchor, batch),
        shift_through_batch(self.selection.active, batch),
      );
    }

    if let Some(pair) = created {
      tracing::debug!(open = ?pair.open(), close = ?pair.close(), "tracking new pair");
      self.stack.push(pair);
    }

    self.update_decorations(config, renderer);
  }

  fn shift_existing(
    &mut self,
    batch: &EditBatch,
    config: &LeapConfig,
    renderer: &mut dyn MarkerRenderer,
  ) {
    let mut survivors = SmallVec::new();

    for mut pair in std::mem::take(&mut self.stack) {
      let mut alive = true;
      for edit in batch.iter() {
        // Edits entirely below the tracked line cannot move the pair.
        if edit.range.start.line > pair.open().line {
          continue;
        }
        if !pair.apply_edit(edit) {
          alive = false;
          break;
        }
      }

      if alive {
        pair.refresh_marker(renderer, &config.style);
        survivors.push(pair);
      } else {
        tracing::debug!(pair = ?pair.snapshot(), "pair invalidated by edit");
        pair.undecorate(renderer);
      }
    }

    self.stack = survivors;
  }

  /// Scan the batch (descending document order) for an insertion of a
  /// configured trigger pair at this cursor's pre-batch anchor. Once found,
  /// every remaining edit in the scan lies at or before the new pair and is
  /// threaded through it to land it in post-batch coordinates. First match
  /// wins; later candidates in the same batch are ignored.
  fn detect_new_pair(&self, batch: &EditBatch, config: &LeapConfig) -> Option<TrackedPair> {
    let anchor = self.selection.anchor;
    let mut edits = batch.iter();

    while let Some(edit) = edits.next() {
      if !edit.is_insertion() || edit.range.start != anchor {
        continue;
      }
      let Some(trigger) = config.trigger_for(&edit.text) else {
        continue;
      };

      let mut pair = TrackedPair::from_trigger(edit.range.start, trigger);
      for rest in edits.by_ref() {
        if !pair.apply_edit(rest) {
          return None;
        }
      }
      return Some(pair);
    }

    None
  }

  /// Drop pairs the cursor's anchor has left, innermost out. Scanning stops
  /// at the first enclosing pair: outer pairs enclose everything their
  /// inner ones do.
  pub fn prune_to_selection(
    &mut self,
    selection: &CursorSelection,
    config: &LeapConfig,
    renderer: &mut dyn MarkerRenderer,
  ) {
    self.selection = *selection;

    while let Some(mut pair) = self.stack.pop() {
      if pair.encloses(selection.anchor) {
        self.stack.push(pair);
        break;
      }
      tracing::debug!(pair = ?pair.snapshot(), "cursor left pair");
      pair.undecorate(renderer);
    }

    self.update_decorations(config, renderer);
  }

  /// True when only whitespace (or nothing) separates the cursor's active
  /// position from the innermost pair's close delimiter.
  pub fn has_line_of_sight(&self, doc: &dyn DocumentView) -> bool {
    let Some(pair) = self.stack.last() else {
      return false;
    };
    let active = self.selection.active;
    if active > pair.close() {
      return false;
    }

    let between = doc.text_in(Range::new(active, pair.close()));
    between.chars().all(char::is_whitespace)
  }

  /// Leap support: pop the innermost pair and report where the cursor
  /// lands, one column past the close side. The caller re-runs
  /// [`Self::update_decorations`] once its whole leap batch is done.
  pub fn pop_innermost(&mut self, renderer: &mut dyn MarkerRenderer) -> Option<Position> {
    let mut pair = self.stack.pop()?;
    pair.undecorate(renderer);

    let target = pair.leap_target();
    self.selection = CursorSelection::point(target);
    tracing::debug!(?target, "leap");
    Some(target)
  }

  /// Forget every tracked pair without touching the cursor.
  pub fn clear(&mut self, renderer: &mut dyn MarkerRenderer) {
    for pair in &mut self.stack {
      pair.undecorate(renderer);
    }
    self.stack.clear();
  }

  /// Recompute visibility from the host's visible line range and
  /// decorate/undecorate to match.
  pub fn sync_visibility(
    &mut self,
    visible_lines: Option<&std::ops::Range<usize>>,
    config: &LeapConfig,
    renderer: &mut dyn MarkerRenderer,
  ) {
    self.visible = match (self.stack.last(), visible_lines) {
      (Some(pair), Some(lines)) => lines.contains(&pair.open().line),
      // No viewport information means nothing is hidden.
      (Some(_), None) => true,
      // An empty tracker has no line to be off-screen.
      (None, _) => true,
    };
    self.update_decorations(config, renderer);
  }

  /// Normalize decoration state: nothing when off-screen, every pair under
  /// `decorate_all`, only the innermost otherwise. Idempotent.
  pub fn update_decorations(&mut self, config: &LeapConfig, renderer: &mut dyn MarkerRenderer) {
    if !self.visible {
      for pair in &mut self.stack {
        pair.undecorate(renderer);
      }
      return;
    }

    let last = self.stack.len().saturating_sub(1);
    for (index, pair) in self.stack.iter_mut().enumerate() {
      if config.decorate_all || index == last {
        pair.decorate(renderer, &config.style);
      } else {
        pair.undecorate(renderer);
      }
    }
  }
}

/// Advance a position through a whole batch, used to keep the stored
/// selection plausible until the host's deferred selection report arrives.
/// A position swallowed by an edit collapses to that edit's start.
fn shift_through_batch(pos: Position, batch: &EditBatch) -> Position {
  batch.iter().fold(pos, |pos, edit| {
    shift(pos, edit.range, &edit.text).unwrap_or(edit.range.start)
  })
}

#[cfg(test)]
mod test {
  use ropey::Rope;

  use super::*;
  use crate::{
    edit::ContentEdit,
    host::fixtures::RecordingRenderer,
  };

  fn pos(line: usize, column: usize) -> Position {
    Position::new(line, column)
  }

  fn insertion(at: Position, text: &str) -> EditBatch {
    EditBatch::from(ContentEdit::insert(at, text))
  }

  fn opens_and_closes(tracker: &Tracker) -> (Vec<usize>, Vec<usize>) {
    let snap = tracker.snapshot();
    (
      snap.iter().map(|p| p.open.column).collect(),
      snap.iter().map(|p| p.close.column).collect(),
    )
  }

  /// Type the three bracket kinds at the start of an empty line, with the
  /// auto-closer mirrored as the host would report it.
  fn nested_brackets(config: &LeapConfig, renderer: &mut RecordingRenderer) -> Tracker {
    let mut tracker = Tracker::new(CursorSelection::point(pos(0, 0)));
    for (column, text) in ["{}", "[]", "()"].into_iter().enumerate() {
      tracker.apply_content_changes(&insertion(pos(0, column), text), None, config, renderer);
    }
    tracker
  }

  #[test]
  fn consecutive_insertions_nest() {
    let config = LeapConfig::default();
    let mut renderer = RecordingRenderer::new();
    let tracker = nested_brackets(&config, &mut renderer);

    // Canonical `{[()]}` layout.
    let (opens, closes) = opens_and_closes(&tracker);
    assert_eq!(opens, vec![0, 1, 2]);
    assert_eq!(closes, vec![5, 4, 3]);
    assert_eq!(tracker.selection(), CursorSelection::point(pos(0, 3)));

    // Nearest-only decoration: a single marker, at the innermost close.
    assert_eq!(renderer.marker_count(), 1);
    assert_eq!(renderer.marker_positions(), vec![pos(0, 3)]);
  }

  #[test]
  fn decorate_all_keeps_every_marker() {
    let config = LeapConfig {
      decorate_all: true,
      ..LeapConfig::default()
    };
    let mut renderer = RecordingRenderer::new();
    let tracker = nested_brackets(&config, &mut renderer);

    assert_eq!(tracker.snapshot().len(), 3);
    assert_eq!(renderer.marker_count(), 3);
    assert_eq!(
      renderer.marker_positions(),
      vec![pos(0, 5), pos(0, 4), pos(0, 3)]
    );
  }

  #[test]
  fn leaping_through_nested_pairs() {
    let config = LeapConfig::default();
    let mut renderer = RecordingRenderer::new();
    let mut tracker = nested_brackets(&config, &mut renderer);

    assert_eq!(tracker.pop_innermost(&mut renderer), Some(pos(0, 4)));
    assert_eq!(tracker.pop_innermost(&mut renderer), Some(pos(0, 5)));
    assert_eq!(tracker.pop_innermost(&mut renderer), Some(pos(0, 6)));
    assert_eq!(tracker.pop_innermost(&mut renderer), None);

    assert!(tracker.is_empty());
    assert_eq!(tracker.selection(), CursorSelection::point(pos(0, 6)));
    tracker.update_decorations(&config, &mut renderer);
    assert_eq!(renderer.marker_count(), 0);
  }

  #[test]
  fn popping_restores_decoration_on_the_next_innermost() {
    let config = LeapConfig::default();
    let mut renderer = RecordingRenderer::new();
    let mut tracker = nested_brackets(&config, &mut renderer);

    tracker.pop_innermost(&mut renderer);
    tracker.update_decorations(&config, &mut renderer);
    assert_eq!(renderer.marker_positions(), vec![pos(0, 4)]);
  }

  #[test]
  fn cursor_leaving_the_pair_prunes_it() {
    let config = LeapConfig::default();
    let mut renderer = RecordingRenderer::new();
    let mut tracker = Tracker::new(CursorSelection::point(pos(0, 0)));
    tracker.apply_content_changes(&insertion(pos(0, 0), "{}"), None, &config, &mut renderer);
    assert!(!tracker.is_empty());

    // One step right of the close delimiter: outside.
    tracker.prune_to_selection(
      &CursorSelection::point(pos(0, 2)),
      &config,
      &mut renderer,
    );
    assert!(tracker.is_empty());
    assert_eq!(renderer.marker_count(), 0);
  }

  #[test]
  fn prune_stops_at_first_enclosing_pair() {
    let config = LeapConfig::default();
    let mut renderer = RecordingRenderer::new();
    let mut tracker = nested_brackets(&config, &mut renderer);

    // Anchor at column 2: inside `{[`, outside `(`.
    tracker.prune_to_selection(
      &CursorSelection::point(pos(0, 2)),
      &config,
      &mut renderer,
    );
    let (opens, _) = opens_and_closes(&tracker);
    assert_eq!(opens, vec![0, 1]);

    // Every surviving pair encloses the anchor.
    for pair in tracker.snapshot() {
      assert!(pair.open < pos(0, 2) && pos(0, 2) <= pair.close);
    }

    // Decoration fell back to the new innermost.
    assert_eq!(renderer.marker_positions(), vec![pos(0, 4)]);
  }

  #[test]
  fn extending_a_selection_outside_keeps_tracking() {
    let config = LeapConfig::default();
    let mut renderer = RecordingRenderer::new();
    let mut tracker = Tracker::new(CursorSelection::point(pos(0, 4)));
    tracker.apply_content_changes(&insertion(pos(0, 4), "()"), None, &config, &mut renderer);

    // Anchor stays inside while the active end moves out.
    tracker.prune_to_selection(
      &CursorSelection::new(pos(0, 5), pos(0, 9)),
      &config,
      &mut renderer,
    );
    assert!(!tracker.is_empty());
  }

  #[test]
  fn newline_inside_the_pair_invalidates_it() {
    let config = LeapConfig::default();
    let mut renderer = RecordingRenderer::new();
    let mut tracker = Tracker::new(CursorSelection::point(pos(0, 0)));
    tracker.apply_content_changes(&insertion(pos(0, 0), "{}"), None, &config, &mut renderer);

    tracker.apply_content_changes(&insertion(pos(0, 1), "\n"), None, &config, &mut renderer);
    assert!(tracker.is_empty());
    assert_eq!(renderer.marker_count(), 0);
  }

  #[test]
  fn overwriting_a_side_invalidates_only_that_pair() {
    let config = LeapConfig::default();
    let mut renderer = RecordingRenderer::new();
    let mut tracker = nested_brackets(&config, &mut renderer);

    // Overwrite the innermost `)` at column 3.
    let edit = ContentEdit::new(Range::new(pos(0, 3), pos(0, 4)), "x");
    tracker.apply_content_changes(&EditBatch::from(edit), None, &config, &mut renderer);

    let (opens, closes) = opens_and_closes(&tracker);
    assert_eq!(opens, vec![0, 1]);
    assert_eq!(closes, vec![5, 4]);
  }

  #[test]
  fn all_pairs_share_one_line_after_any_batch() {
    let config = LeapConfig::default();
    let mut renderer = RecordingRenderer::new();
    let mut tracker = nested_brackets(&config, &mut renderer);

    // Prepend two lines above; everything shifts down intact.
    tracker.apply_content_changes(&insertion(pos(0, 0), "a\nb\n"), None, &config, &mut renderer);

    let snap = tracker.snapshot();
    assert_eq!(snap.len(), 3);
    for pair in &snap {
      assert_eq!(pair.open.line, 2);
      assert_eq!(pair.close.line, 2);
    }
  }

  #[test]
  fn new_pair_is_chained_through_earlier_edits_in_the_batch() {
    let config = LeapConfig::default();
    let mut renderer = RecordingRenderer::new();
    let mut tracker = Tracker::new(CursorSelection::point(pos(0, 5)));

    // Descending batch: the pair insertion at the cursor, then an edit
    // earlier in the document that shifts it right by two.
    let batch = EditBatch::new([
      ContentEdit::insert(pos(0, 5), "()"),
      ContentEdit::insert(pos(0, 0), "ab"),
    ])
    .unwrap();
    tracker.apply_content_changes(&batch, None, &config, &mut renderer);

    let snap = tracker.snapshot();
    assert_eq!(snap.len(), 1);
    assert_eq!(snap[0].open, pos(0, 7));
    assert_eq!(snap[0].close, pos(0, 8));
  }

  #[test]
  fn first_trigger_match_wins() {
    let config = LeapConfig::default();
    let mut renderer = RecordingRenderer::new();
    let mut tracker = Tracker::new(CursorSelection::point(pos(0, 5)));

    // Two qualifying insertions at the same anchor in one batch: only the
    // first in descending order becomes a tracked pair, and it is shifted
    // by the other.
    let batch = EditBatch::new([
      ContentEdit::insert(pos(0, 5), "()"),
      ContentEdit::insert(pos(0, 5), "[]"),
    ])
    .unwrap();
    tracker.apply_content_changes(&batch, None, &config, &mut renderer);

    let snap = tracker.snapshot();
    assert_eq!(snap.len(), 1);
    assert_eq!(snap[0].open, pos(0, 7));
    assert_eq!(snap[0].close, pos(0, 8));
  }

  #[test]
  fn non_trigger_insertions_create_nothing() {
    let config = LeapConfig::default();
    let mut renderer = RecordingRenderer::new();
    let mut tracker = Tracker::new(CursorSelection::point(pos(0, 0)));

    tracker.apply_content_changes(&insertion(pos(0, 0), "xy"), None, &config, &mut renderer);
    tracker.apply_content_changes(&insertion(pos(0, 2), "{"), None, &config, &mut renderer);
    assert!(tracker.is_empty());
  }

  #[test]
  fn insertion_elsewhere_is_not_a_new_pair() {
    let config = LeapConfig::default();
    let mut renderer = RecordingRenderer::new();
    let mut tracker = Tracker::new(CursorSelection::point(pos(0, 0)));

    // A trigger pair inserted away from the cursor (e.g. another cursor's
    // edit) must not be tracked here.
    tracker.apply_content_changes(&insertion(pos(0, 7), "{}"), None, &config, &mut renderer);
    assert!(tracker.is_empty());
  }

  #[test]
  fn reported_selection_replaces_the_stored_one() {
    let config = LeapConfig::default();
    let mut renderer = RecordingRenderer::new();
    let mut tracker = Tracker::new(CursorSelection::point(pos(0, 0)));

    let reported = CursorSelection::point(pos(0, 1));
    tracker.apply_content_changes(
      &insertion(pos(0, 0), "{}"),
      Some(&reported),
      &config,
      &mut renderer,
    );
    assert_eq!(tracker.selection(), reported);
  }

  #[test]
  fn line_of_sight_over_whitespace_only() {
    let config = LeapConfig::default();
    let mut renderer = RecordingRenderer::new();
    let mut tracker = Tracker::new(CursorSelection::point(pos(0, 0)));
    tracker.apply_content_changes(&insertion(pos(0, 0), "{}"), None, &config, &mut renderer);

    // Five spaces typed before the close; cursor stays next to the open.
    tracker.apply_content_changes(&insertion(pos(0, 1), "     "), None, &config, &mut renderer);
    tracker.prune_to_selection(
      &CursorSelection::point(pos(0, 1)),
      &config,
      &mut renderer,
    );

    let doc = Rope::from_str("{     }");
    assert!(tracker.has_line_of_sight(&doc));

    // A non-whitespace character in the gap blocks the leap.
    tracker.apply_content_changes(&insertion(pos(0, 3), "x"), None, &config, &mut renderer);
    tracker.prune_to_selection(
      &CursorSelection::point(pos(0, 1)),
      &config,
      &mut renderer,
    );
    let doc = Rope::from_str("{  x   }");
    assert!(!tracker.has_line_of_sight(&doc));
  }

  #[test]
  fn empty_tracker_has_no_line_of_sight() {
    let tracker = Tracker::new(CursorSelection::point(pos(0, 0)));
    let doc = Rope::from_str("");
    assert!(!tracker.has_line_of_sight(&doc));
  }

  #[test]
  fn cursor_right_of_the_close_has_no_line_of_sight() {
    let config = LeapConfig::default();
    let mut renderer = RecordingRenderer::new();
    let mut tracker = Tracker::new(CursorSelection::point(pos(0, 0)));
    tracker.apply_content_changes(&insertion(pos(0, 0), "{}"), None, &config, &mut renderer);

    // Anchor still inside, active end past the close.
    tracker.prune_to_selection(
      &CursorSelection::new(pos(0, 1), pos(0, 5)),
      &config,
      &mut renderer,
    );
    let doc = Rope::from_str("{}   ");
    assert!(!tracker.has_line_of_sight(&doc));
  }

  #[test]
  fn visibility_gates_decoration() {
    let config = LeapConfig::default();
    let mut renderer = RecordingRenderer::new();
    let mut tracker = nested_brackets(&config, &mut renderer);
    assert_eq!(renderer.marker_count(), 1);

    // Line 0 scrolled out of view.
    tracker.sync_visibility(Some(&(10..20)), &config, &mut renderer);
    assert_eq!(renderer.marker_count(), 0);

    // Scrolled back in.
    tracker.sync_visibility(Some(&(0..20)), &config, &mut renderer);
    assert_eq!(renderer.marker_count(), 1);
  }

  #[test]
  fn edits_below_the_tracked_line_are_inert() {
    let config = LeapConfig::default();
    let mut renderer = RecordingRenderer::new();
    let mut tracker = nested_brackets(&config, &mut renderer);
    let before = tracker.snapshot();

    let edit = ContentEdit::insert(pos(5, 0), "zzz\nzzz");
    tracker.apply_content_changes(&EditBatch::from(edit), None, &config, &mut renderer);
    assert_eq!(tracker.snapshot(), before);
  }
}
