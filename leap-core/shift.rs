//! Mapping positions through text edits.
//!
//! [`shift`] answers one question: after the text in some range is replaced,
//! where did a given position end up? Edits that overwrite the position have
//! no answer, which is reported as `None` rather than an error: callers
//! treat "the position is gone" as ordinary control flow.

use crate::position::{
  Position,
  Range,
};

/// Map `pos` through the replacement of `replaced` by `inserted`.
///
/// Returns `None` when the edit overwrites `pos`, i.e. when `replaced` is
/// non-empty and starts at or before `pos` while ending strictly after it.
/// An empty `replaced` exactly at `pos` is a pure insertion and pushes the
/// position to the right instead.
///
/// Both `replaced` and the result are in the coordinates of a single edit:
/// mapping through a batch of simultaneous edits is done by folding `shift`
/// over the batch in descending document order.
pub fn shift(pos: Position, replaced: Range, inserted: &str) -> Option<Position> {
  // Entirely after the position: irrelevant.
  if replaced.start > pos {
    return Some(pos);
  }

  // The replaced span covers the character at `pos`.
  if replaced.contains_strictly(pos) {
    return None;
  }

  // From here on `replaced.end <= pos`. The inserted text contributes a
  // vertical delta (its line breaks) and, when the edit ends on the same
  // line as `pos`, a fresh column base.
  let delta = Position::zero().traverse(inserted);
  let line = pos.line + delta.line - replaced.line_span();

  let column = if replaced.end.line < pos.line {
    pos.column
  } else {
    // Text between the edit's end and `pos` survives verbatim.
    let tail = pos.column - replaced.end.column;
    if delta.line == 0 {
      replaced.start.column + delta.column + tail
    } else {
      delta.column + tail
    }
  };

  Some(Position::new(line, column))
}
