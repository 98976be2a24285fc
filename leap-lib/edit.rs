//! Content-edit batches reported by the host.
//!
//! A [`ContentEdit`] states that the text in `range` was replaced by `text`.
//! One document mutation arrives as an [`EditBatch`]: a list of edits that
//! are conceptually simultaneous, all expressed in pre-batch coordinates,
//! and sorted by descending document position (the last edit in the document
//! comes first). The tracker's new-pair chaining depends on that order, so
//! the batch constructor validates it instead of trusting the host.

use leap_core::{
  Position,
  Range,
};
use smallvec::SmallVec;
use thiserror::Error;

use crate::Tendril;

pub type Result<T> = std::result::Result<T, EditError>;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum EditError {
  #[error("invalid edit range: start {start:?} is after end {end:?}")]
  InvalidRange { start: Position, end: Position },
  #[error("batch not in descending order: edit {index} ends at {end:?}, after the previous edit's start {prev_start:?}")]
  UnorderedBatch {
    index:      usize,
    end:        Position,
    prev_start: Position,
  },
}

/// A single replacement: the text in `range` became `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEdit {
  pub range: Range,
  pub text:  Tendril,
}

impl ContentEdit {
  pub fn new(range: Range, text: impl Into<Tendril>) -> Self {
    Self {
      range,
      text: text.into(),
    }
  }

  /// Pure insertion at a point, no text removed.
  pub fn insert(at: Position, text: impl Into<Tendril>) -> Self {
    Self::new(Range::point(at), text)
  }

  /// Deletion with nothing inserted.
  pub fn delete(range: Range) -> Self {
    Self::new(range, "")
  }

  pub fn is_insertion(&self) -> bool {
    self.range.is_empty()
  }
}

/// A validated, descending-ordered list of simultaneous edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBatch {
  edits: SmallVec<[ContentEdit; 1]>,
}

impl EditBatch {
  /// Build a batch, checking each range and the descending-order
  /// precondition. Edits may touch (one may start where the previous in
  /// document order ends) but must not overlap or be misordered.
  pub fn new(edits: impl IntoIterator<Item = ContentEdit>) -> Result<Self> {
    let edits: SmallVec<[ContentEdit; 1]> = edits.into_iter().collect();

    let mut prev_start: Option<Position> = None;
    for (index, edit) in edits.iter().enumerate() {
      if edit.range.start > edit.range.end {
        return Err(EditError::InvalidRange {
          start: edit.range.start,
          end:   edit.range.end,
        });
      }
      if let Some(prev_start) = prev_start
        && edit.range.end > prev_start
      {
        return Err(EditError::UnorderedBatch {
          index,
          end: edit.range.end,
          prev_start,
        });
      }
      prev_start = Some(edit.range.start);
    }

    Ok(Self { edits })
  }

  pub fn iter(&self) -> impl Iterator<Item = &ContentEdit> {
    self.edits.iter()
  }

  pub fn len(&self) -> usize {
    self.edits.len()
  }

  pub fn is_empty(&self) -> bool {
    self.edits.is_empty()
  }
}

impl From<ContentEdit> for EditBatch {
  fn from(edit: ContentEdit) -> Self {
    Self {
      edits: smallvec::smallvec![edit],
    }
  }
}
