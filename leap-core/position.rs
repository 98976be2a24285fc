//! Document positions and ranges.
//!
//! A [`Position`] is a single point in a text buffer, addressed by line and
//! by column in UTF-16 code units (the unit most editor hosts report).
//! Positions are plain value types: nothing in this workspace ever mutates a
//! position in place, shifted positions are fresh values.

/// A single point in a text buffer.
/// 0-indexed as all things should be; `column` counts UTF-16 code units.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
  pub line:   usize,
  pub column: usize,
}

impl Position {
  pub const fn new(line: usize, column: usize) -> Self {
    Self { line, column }
  }

  pub const fn zero() -> Self {
    Self { line: 0, column: 0 }
  }

  /// The position reached by walking `text` starting from `self`.
  ///
  /// `\r\n` counts as a single line break. Columns advance by the UTF-16
  /// width of each character.
  pub fn traverse(self, text: &str) -> Self {
    let Self { mut line, mut column } = self;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
      match ch {
        '\r' if chars.peek() == Some(&'\n') => {},
        '\r' | '\n' => {
          line += 1;
          column = 0;
        },
        _ => column += ch.len_utf16(),
      }
    }

    Self { line, column }
  }

  /// `self` moved right by `columns` on the same line.
  pub const fn right(self, columns: usize) -> Self {
    Self {
      line:   self.line,
      column: self.column + columns,
    }
  }
}

impl From<(usize, usize)> for Position {
  fn from(value: (usize, usize)) -> Self {
    Position::new(value.0, value.1)
  }
}

/// A span of replaced text, `start <= end`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Range {
  pub start: Position,
  pub end:   Position,
}

impl Range {
  pub fn new(start: Position, end: Position) -> Self {
    debug_assert!(start <= end, "range start {start:?} after end {end:?}");
    Self { start, end }
  }

  pub fn point(pos: Position) -> Self {
    Self {
      start: pos,
      end:   pos,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.start == self.end
  }

  /// Number of line breaks the range spans.
  pub fn line_span(&self) -> usize {
    self.end.line - self.start.line
  }

  /// `start <= pos < end`: the range overwrites the character at `pos`.
  pub fn contains_strictly(&self, pos: Position) -> bool {
    self.start <= pos && pos < self.end
  }
}
