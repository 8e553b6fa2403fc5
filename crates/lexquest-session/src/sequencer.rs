//! Block sequencing and navigation.
//!
//! The sequencer holds the ordered block list (immutable once loaded) and
//! the current position. Moving clears nothing by itself; callers use the
//! boolean return of `next`/`prev` to fire the volatile-state clearing side
//! effect only when the index actually changed.

use lexquest_content::{Lesson, LessonBlock};

/// Navigates the ordered block list of a loaded lesson.
#[derive(Debug, Clone)]
pub struct BlockSequencer {
    blocks: Vec<LessonBlock>,
    current: usize,
}

impl BlockSequencer {
    /// Creates a sequencer over the lesson's blocks.
    ///
    /// When `start_on_first_theory_block` is set and the lesson contains a
    /// theory block, the initial position is the first such block; otherwise
    /// index 0. An empty block list yields an empty sequencer whose `current`
    /// is `None`.
    #[must_use]
    pub fn new(lesson: &Lesson, start_on_first_theory_block: bool) -> Self {
        let initial = if start_on_first_theory_block {
            lesson.first_theory_index().unwrap_or(0)
        } else {
            0
        };
        Self {
            blocks: lesson.blocks.clone(),
            current: initial,
        }
    }

    /// The 0-based index of the active block.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current
    }

    /// The active block, or `None` for an empty lesson.
    #[must_use]
    pub fn current(&self) -> Option<&LessonBlock> {
        self.blocks.get(self.current)
    }

    /// Advances to the next block. No-op at the last index.
    ///
    /// Returns `true` if the index moved.
    pub fn next(&mut self) -> bool {
        if self.current + 1 < self.blocks.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Steps back to the previous block. No-op at index 0.
    ///
    /// Returns `true` if the index moved.
    pub fn prev(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Whether the active block is the first one.
    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.current == 0
    }

    /// Whether the active block is the last one.
    ///
    /// Gates the "complete lesson" action: it is offered only here,
    /// regardless of what was answered in earlier blocks.
    #[must_use]
    pub fn is_last(&self) -> bool {
        !self.blocks.is_empty() && self.current == self.blocks.len() - 1
    }

    /// Number of blocks in the lesson.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the lesson has no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
