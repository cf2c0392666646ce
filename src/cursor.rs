//! Highlight cursor shared by the song list and the storage tree.

/// Row highlight that wraps at both ends of a list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCursor {
    index: usize,
}

impl RowCursor {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Moves up one row, wrapping from the first row to the last.
    pub fn move_up(&mut self, len: usize) -> usize {
        self.index = if self.index == 0 || self.index > len {
            len.saturating_sub(1)
        } else {
            self.index - 1
        };
        self.index
    }

    /// Moves down one row, wrapping from the last row to the first.
    pub fn move_down(&mut self, len: usize) -> usize {
        self.index = if self.index + 1 >= len {
            0
        } else {
            self.index + 1
        };
        self.index
    }

    pub fn jump_first(&mut self) -> usize {
        self.index = 0;
        self.index
    }

    pub fn jump_last(&mut self, len: usize) -> usize {
        self.index = len.saturating_sub(1);
        self.index
    }

    /// Pulls the cursor back inside a list that shrank.
    pub fn clamp(&mut self, len: usize) -> usize {
        self.index = self.index.min(len.saturating_sub(1));
        self.index
    }
}
