//! Page-window math and the read-only view handed to renderers.

use std::{num::NonZeroUsize, ops::Range};

pub const DEFAULT_PAGE_SIZE: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(size) => size,
    None => unreachable!(),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Zero-based page index.
    pub page_index: usize,
    pub page_size: NonZeroUsize,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageWindow {
    /// Offset of the first row of `page_index`.
    pub fn start_of(&self, page_index: usize) -> usize {
        page_index.saturating_mul(self.page_size.get())
    }

    /// Number of rows needed to fill `page_index` completely.
    pub fn end_of(&self, page_index: usize) -> usize {
        self.start_of(page_index).saturating_add(self.page_size.get())
    }

    /// Slice bounds of the current page, clipped to `available` rows.
    pub fn range(&self, available: usize) -> Range<usize> {
        let start = self.start_of(self.page_index).min(available);
        let end = self.end_of(self.page_index).min(available);
        start..end
    }
}

/// Number of pages needed for `total_items`; never less than one.
pub fn total_pages(total_items: usize, page_size: NonZeroUsize) -> usize {
    total_items.div_ceil(page_size.get()).max(1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowRow<T> {
    pub item: T,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowView<T> {
    pub rows: Vec<WindowRow<T>>,
    pub page_index: usize,
    pub page_size: NonZeroUsize,
    /// Authoritative size of the remote collection, once known.
    pub total_count: Option<usize>,
    pub selected_count: usize,
}

impl<T> WindowView<T> {
    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.rows.iter().map(|row| &row.item)
    }

    pub fn selected_flags(&self) -> Vec<bool> {
        self.rows.iter().map(|row| row.selected).collect()
    }

    /// 1-based number of the first visible row, 0 when the window is empty.
    pub fn first_row(&self) -> usize {
        if self.rows.is_empty() {
            0
        } else {
            self.page_index * self.page_size.get() + 1
        }
    }

    pub fn last_row(&self) -> usize {
        if self.rows.is_empty() {
            0
        } else {
            self.page_index * self.page_size.get() + self.rows.len()
        }
    }

    pub fn all_visible_selected(&self) -> bool {
        !self.rows.is_empty() && self.rows.iter().all(|row| row.selected)
    }

    /// Header checkbox in its mixed state: some but not all rows selected.
    pub fn some_visible_selected(&self) -> bool {
        let selected = self.rows.iter().filter(|row| row.selected).count();
        selected > 0 && selected < self.rows.len()
    }

    /// "11-20 of 25" style summary.
    pub fn range_label(&self) -> String {
        let total = self
            .total_count
            .map_or_else(|| "?".to_string(), |total| total.to_string());
        format!("{}-{} of {total}", self.first_row(), self.last_row())
    }
}
