use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use shared::domain::Record;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Size of the whole remote collection at the time of the call.
    pub total_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("page fetch at cursor {cursor} failed: {message}")]
pub struct FetchError {
    pub cursor: usize,
    /// HTTP status when the failure came back from a server response.
    pub status: Option<u16>,
    pub message: String,
}

impl FetchError {
    pub fn new(cursor: usize, message: impl Into<String>) -> Self {
        Self {
            cursor,
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Remote collection read forward from a cursor.
///
/// `cursor` is the number of items the caller already holds; the source
/// skips that many and returns the next slice. Returned items may overlap
/// earlier pages.
#[async_trait]
pub trait PageSource<T: Record>: Send + Sync {
    async fn fetch_page(&self, cursor: usize) -> Result<Page<T>, FetchError>;
}

/// Serves a fixed collection in chunks of `chunk_len`.
///
/// With `overlap` set, every page after the first starts that many items
/// before the cursor, the way a source that re-sends its boundary rows does.
pub struct StaticPageSource<T> {
    items: Vec<T>,
    chunk_len: usize,
    overlap: usize,
    calls: AtomicUsize,
}

impl<T: Record> StaticPageSource<T> {
    pub fn new(items: Vec<T>, chunk_len: usize) -> Self {
        Self {
            items,
            chunk_len: chunk_len.max(1),
            overlap: 0,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_overlap(mut self, overlap: usize) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl<T: Record> PageSource<T> for StaticPageSource<T> {
    async fn fetch_page(&self, cursor: usize) -> Result<Page<T>, FetchError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let start = cursor.saturating_sub(self.overlap).min(self.items.len());
        let end = cursor
            .saturating_add(self.chunk_len)
            .min(self.items.len())
            .max(start);
        Ok(Page {
            items: self.items[start..end].to_vec(),
            total_count: self.items.len(),
        })
    }
}
