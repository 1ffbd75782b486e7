use std::{
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use shared::domain::Record;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

mod accumulated;
pub mod graphql_source;
mod selection;
pub mod sort;
mod source;
pub mod window;

pub use accumulated::AccumulatedSet;
pub use graphql_source::GraphqlPageSource;
pub use selection::SelectionSet;
pub use sort::{SortDirection, SortState};
pub use source::{FetchError, Page, PageSource, StaticPageSource};
pub use window::{PageWindow, WindowRow, WindowView, DEFAULT_PAGE_SIZE};

use accumulated::StagedMerge;
use window::total_pages;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("a page navigation is already in flight")]
    Busy,
    #[error("page {page_index} is out of range; the collection has {total_pages} page(s)")]
    PageOutOfRange {
        page_index: usize,
        total_pages: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    PageLoaded {
        page_index: usize,
        fetches: usize,
        appended: usize,
        total_count: Option<usize>,
    },
    FetchFailed {
        page_index: usize,
        error: FetchError,
    },
    SortChanged(SortState),
    SelectionChanged {
        selected: usize,
    },
    PageSizeChanged(NonZeroUsize),
}

struct ControllerState<T: Record> {
    items: AccumulatedSet<T>,
    sort: SortState,
    selection: SelectionSet<T::Id>,
    window: PageWindow,
    /// Bumped by every `set_page_size`; a navigation only moves the window
    /// if no reset happened while it was fetching.
    window_epoch: u64,
    total_count: Option<usize>,
}

/// Clears the in-flight flag when a navigation finishes, fails, or is dropped.
struct NavigationGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> NavigationGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for NavigationGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Browsing session over a remote collection: accumulated rows, forward
/// cursor progress, sort, selection and the visible page window.
///
/// At most one [`goto_page`](Self::goto_page) runs at a time; a second call
/// made while one is outstanding fails with [`ControllerError::Busy`]. Reads
/// never wait for a fetch because the state lock is not held across it.
pub struct PaginationController<T: Record> {
    source: Arc<dyn PageSource<T>>,
    inner: Mutex<ControllerState<T>>,
    navigation_in_flight: AtomicBool,
    events: broadcast::Sender<ControllerEvent>,
}

impl<T: Record> PaginationController<T> {
    pub fn new<S>(source: Arc<S>) -> Arc<Self>
    where
        S: PageSource<T> + 'static,
    {
        Self::new_with_page_size(source, DEFAULT_PAGE_SIZE)
    }

    pub fn new_with_page_size<S>(source: Arc<S>, page_size: NonZeroUsize) -> Arc<Self>
    where
        S: PageSource<T> + 'static,
    {
        Self::new_with_shared_source(source, page_size)
    }

    /// Builds a controller over a source already erased to a trait object.
    pub fn new_with_shared_source(
        source: Arc<dyn PageSource<T>>,
        page_size: NonZeroUsize,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            source,
            inner: Mutex::new(ControllerState {
                items: AccumulatedSet::new(),
                sort: SortState::default(),
                selection: SelectionSet::new(),
                window: PageWindow {
                    page_index: 0,
                    page_size,
                },
                window_epoch: 0,
                total_count: None,
            }),
            navigation_in_flight: AtomicBool::new(false),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub fn is_navigating(&self) -> bool {
        self.navigation_in_flight.load(Ordering::Acquire)
    }

    pub async fn set_sort(&self, key: &str) -> SortState {
        let sort = {
            let mut guard = self.inner.lock().await;
            guard.sort.request(key);
            guard.sort.clone()
        };
        debug!(key = %sort.key, direction = ?sort.direction, "pagination: sort changed");
        let _ = self.events.send(ControllerEvent::SortChanged(sort.clone()));
        sort
    }

    /// Returns whether `id` is selected after the toggle.
    pub async fn toggle_select(&self, id: T::Id) -> bool {
        let (selected, count) = {
            let mut guard = self.inner.lock().await;
            let selected = guard.selection.toggle(id);
            (selected, guard.selection.len())
        };
        let _ = self
            .events
            .send(ControllerEvent::SelectionChanged { selected: count });
        selected
    }

    /// Checked replaces the selection with `visible_ids`; unchecked clears it.
    pub async fn select_all_on_page<I>(&self, checked: bool, visible_ids: I)
    where
        I: IntoIterator<Item = T::Id>,
    {
        let count = {
            let mut guard = self.inner.lock().await;
            if checked {
                guard.selection.replace(visible_ids);
            } else {
                guard.selection.clear();
            }
            guard.selection.len()
        };
        let _ = self
            .events
            .send(ControllerEvent::SelectionChanged { selected: count });
    }

    /// Header-checkbox variant of [`select_all_on_page`](Self::select_all_on_page)
    /// that takes the ids from the current window.
    pub async fn select_all_visible(&self, checked: bool) {
        let visible_ids: Vec<T::Id> = self
            .visible_window()
            .await
            .items()
            .map(T::id)
            .collect();
        self.select_all_on_page(checked, visible_ids).await;
    }

    pub async fn is_selected(&self, id: &T::Id) -> bool {
        self.inner.lock().await.selection.contains(id)
    }

    /// Selected ids in pick order.
    pub async fn selection(&self) -> Vec<T::Id> {
        self.inner.lock().await.selection.ids().to_vec()
    }

    pub async fn set_page_size(&self, page_size: NonZeroUsize) {
        {
            let mut guard = self.inner.lock().await;
            guard.window.page_size = page_size;
            guard.window.page_index = 0;
            guard.window_epoch += 1;
        }
        let _ = self.events.send(ControllerEvent::PageSizeChanged(page_size));
    }

    pub async fn sort_state(&self) -> SortState {
        self.inner.lock().await.sort.clone()
    }

    pub async fn page_window(&self) -> PageWindow {
        self.inner.lock().await.window
    }

    pub async fn total_count(&self) -> Option<usize> {
        self.inner.lock().await.total_count
    }

    pub async fn accumulated_len(&self) -> usize {
        self.inner.lock().await.items.len()
    }

    /// Snapshot of every accumulated item, in fetch order.
    pub async fn accumulated_items(&self) -> Vec<T> {
        self.inner.lock().await.items.items().to_vec()
    }

    /// Page count implied by the last reported total; `None` before the
    /// first successful fetch.
    pub async fn total_pages(&self) -> Option<usize> {
        let guard = self.inner.lock().await;
        guard
            .total_count
            .map(|total| total_pages(total, guard.window.page_size))
    }

    pub async fn visible_window(&self) -> WindowView<T> {
        let guard = self.inner.lock().await;
        let ordered = guard.sort.ordered(guard.items.items());
        let range = guard.window.range(ordered.len());
        let rows = ordered[range]
            .iter()
            .map(|item| WindowRow {
                item: (*item).clone(),
                selected: guard.selection.contains(&item.id()),
            })
            .collect();

        WindowView {
            rows,
            page_index: guard.window.page_index,
            page_size: guard.window.page_size,
            total_count: guard.total_count,
            selected_count: guard.selection.len(),
        }
    }

    /// Moves the window to `page_index`, fetching forward from the number of
    /// rows already held until the page is covered or the collection ends.
    ///
    /// Nothing is applied unless every fetch succeeds: on error the page
    /// index, accumulated rows and total stay as they were.
    pub async fn goto_page(&self, page_index: usize) -> Result<(), ControllerError> {
        let Some(_navigation) = NavigationGuard::acquire(&self.navigation_in_flight) else {
            debug!(page_index, "pagination: navigation rejected, another is in flight");
            return Err(ControllerError::Busy);
        };

        let (window, window_epoch, committed_len, mut known_total) = {
            let guard = self.inner.lock().await;
            (
                guard.window,
                guard.window_epoch,
                guard.items.len(),
                guard.total_count,
            )
        };
        if let Some(total) = known_total {
            ensure_page_in_range(page_index, total, window.page_size)?;
        }

        let needed = window.end_of(page_index);
        let mut staged = StagedMerge::new();
        let mut fetches = 0usize;

        loop {
            let known = committed_len + staged.len();
            if known >= needed || known_total.is_some_and(|total| known >= total) {
                break;
            }

            let cursor = known;
            debug!(page_index, cursor, "pagination: fetching page");
            let page = match self.source.fetch_page(cursor).await {
                Ok(page) => page,
                Err(error) => {
                    warn!(page_index, cursor, "pagination: page fetch failed: {error}");
                    let _ = self.events.send(ControllerEvent::FetchFailed {
                        page_index,
                        error: error.clone(),
                    });
                    return Err(error.into());
                }
            };
            fetches += 1;
            known_total = Some(page.total_count);

            let staged_now = {
                let guard = self.inner.lock().await;
                staged.stage(&guard.items, page.items)
            };
            if staged_now == 0 {
                if cursor < page.total_count {
                    warn!(
                        page_index,
                        cursor,
                        total_count = page.total_count,
                        "pagination: page contributed no new items; stopping"
                    );
                }
                break;
            }
        }

        // Rows and total fetched so far are valid even when the page turns
        // out not to exist; only the window move is refused.
        let in_range = known_total
            .map_or(Ok(()), |total| ensure_page_in_range(page_index, total, window.page_size));

        let (appended, total_count) = {
            let mut guard = self.inner.lock().await;
            let appended = staged.commit_into(&mut guard.items);
            if known_total.is_some() {
                guard.total_count = known_total;
            }
            if in_range.is_ok() {
                if guard.window_epoch == window_epoch {
                    guard.window.page_index = page_index;
                } else {
                    debug!(
                        page_index,
                        "pagination: page size changed during navigation; staying on first page"
                    );
                }
            }
            (appended, guard.total_count)
        };

        if let Err(err) = in_range {
            debug!(page_index, appended, "pagination: requested page is past the end");
            return Err(err);
        }

        info!(
            page_index,
            fetches,
            appended,
            total_count = ?total_count,
            "pagination: page loaded"
        );
        let _ = self.events.send(ControllerEvent::PageLoaded {
            page_index,
            fetches,
            appended,
            total_count,
        });
        Ok(())
    }
}

fn ensure_page_in_range(
    page_index: usize,
    total_count: usize,
    page_size: NonZeroUsize,
) -> Result<(), ControllerError> {
    let total_pages = total_pages(total_count, page_size);
    if page_index >= total_pages {
        return Err(ControllerError::PageOutOfRange {
            page_index,
            total_pages,
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
