//! Feed session state machine.
//!
//! A [`FeedSession`] is the state of one mounted collection page: which
//! collection it shows, which page it is on, and every product loaded so far.
//! It performs no I/O. Callers feed it navigation and scroll events, execute
//! the [`PageRequest`]s it hands back, and report each result through
//! [`FeedSession::complete`].
//!
//! Fetches are serialized: a new page is only requested once the previous
//! one has resolved, so products are appended in page order. Every request
//! carries the session generation it was issued under, and completions from
//! an older generation are discarded.

use core::fmt;
use core::ops::Range;

use crate::types::{Handle, Product, ProductPage};

use super::page::PageNumber;
use super::pager::{ScrollMetrics, ScrollPager};
use super::route::{RouteContext, RouteError, RouteState};

/// A fetch the caller must perform on behalf of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    generation: u64,
    handle: Handle,
    page: PageNumber,
}

impl PageRequest {
    #[must_use]
    pub const fn handle(&self) -> &Handle {
        &self.handle
    }

    #[must_use]
    pub const fn page(&self) -> PageNumber {
        self.page
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Loading state of the current collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    /// Nothing in flight; a scroll near the bottom loads the next page.
    Idle,
    /// A fetch for this page is in flight.
    Loading(PageNumber),
    /// The last fetched page was empty.
    Exhausted,
    /// The fetch for `page` failed. Paging stops until [`FeedSession::retry`].
    Failed { page: PageNumber, message: String },
}

/// Result of [`FeedSession::navigate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// The route is not ready yet.
    Pending,
    /// The route resolved to the collection already shown.
    Unchanged,
    /// A new collection was selected; state was reset and page 1 requested.
    Started(PageRequest),
}

/// Result of [`FeedSession::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The request was superseded; state was not touched.
    Stale,
    /// Products were appended at `range` of [`FeedSession::products`].
    Appended { page: PageNumber, range: Range<usize> },
    /// The page was empty; the collection has no more products.
    Exhausted { page: PageNumber },
    /// The fetch failed.
    Failed { page: PageNumber, message: String },
}

/// State of one mounted collection feed.
#[derive(Debug, Clone)]
pub struct FeedSession {
    generation: u64,
    handle: Option<Handle>,
    page: PageNumber,
    products: Vec<Product>,
    status: FeedStatus,
    pager: ScrollPager,
}

impl Default for FeedSession {
    fn default() -> Self {
        Self::new(ScrollPager::default())
    }
}

impl FeedSession {
    #[must_use]
    pub const fn new(pager: ScrollPager) -> Self {
        Self {
            generation: 0,
            handle: None,
            page: PageNumber::FIRST,
            products: Vec::new(),
            status: FeedStatus::Idle,
            pager,
        }
    }

    /// Apply a navigation event.
    ///
    /// A new handle bumps the generation, clears the accumulated products and
    /// resets the page number to 1 before page 1 is requested.
    ///
    /// # Errors
    ///
    /// Returns the [`RouteError`] when the context is ready but has no valid
    /// handle. The session is cleared in that case so nothing from the
    /// previous collection stays on screen.
    pub fn navigate(&mut self, route: &RouteContext) -> Result<Navigation, RouteError> {
        let handle = match route.resolve() {
            Ok(RouteState::Pending) => return Ok(Navigation::Pending),
            Ok(RouteState::Ready(handle)) => handle,
            Err(err) => {
                self.reset(None);
                return Err(err);
            }
        };

        if self.handle.as_ref() == Some(&handle) {
            return Ok(Navigation::Unchanged);
        }

        self.reset(Some(handle));
        Ok(self.request_page(PageNumber::FIRST).map_or(Navigation::Unchanged, Navigation::Started))
    }

    /// Apply a scroll event.
    ///
    /// Advances the page number by exactly one and returns the request for it
    /// when the viewport is near the bottom and the feed is idle. Scrolls while
    /// a fetch is in flight, after the collection is exhausted, or after a
    /// failure are ignored.
    pub fn on_scroll(&mut self, metrics: &ScrollMetrics) -> Option<PageRequest> {
        if self.status != FeedStatus::Idle || !self.pager.is_near_bottom(metrics) {
            return None;
        }

        let next = self.page.next();
        if next == self.page {
            return None;
        }
        self.request_page(next)
    }

    /// Re-request the page that failed. The page number does not change.
    pub fn retry(&mut self) -> Option<PageRequest> {
        let FeedStatus::Failed { page, .. } = self.status else {
            return None;
        };
        self.request_page(page)
    }

    /// Record the result of a fetch issued for `request`.
    pub fn complete<E: fmt::Display>(
        &mut self,
        request: &PageRequest,
        result: Result<ProductPage, E>,
    ) -> Completion {
        if !self.is_current(request) {
            return Completion::Stale;
        }

        let page = request.page;
        match result {
            Ok(loaded) if loaded.is_empty() => {
                self.status = FeedStatus::Exhausted;
                Completion::Exhausted { page }
            }
            Ok(loaded) => {
                let start = self.products.len();
                self.products.extend(loaded.products);
                self.status = FeedStatus::Idle;
                Completion::Appended {
                    page,
                    range: start..self.products.len(),
                }
            }
            Err(err) => {
                let message = err.to_string();
                self.status = FeedStatus::Failed {
                    page,
                    message: message.clone(),
                };
                Completion::Failed { page, message }
            }
        }
    }

    /// Whether `request` is the fetch the session is currently waiting on.
    #[must_use]
    pub fn is_current(&self, request: &PageRequest) -> bool {
        request.generation == self.generation
            && self.status == FeedStatus::Loading(request.page)
            && self.handle.as_ref() == Some(&request.handle)
    }

    /// Collection currently shown.
    #[must_use]
    pub const fn handle(&self) -> Option<&Handle> {
        self.handle.as_ref()
    }

    /// Highest page requested for the current collection.
    #[must_use]
    pub const fn page(&self) -> PageNumber {
        self.page
    }

    /// Products loaded so far, in page order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub const fn status(&self) -> &FeedStatus {
        &self.status
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    fn reset(&mut self, handle: Option<Handle>) {
        self.generation = self.generation.wrapping_add(1);
        self.handle = handle;
        self.page = PageNumber::FIRST;
        self.products.clear();
        self.status = FeedStatus::Idle;
    }

    fn request_page(&mut self, page: PageNumber) -> Option<PageRequest> {
        let handle = self.handle.clone()?;
        self.page = page;
        self.status = FeedStatus::Loading(page);
        Some(PageRequest {
            generation: self.generation,
            handle,
            page,
        })
    }
}
