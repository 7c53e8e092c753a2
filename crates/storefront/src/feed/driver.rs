//! Feed driver task.

use collection_feed_core::feed::{
    Completion, FeedSession, Navigation, PageNumber, PageRequest, RouteContext, ScrollMetrics,
};
use collection_feed_core::types::{Handle, Product, ProductPage};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{Instrument, debug, info, info_span};

use crate::error::{AppError, add_breadcrumb};
use crate::shopify::{ProductSource, ShopifyError};

/// Buffered events before senders wait on the driver.
const EVENT_BUFFER: usize = 64;
/// Buffered updates before the driver waits on the page.
const UPDATE_BUFFER: usize = 16;

/// Input to a mounted feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Navigation state changed.
    Navigate(RouteContext),
    /// The page scrolled.
    Scroll(ScrollMetrics),
    /// The shopper asked to retry the page that failed.
    Retry,
}

/// Output of a mounted feed, in the order the page should apply it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedUpdate {
    /// Navigation is not ready; show the loading placeholder.
    Pending,
    /// A new collection was selected; clear the rendered list.
    Reset { handle: Handle },
    /// A page fetch started.
    Loading { page: PageNumber },
    /// Products to append to the rendered list.
    Appended {
        page: PageNumber,
        products: Vec<Product>,
    },
    /// The collection has no more products.
    Exhausted { page: PageNumber },
    /// Something went wrong. `message` is safe to show to shoppers.
    Failed {
        page: Option<PageNumber>,
        message: String,
        retryable: bool,
    },
}

/// The feed was unmounted.
#[derive(Debug, Error)]
#[error("feed is no longer mounted")]
pub struct FeedClosed;

/// Handle to a mounted feed. Dropping it unmounts the feed.
#[derive(Debug)]
pub struct FeedHandle {
    events: mpsc::Sender<FeedEvent>,
    task: JoinHandle<()>,
}

impl FeedHandle {
    /// Mount a feed that loads pages from `source`.
    ///
    /// Returns the handle used to send events and the receiver of updates.
    /// Must be called from within a tokio runtime.
    pub fn mount<S: ProductSource>(source: S) -> (Self, mpsc::Receiver<FeedUpdate>) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (updates_tx, updates_rx) = mpsc::channel(UPDATE_BUFFER);

        let driver = FeedDriver {
            source,
            session: FeedSession::default(),
            fetches: JoinSet::new(),
            updates: updates_tx,
        };
        let task = tokio::spawn(driver.run(events_rx).instrument(info_span!("feed")));

        (
            Self {
                events: events_tx,
                task,
            },
            updates_rx,
        )
    }

    /// Deliver an event to the feed.
    ///
    /// # Errors
    ///
    /// Returns [`FeedClosed`] if the driver has stopped.
    pub async fn send(&self, event: FeedEvent) -> Result<(), FeedClosed> {
        self.events.send(event).await.map_err(|_| FeedClosed)
    }

    /// Deliver an event without waiting for room in the queue.
    ///
    /// # Errors
    ///
    /// Returns [`TrySendError::Full`] if the driver is behind and
    /// [`TrySendError::Closed`] if it has stopped.
    pub fn try_send(&self, event: FeedEvent) -> Result<(), TrySendError<FeedEvent>> {
        self.events.try_send(event)
    }

    /// Whether the driver task is still running.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

type FetchOutput = (PageRequest, Result<ProductPage, ShopifyError>);

struct FeedDriver<S> {
    source: S,
    session: FeedSession,
    fetches: JoinSet<FetchOutput>,
    updates: mpsc::Sender<FeedUpdate>,
}

impl<S: ProductSource> FeedDriver<S> {
    async fn run(mut self, mut events: mpsc::Receiver<FeedEvent>) {
        debug!("Feed mounted");

        loop {
            let keep_running = tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => false,
                },
                Some(joined) = self.fetches.join_next(), if !self.fetches.is_empty() => match joined {
                    Ok((request, result)) => self.handle_completion(&request, result).await,
                    Err(e) => {
                        tracing::error!(error = %e, "Page fetch task failed");
                        true
                    }
                },
            };

            if !keep_running {
                break;
            }
        }

        debug!("Feed unmounted");
    }

    /// Returns `false` once the page has stopped listening.
    async fn handle_event(&mut self, event: FeedEvent) -> bool {
        match event {
            FeedEvent::Navigate(route) => match self.session.navigate(&route) {
                Ok(Navigation::Pending) => self.publish(FeedUpdate::Pending).await,
                Ok(Navigation::Unchanged) => true,
                Ok(Navigation::Started(request)) => {
                    info!(handle = %request.handle(), "Collection selected");
                    let reset = FeedUpdate::Reset {
                        handle: request.handle().clone(),
                    };
                    self.publish(reset).await && self.start_fetch(request).await
                }
                Err(err) => {
                    let err = AppError::from(err);
                    err.report();
                    self.publish(FeedUpdate::Failed {
                        page: None,
                        message: err.public_message(),
                        retryable: false,
                    })
                    .await
                }
            },
            FeedEvent::Scroll(metrics) => match self.session.on_scroll(&metrics) {
                Some(request) => self.start_fetch(request).await,
                None => true,
            },
            FeedEvent::Retry => match self.session.retry() {
                Some(request) => {
                    info!(page = %request.page(), "Retrying page");
                    self.start_fetch(request).await
                }
                None => true,
            },
        }
    }

    async fn handle_completion(
        &mut self,
        request: &PageRequest,
        result: Result<ProductPage, ShopifyError>,
    ) -> bool {
        let current = self.session.is_current(request);
        let result = result.map_err(|err| {
            let err = AppError::from(err);
            if current {
                err.report();
            }
            err.public_message()
        });

        match self.session.complete(request, result) {
            Completion::Stale => {
                debug!(
                    handle = %request.handle(),
                    page = %request.page(),
                    "Discarded superseded page"
                );
                true
            }
            Completion::Appended { page, range } => {
                let products = self
                    .session
                    .products()
                    .get(range)
                    .map(<[Product]>::to_vec)
                    .unwrap_or_default();
                let page_label = page.to_string();
                add_breadcrumb(
                    "feed",
                    "Loaded page",
                    Some(&[
                        ("handle", request.handle().as_str()),
                        ("page", page_label.as_str()),
                    ]),
                );
                self.publish(FeedUpdate::Appended { page, products }).await
            }
            Completion::Exhausted { page } => {
                debug!(handle = %request.handle(), page = %page, "Collection exhausted");
                self.publish(FeedUpdate::Exhausted { page }).await
            }
            Completion::Failed { page, message } => {
                self.publish(FeedUpdate::Failed {
                    page: Some(page),
                    message,
                    retryable: true,
                })
                .await
            }
        }
    }

    async fn start_fetch(&mut self, request: PageRequest) -> bool {
        let page = request.page();
        debug!(handle = %request.handle(), page = %page, "Fetching page");

        let source = self.source.clone();
        self.fetches.spawn(
            async move {
                let result = source.load_page(request.handle(), request.page()).await;
                (request, result)
            }
            .in_current_span(),
        );

        self.publish(FeedUpdate::Loading { page }).await
    }

    async fn publish(&self, update: FeedUpdate) -> bool {
        self.updates.send(update).await.is_ok()
    }
}
