//! Mounted collection feeds.
//!
//! A browser tab showing a collection page mounts one feed. The feed owns a
//! [`FeedSession`](collection_feed_core::feed::FeedSession), turns navigation
//! and scroll events into page fetches against a
//! [`ProductSource`](crate::shopify::ProductSource), and emits
//! [`FeedUpdate`]s for the page to render.
//!
//! ```text
//! FeedHandle --FeedEvent--> driver task --spawn--> fetch tasks (JoinSet)
//!     ^                         |                        |
//!     |                         +<---- (PageRequest, result)
//!     +-------- FeedUpdate -----+
//! ```
//!
//! Dropping the [`FeedHandle`] unmounts the feed: the driver task is aborted
//! and every in-flight fetch with it.

mod driver;

pub use driver::{FeedClosed, FeedEvent, FeedHandle, FeedUpdate};
