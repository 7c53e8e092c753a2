//! Infinite-scroll feed for a single collection.
//!
//! - [`route`] - resolving the collection handle from navigation state
//! - [`page`] - page numbers and the fixed page size
//! - [`pager`] - deciding from scroll metrics when to load the next page
//! - [`session`] - the state machine tying them together

pub mod page;
pub mod pager;
pub mod route;
pub mod session;

pub use page::{PAGE_SIZE, PageNumber};
pub use pager::{SCROLL_THRESHOLD, ScrollMetrics, ScrollPager};
pub use route::{RouteContext, RouteError, RouteState};
pub use session::{Completion, FeedSession, FeedStatus, Navigation, PageRequest};
