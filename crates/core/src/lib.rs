//! Collection Feed Core - Domain types and feed state.
//!
//! This crate provides the types and state machine behind the infinite-scroll
//! collection page:
//! - [`types`] - Handles, products, variants, prices and price ranges
//! - [`feed`] - Route resolution, page numbering, scroll paging and the
//!   per-page session that accumulates products
//!
//! # Architecture
//!
//! The core crate contains only types and state transitions - no I/O, no
//! HTTP clients, no async runtime. The storefront crate drives a
//! [`feed::FeedSession`] from network and browser events.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod feed;
pub mod types;

pub use types::*;
