//! Collection feed storefront library.
//!
//! Serves a collection page whose product list grows as the shopper scrolls.
//! The page shell is rendered here; products stream in over a per-tab
//! WebSocket backed by a [`feed::FeedHandle`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod feed;
pub mod middleware;
pub mod routes;
pub mod shopify;
pub mod state;
