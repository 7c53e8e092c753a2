//! Collection handle resolution from the navigation context.

use serde::Deserialize;

use crate::types::{Handle, HandleError};

/// Navigation state reported by the page.
///
/// Mirrors what a client-side router exposes: a readiness flag and the
/// query parameters, which are only meaningful once ready.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RouteContext {
    pub is_ready: bool,
    #[serde(default)]
    pub handle: Option<String>,
}

impl RouteContext {
    /// A ready context for `handle`.
    #[must_use]
    pub fn ready(handle: impl Into<String>) -> Self {
        Self {
            is_ready: true,
            handle: Some(handle.into()),
        }
    }

    /// A context that has not resolved yet.
    #[must_use]
    pub fn pending() -> Self {
        Self::default()
    }

    /// Resolve the collection handle.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::MissingHandle`] when the context is ready but
    /// carries no handle, and [`RouteError::InvalidHandle`] when the handle
    /// is not a valid slug.
    pub fn resolve(&self) -> Result<RouteState, RouteError> {
        if !self.is_ready {
            return Ok(RouteState::Pending);
        }

        let raw = self.handle.as_deref().ok_or(RouteError::MissingHandle)?;
        Ok(RouteState::Ready(Handle::parse(raw)?))
    }
}

/// Outcome of resolving a [`RouteContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteState {
    /// Navigation has not finished; nothing may be fetched yet.
    Pending,
    /// The collection to display.
    Ready(Handle),
}

/// Errors resolving the collection handle.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("no collection handle in the route")]
    MissingHandle,
    #[error("invalid collection handle: {0}")]
    InvalidHandle(#[from] HandleError),
}
