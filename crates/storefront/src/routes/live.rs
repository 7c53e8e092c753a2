//! Live feed over WebSocket.
//!
//! Each connection mounts one feed. The browser reports navigation, scroll
//! position and retry clicks; the server answers with rendered product cards
//! and status changes. Closing the socket unmounts the feed.

use askama::Template;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use collection_feed_core::feed::{PageNumber, RouteContext, ScrollMetrics};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::feed::{FeedEvent, FeedHandle, FeedUpdate};
use crate::shopify::ProductSource;
use crate::state::{AppState, LiveFeedGuard};

use super::collections::{FeedErrorTemplate, ProductCardsTemplate};

/// Message sent by the browser.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Navigate(RouteContext),
    Scroll(ScrollMetrics),
    Retry,
}

impl From<ClientMessage> for FeedEvent {
    fn from(message: ClientMessage) -> Self {
        match message {
            ClientMessage::Navigate(route) => Self::Navigate(route),
            ClientMessage::Scroll(metrics) => Self::Scroll(metrics),
            ClientMessage::Retry => Self::Retry,
        }
    }
}

/// Message sent to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Pending,
    Reset {
        handle: String,
    },
    Loading {
        page: PageNumber,
    },
    Append {
        page: PageNumber,
        html: String,
    },
    Exhausted {
        page: PageNumber,
    },
    Error {
        page: Option<PageNumber>,
        message: String,
        retryable: bool,
        html: String,
    },
}

impl ServerMessage {
    /// Render a feed update for the browser.
    ///
    /// # Errors
    ///
    /// Returns an error if a template fails to render.
    pub fn render(update: FeedUpdate) -> Result<Self, askama::Error> {
        Ok(match update {
            FeedUpdate::Pending => Self::Pending,
            FeedUpdate::Reset { handle } => Self::Reset {
                handle: handle.into_inner(),
            },
            FeedUpdate::Loading { page } => Self::Loading { page },
            FeedUpdate::Appended { page, products } => Self::Append {
                page,
                html: ProductCardsTemplate::new(&products).render()?,
            },
            FeedUpdate::Exhausted { page } => Self::Exhausted { page },
            FeedUpdate::Failed {
                page,
                message,
                retryable,
            } => {
                let html = FeedErrorTemplate {
                    message: message.clone(),
                    retryable,
                }
                .render()?;
                Self::Error {
                    page,
                    message,
                    retryable,
                    html,
                }
            }
        })
    }
}

/// Upgrade to the live feed socket.
pub async fn live(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let source = state.source().clone();
    let span = info_span!("live_feed", connection_id = %Uuid::new_v4());

    ws.on_upgrade(move |socket| {
        run_live_feed(socket, source, state.track_live_feed()).instrument(span)
    })
}

async fn run_live_feed<S: ProductSource>(socket: WebSocket, source: S, mounted: LiveFeedGuard) {
    let (sink, mut stream) = socket.split();
    let (feed, updates) = FeedHandle::mount(source);
    info!(active = mounted.active(), "Live feed connected");

    // Updates drain on their own task so the driver can always publish,
    // whatever the reader below is waiting on.
    let mut writer = tokio::spawn(write_updates(sink, updates).in_current_span());

    loop {
        tokio::select! {
            _ = &mut writer => break,
            message = stream.next() => {
                let Some(Ok(message)) = message else { break };
                if !forward(&feed, message).await {
                    break;
                }
            }
        }
    }

    drop(feed);
    writer.abort();
    drop(mounted);
    debug!("Live feed disconnected");
}

/// Send every feed update to the browser until the feed or the socket closes.
async fn write_updates(
    mut sink: SplitSink<WebSocket, Message>,
    mut updates: mpsc::Receiver<FeedUpdate>,
) {
    while let Some(update) = updates.recv().await {
        let Some(text) = encode(update) else { continue };
        if sink.send(Message::Text(text.into())).await.is_err() {
            return;
        }
    }
    let _ = sink.close().await;
}

/// Returns `false` when the connection should close.
async fn forward(feed: &FeedHandle, message: Message) -> bool {
    match message {
        Message::Text(text) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
            // Scroll positions supersede each other, so one can be dropped
            // when the feed is busy.
            Ok(ClientMessage::Scroll(metrics)) => match feed.try_send(FeedEvent::Scroll(metrics)) {
                Ok(()) | Err(TrySendError::Full(_)) => true,
                Err(TrySendError::Closed(_)) => false,
            },
            Ok(message) => feed.send(message.into()).await.is_ok(),
            Err(e) => {
                warn!(error = %e, "Ignoring malformed live feed message");
                true
            }
        },
        Message::Close(_) => false,
        Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => true,
    }
}

fn encode(update: FeedUpdate) -> Option<String> {
    let message = ServerMessage::render(update)
        .map_err(|e| tracing::error!(error = %e, "Failed to render feed update"))
        .ok()?;
    serde_json::to_string(&message)
        .map_err(|e| tracing::error!(error = %e, "Failed to encode feed update"))
        .ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use collection_feed_core::types::Handle;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_navigate() {
        let message: ClientMessage =
            serde_json::from_str(r#"{"type":"navigate","is_ready":true,"handle":"swim"}"#)
                .unwrap();
        assert_eq!(message, ClientMessage::Navigate(RouteContext::ready("swim")));

        let message: ClientMessage =
            serde_json::from_str(r#"{"type":"navigate","is_ready":false}"#).unwrap();
        assert_eq!(message, ClientMessage::Navigate(RouteContext::pending()));
    }

    #[test]
    fn test_parse_scroll_and_retry() {
        let message: ClientMessage = serde_json::from_str(
            r#"{"type":"scroll","scroll_top":1650,"client_height":800,"scroll_height":2600}"#,
        )
        .unwrap();
        assert!(matches!(
            FeedEvent::from(message),
            FeedEvent::Scroll(metrics) if (metrics.scroll_top - 1650.0).abs() < f64::EPSILON
        ));

        let message: ClientMessage = serde_json::from_str(r#"{"type":"retry"}"#).unwrap();
        assert_eq!(FeedEvent::from(message), FeedEvent::Retry);
    }

    #[test]
    fn test_rejects_unknown_message() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"jump","page":4}"#).is_err());
    }

    #[test]
    fn test_render_status_updates() {
        let reset = ServerMessage::render(FeedUpdate::Reset {
            handle: Handle::parse("swim").unwrap(),
        })
        .unwrap();
        assert_eq!(
            serde_json::to_value(&reset).unwrap(),
            json!({"type": "reset", "handle": "swim"})
        );

        let exhausted = ServerMessage::render(FeedUpdate::Exhausted {
            page: PageNumber::new(3).unwrap(),
        })
        .unwrap();
        assert_eq!(
            serde_json::to_value(&exhausted).unwrap(),
            json!({"type": "exhausted", "page": 3})
        );

        let pending = ServerMessage::render(FeedUpdate::Pending).unwrap();
        assert_eq!(serde_json::to_value(&pending).unwrap(), json!({"type": "pending"}));
    }

    #[test]
    fn test_render_empty_append() {
        let message = ServerMessage::render(FeedUpdate::Appended {
            page: PageNumber::FIRST,
            products: Vec::new(),
        })
        .unwrap();
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "append");
        assert_eq!(value["page"], 1);
        assert!(!value["html"].as_str().unwrap().contains("product-item"));
    }

    #[test]
    fn test_render_failure() {
        let message = ServerMessage::render(FeedUpdate::Failed {
            page: PageNumber::new(2),
            message: "We couldn't load more products. Please try again.".to_string(),
            retryable: true,
        })
        .unwrap();
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["page"], 2);
        assert_eq!(value["retryable"], true);
        assert!(value["html"].as_str().unwrap().contains("data-feed-retry"));
    }
}
