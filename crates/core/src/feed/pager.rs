//! Scroll-position paging.

use serde::Deserialize;

/// Default distance from the bottom of the content, in CSS pixels, at which
/// the next page is requested.
pub const SCROLL_THRESHOLD: f64 = 200.0;

/// Viewport measurements taken from the document element on a scroll event.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ScrollMetrics {
    /// Pixels scrolled from the top of the document.
    pub scroll_top: f64,
    /// Height of the visible viewport.
    pub client_height: f64,
    /// Total scrollable height of the document.
    pub scroll_height: f64,
}

/// Decides when the viewport is close enough to the bottom to load more.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollPager {
    threshold: f64,
}

impl ScrollPager {
    #[must_use]
    pub const fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// `scroll_top + client_height >= scroll_height - threshold`
    #[must_use]
    pub fn is_near_bottom(&self, metrics: &ScrollMetrics) -> bool {
        metrics.scroll_top + metrics.client_height >= metrics.scroll_height - self.threshold
    }
}

impl Default for ScrollPager {
    fn default() -> Self {
        Self::new(SCROLL_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn metrics(scroll_top: f64) -> ScrollMetrics {
        ScrollMetrics {
            scroll_top,
            client_height: 800.0,
            scroll_height: 3000.0,
        }
    }

    #[test]
    fn test_far_from_bottom() {
        assert!(!ScrollPager::default().is_near_bottom(&metrics(0.0)));
        assert!(!ScrollPager::default().is_near_bottom(&metrics(1999.0)));
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        // 2000 + 800 == 3000 - 200
        assert!(ScrollPager::default().is_near_bottom(&metrics(2000.0)));
    }

    #[test]
    fn test_at_bottom() {
        assert!(ScrollPager::default().is_near_bottom(&metrics(2200.0)));
    }

    #[test]
    fn test_short_content_is_always_near_bottom() {
        let short = ScrollMetrics {
            scroll_top: 0.0,
            client_height: 900.0,
            scroll_height: 900.0,
        };
        assert!(ScrollPager::default().is_near_bottom(&short));
    }

    #[test]
    fn test_custom_threshold() {
        let pager = ScrollPager::new(0.0);
        assert!(!pager.is_near_bottom(&metrics(2100.0)));
        assert!(pager.is_near_bottom(&metrics(2200.0)));
    }
}
