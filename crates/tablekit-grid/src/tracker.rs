//! Fetch version tracking
//!
//! Fast successive state changes can leave several requests in flight, and
//! their responses may arrive out of order. Every change takes a new
//! version; only the response for the latest version may be applied.

use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out fetch versions and recognizes stale responses
///
/// # Examples
///
/// ```
/// use tablekit_grid::FetchTracker;
///
/// let tracker = FetchTracker::new();
/// let first = tracker.next();
/// let second = tracker.next();
///
/// assert!(!tracker.accept(first));
/// assert!(tracker.accept(second));
/// ```
#[derive(Debug, Default)]
pub struct FetchTracker {
	latest: AtomicU64,
}

impl FetchTracker {
	pub fn new() -> Self {
		Self::default()
	}

	/// Starts a new fetch and returns its version
	pub fn next(&self) -> u64 {
		self.latest.fetch_add(1, Ordering::SeqCst) + 1
	}

	/// Version of the most recent fetch, `0` before the first one
	pub fn latest(&self) -> u64 {
		self.latest.load(Ordering::SeqCst)
	}

	pub fn is_current(&self, version: u64) -> bool {
		version == self.latest()
	}

	/// Returns whether a response may be applied, logging stale ones
	pub fn accept(&self, version: u64) -> bool {
		let latest = self.latest();
		if version != latest {
			tracing::debug!(version, latest, "dropping stale table response");
			return false;
		}
		true
	}
}
