//! Debounced input
//!
//! Global filter input is typed one key at a time; refetching per keystroke
//! would flood the server. A [`Debouncer`] holds back each value until no
//! newer value arrived for the configured delay, then emits it on a
//! channel. Pushing while a value is pending replaces it.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Emits only the last of a burst of values
///
/// Needs a tokio runtime; pending values are dropped with the debouncer.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tablekit_grid::Debouncer;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (mut debouncer, mut output) = Debouncer::new(Duration::from_millis(20));
/// debouncer.push("d".to_string());
/// debouncer.push("de".to_string());
/// debouncer.push("dell".to_string());
///
/// assert_eq!(output.recv().await.as_deref(), Some("dell"));
/// # }
/// ```
#[derive(Debug)]
pub struct Debouncer<T> {
	delay: Duration,
	sender: mpsc::UnboundedSender<T>,
	pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
	/// Creates a debouncer and the receiver its values are emitted on
	///
	/// A zero delay emits every value immediately.
	pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
		let (sender, receiver) = mpsc::unbounded_channel();
		let debouncer = Self {
			delay,
			sender,
			pending: None,
		};
		(debouncer, receiver)
	}

	pub fn delay(&self) -> Duration {
		self.delay
	}

	/// Schedules a value, replacing the pending one
	pub fn push(&mut self, value: T) {
		self.cancel();
		if self.delay.is_zero() {
			if self.sender.send(value).is_err() {
				tracing::debug!("debounced value dropped, receiver is gone");
			}
			return;
		}

		let sender = self.sender.clone();
		let delay = self.delay;
		self.pending = Some(tokio::spawn(async move {
			tokio::time::sleep(delay).await;
			if sender.send(value).is_err() {
				tracing::debug!("debounced value dropped, receiver is gone");
			}
		}));
	}

	/// Drops the pending value, if any
	pub fn cancel(&mut self) {
		if let Some(pending) = self.pending.take() {
			pending.abort();
		}
	}

	/// Returns whether a value is waiting for the delay to elapse
	pub fn is_pending(&self) -> bool {
		self.pending
			.as_ref()
			.is_some_and(|pending| !pending.is_finished())
	}
}

impl<T> Drop for Debouncer<T> {
	fn drop(&mut self) {
		if let Some(pending) = self.pending.take() {
			pending.abort();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::*;

	#[rstest]
	#[tokio::test(start_paused = true)]
	async fn test_only_last_value_of_a_burst_is_emitted() {
		let (mut debouncer, mut output) = Debouncer::new(Duration::from_millis(300));

		debouncer.push("d");
		tokio::time::advance(Duration::from_millis(100)).await;
		debouncer.push("de");
		tokio::time::advance(Duration::from_millis(100)).await;
		debouncer.push("dell");
		assert!(debouncer.is_pending());

		assert_eq!(output.recv().await, Some("dell"));
		assert!(output.try_recv().is_err());
	}

	#[rstest]
	#[tokio::test(start_paused = true)]
	async fn test_values_apart_are_all_emitted() {
		let (mut debouncer, mut output) = Debouncer::new(Duration::from_millis(300));

		debouncer.push(1);
		tokio::time::sleep(Duration::from_millis(400)).await;
		debouncer.push(2);

		assert_eq!(output.recv().await, Some(1));
		assert_eq!(output.recv().await, Some(2));
	}

	#[rstest]
	#[tokio::test]
	async fn test_zero_delay_is_immediate() {
		let (mut debouncer, mut output) = Debouncer::new(Duration::ZERO);
		debouncer.push("a");
		debouncer.push("b");

		assert!(!debouncer.is_pending());
		assert_eq!(output.try_recv().ok(), Some("a"));
		assert_eq!(output.try_recv().ok(), Some("b"));
	}

	#[rstest]
	#[tokio::test(start_paused = true)]
	async fn test_cancel_drops_pending_value() {
		let (mut debouncer, mut output) = Debouncer::new(Duration::from_millis(300));
		debouncer.push("draft");
		debouncer.cancel();

		tokio::time::sleep(Duration::from_millis(500)).await;
		assert!(output.try_recv().is_err());
	}
}
