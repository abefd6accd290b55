//! Notification Dispatcher and Error Feed
//!
//! The dispatcher is the single inbound entry point: the transport invokes
//! it once per unsolicited message, on whatever task its delivery loop runs.
//! It decodes, resolves the target feed through the registry, and delivers —
//! without spawning and without blocking, so one message can never stall the
//! next.
//!
//! Failures that cannot be attributed to a subscriber (a payload that does
//! not decode, possibly before its symbol is even known) go to the shared
//! [`ErrorFeed`] instead of any delivery channel.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

use super::decoder::{DecodeError, NotificationDecoder};
use super::registry::{Delivery, FeedRegistry};
use crate::application::ports::NotificationSink;

// =============================================================================
// Error Feed
// =============================================================================

/// Shared out-of-band channel of decode failures.
///
/// Append-only from the router's side, single-consumer on the caller's side:
/// the receiver is handed out once. Shutdown closes the feed last and
/// reinstalls a fresh open channel.
#[derive(Debug)]
pub struct ErrorFeed {
    tx: Mutex<mpsc::UnboundedSender<DecodeError>>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<DecodeError>>>,
}

impl ErrorFeed {
    /// Create an open feed.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx: Mutex::new(tx),
            rx: Mutex::new(Some(rx)),
        }
    }

    /// Take the consuming end. Returns `None` if already taken.
    pub fn take_receiver(&self) -> Option<mpsc::UnboundedReceiver<DecodeError>> {
        self.rx.lock().take()
    }

    /// Publish a decode failure.
    ///
    /// If the feed itself is unreachable (consumer dropped the receiver),
    /// the error is reported through tracing and dropped; dispatch must not
    /// stall on an unobserved feed.
    pub fn publish(&self, error: DecodeError) {
        if let Err(lost) = self.tx.lock().send(error) {
            tracing::error!(error = %lost.0, "error feed unreachable, dropping decode error");
        }
    }

    /// Close the current feed and install a fresh open channel.
    pub fn reset(&self) {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.rx.lock() = Some(rx);
        // Installing the new sender drops the old one, which closes the
        // previous feed after its replacement already exists.
        *self.tx.lock() = tx;
    }
}

impl Default for ErrorFeed {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Inbound-message entry point.
///
/// Register via [`NotificationSink`] with the transport collaborator; every
/// unsolicited `(method, payload)` lands here.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<FeedRegistry>,
    decoder: NotificationDecoder,
    errors: Arc<ErrorFeed>,
}

impl Dispatcher {
    /// Create a dispatcher over a registry and error feed.
    #[must_use]
    pub fn new(registry: Arc<FeedRegistry>, errors: Arc<ErrorFeed>) -> Self {
        Self {
            registry,
            decoder: NotificationDecoder::new(),
            errors,
        }
    }

    /// Process one inbound notification.
    ///
    /// Decode failures go to the error feed; unknown methods and messages
    /// for keys without a live channel are dropped silently (the latter are
    /// expected during unsubscribe races and must not surface as faults).
    pub fn dispatch(&self, method: &str, payload: &Value) {
        match self.decoder.decode(method, payload) {
            Ok(Some(notification)) => match self.registry.deliver(notification) {
                Delivery::Delivered => {}
                Delivery::NoSubscriber => {
                    tracing::debug!(method, "dropping notification without a live subscriber");
                }
            },
            Ok(None) => {
                tracing::trace!(method, "ignoring unrecognized notification method");
            }
            Err(error) => {
                tracing::warn!(method, error = %error, "failed to decode notification");
                self.errors.publish(error);
            }
        }
    }
}

impl NotificationSink for Dispatcher {
    fn on_notification(&self, method: &str, payload: &Value) {
        self.dispatch(method, payload);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn setup() -> (Dispatcher, Arc<FeedRegistry>, Arc<ErrorFeed>) {
        let registry = Arc::new(FeedRegistry::new());
        let errors = Arc::new(ErrorFeed::new());
        let dispatcher = Dispatcher::new(Arc::clone(&registry), Arc::clone(&errors));
        (dispatcher, registry, errors)
    }

    fn ticker_payload(symbol: &str) -> Value {
        json!({
            "ask": "0.054464", "bid": "0.054463", "last": "0.054463",
            "open": "0.057559", "low": "0.053615", "high": "0.057559",
            "volume": "33068.346", "volumeQuote": "1832.687530809",
            "timestamp": "2017-10-19T15:45:44.941Z", "symbol": symbol
        })
    }

    #[test]
    fn delivers_to_subscribed_feed() {
        let (dispatcher, registry, _errors) = setup();
        let mut rx = registry.open_ticker("ETHBTC").unwrap();

        dispatcher.dispatch("ticker", &ticker_payload("ETHBTC"));

        assert_eq!(rx.try_recv().unwrap().symbol, "ETHBTC");
    }

    #[test]
    fn unsubscribed_symbol_is_dropped_silently() {
        let (dispatcher, registry, errors) = setup();
        let mut other = registry.open_ticker("BTCUSD").unwrap();
        let mut error_rx = errors.take_receiver().unwrap();

        dispatcher.dispatch("ticker", &ticker_payload("ETHBTC"));

        assert!(other.try_recv().is_err());
        assert!(error_rx.try_recv().is_err());
    }

    #[test]
    fn unknown_method_produces_nothing() {
        let (dispatcher, _registry, errors) = setup();
        let mut error_rx = errors.take_receiver().unwrap();

        dispatcher.dispatch("futureMethod", &json!({"anything": true}));

        assert!(error_rx.try_recv().is_err());
    }

    #[test]
    fn decode_failure_lands_on_error_feed() {
        let (dispatcher, registry, errors) = setup();
        let mut rx = registry.open_ticker("ETHBTC").unwrap();
        let mut error_rx = errors.take_receiver().unwrap();

        dispatcher.dispatch("ticker", &json!({"symbol": "ETHBTC"}));

        let err = error_rx.try_recv().unwrap();
        assert_eq!(err.method, "ticker");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn decode_failure_with_dropped_error_feed_does_not_panic() {
        let (dispatcher, _registry, errors) = setup();
        drop(errors.take_receiver());

        dispatcher.dispatch("ticker", &json!({"symbol": "ETHBTC"}));
    }

    #[test]
    fn receive_parks_until_dispatch_delivers() {
        use tokio_test::{assert_pending, assert_ready};

        let (dispatcher, registry, _errors) = setup();
        let mut rx = registry.open_ticker("ETHBTC").unwrap();

        let mut recv = tokio_test::task::spawn(rx.recv());
        assert_pending!(recv.poll());

        dispatcher.dispatch("ticker", &ticker_payload("ETHBTC"));

        let update = assert_ready!(recv.poll()).unwrap();
        assert_eq!(update.symbol, "ETHBTC");
    }

    #[test]
    fn error_feed_reset_reopens_fresh_channel() {
        let errors = ErrorFeed::new();
        let mut first = errors.take_receiver().unwrap();

        errors.reset();

        // Old receiver observes end-of-stream, new receiver is live.
        assert_eq!(
            first.try_recv().unwrap_err(),
            tokio::sync::mpsc::error::TryRecvError::Disconnected
        );
        assert!(errors.take_receiver().is_some());
    }
}
