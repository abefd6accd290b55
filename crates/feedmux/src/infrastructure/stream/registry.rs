//! Feed Registry
//!
//! The single shared mutable structure of the router: one lock-protected
//! table mapping a composite [`FeedKey`] to the sending half of that feed's
//! delivery channel. Entries are created lazily on first subscribe, removed
//! on acknowledged unsubscribe, and drained in bulk at shutdown.
//!
//! # Design
//!
//! One table, one lock. Subscribe, unsubscribe, and dispatch all serialize
//! through the same `parking_lot::Mutex`, so dispatch can never observe a
//! half-updated table and a drain sees a consistent snapshot of every entry.
//! Delivery channels are unbounded, so a send under the lock never blocks; a
//! slow consumer's backlog stays local to its own feed.
//!
//! Closing a channel is dropping its sender. Removing an entry therefore
//! closes the feed exactly once, and a re-subscribe that replaces an entry
//! supersedes the previous channel (its receiver sees end-of-stream).

use std::collections::HashMap;
use std::mem;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::messages::{
    CandlesSnapshot, CandlesUpdate, Notification, OrderbookSnapshot, OrderbookUpdate, TickerUpdate,
    TradesSnapshot, TradesUpdate,
};
use crate::domain::feed::{FeedKey, Shape, TopicKind};

// =============================================================================
// Types
// =============================================================================

/// Error returned when opening a feed on a registry that has been drained.
///
/// Shutdown takes precedence over a racing subscribe: once [`FeedRegistry::drain_all`]
/// has run, no new entry may be created.
#[derive(Debug, thiserror::Error)]
#[error("feed registry is closed")]
pub struct RegistryClosed;

/// Typed sending half of one delivery channel.
#[derive(Debug)]
enum FeedSender {
    Ticker(mpsc::UnboundedSender<TickerUpdate>),
    OrderbookSnapshot(mpsc::UnboundedSender<OrderbookSnapshot>),
    OrderbookUpdate(mpsc::UnboundedSender<OrderbookUpdate>),
    TradesSnapshot(mpsc::UnboundedSender<TradesSnapshot>),
    TradesUpdate(mpsc::UnboundedSender<TradesUpdate>),
    CandlesSnapshot(mpsc::UnboundedSender<CandlesSnapshot>),
    CandlesUpdate(mpsc::UnboundedSender<CandlesUpdate>),
}

/// Outcome of a delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The notification was handed to the subscriber's channel.
    Delivered,
    /// No live channel for the key; the notification was dropped.
    NoSubscriber,
}

#[derive(Debug, Default)]
struct RegistryInner {
    feeds: HashMap<FeedKey, FeedSender>,
    closed: bool,
}

// =============================================================================
// Feed Registry
// =============================================================================

/// Lock-protected table of active feeds.
///
/// # Example
///
/// ```rust
/// use feedmux::{FeedKey, FeedRegistry};
///
/// let registry = FeedRegistry::new();
/// let mut updates = registry.open_ticker("ETHBTC").unwrap();
///
/// assert!(registry.contains(&FeedKey::ticker("ETHBTC")));
///
/// registry.remove(&FeedKey::ticker("ETHBTC"));
/// assert!(updates.try_recv().is_err()); // channel closed
/// ```
#[derive(Debug, Default)]
pub struct FeedRegistry {
    inner: Mutex<RegistryInner>,
}

impl FeedRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the ticker feed for a symbol.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryClosed`] after [`Self::drain_all`].
    pub fn open_ticker(
        &self,
        symbol: &str,
    ) -> Result<mpsc::UnboundedReceiver<TickerUpdate>, RegistryClosed> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.insert(FeedKey::ticker(symbol), FeedSender::Ticker(tx))?;
        Ok(rx)
    }

    /// Open the order book update feed for a symbol.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryClosed`] after [`Self::drain_all`].
    pub fn open_orderbook_update(
        &self,
        symbol: &str,
    ) -> Result<mpsc::UnboundedReceiver<OrderbookUpdate>, RegistryClosed> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.insert(
            FeedKey::new(TopicKind::Orderbook, Shape::Update, symbol),
            FeedSender::OrderbookUpdate(tx),
        )?;
        Ok(rx)
    }

    /// Open the order book snapshot feed for a symbol.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryClosed`] after [`Self::drain_all`].
    pub fn open_orderbook_snapshot(
        &self,
        symbol: &str,
    ) -> Result<mpsc::UnboundedReceiver<OrderbookSnapshot>, RegistryClosed> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.insert(
            FeedKey::new(TopicKind::Orderbook, Shape::Snapshot, symbol),
            FeedSender::OrderbookSnapshot(tx),
        )?;
        Ok(rx)
    }

    /// Open the trades update feed for a symbol.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryClosed`] after [`Self::drain_all`].
    pub fn open_trades_update(
        &self,
        symbol: &str,
    ) -> Result<mpsc::UnboundedReceiver<TradesUpdate>, RegistryClosed> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.insert(
            FeedKey::new(TopicKind::Trades, Shape::Update, symbol),
            FeedSender::TradesUpdate(tx),
        )?;
        Ok(rx)
    }

    /// Open the trades snapshot feed for a symbol.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryClosed`] after [`Self::drain_all`].
    pub fn open_trades_snapshot(
        &self,
        symbol: &str,
    ) -> Result<mpsc::UnboundedReceiver<TradesSnapshot>, RegistryClosed> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.insert(
            FeedKey::new(TopicKind::Trades, Shape::Snapshot, symbol),
            FeedSender::TradesSnapshot(tx),
        )?;
        Ok(rx)
    }

    /// Open the candles update feed for a symbol.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryClosed`] after [`Self::drain_all`].
    pub fn open_candles_update(
        &self,
        symbol: &str,
    ) -> Result<mpsc::UnboundedReceiver<CandlesUpdate>, RegistryClosed> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.insert(
            FeedKey::new(TopicKind::Candles, Shape::Update, symbol),
            FeedSender::CandlesUpdate(tx),
        )?;
        Ok(rx)
    }

    /// Open the candles snapshot feed for a symbol.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryClosed`] after [`Self::drain_all`].
    pub fn open_candles_snapshot(
        &self,
        symbol: &str,
    ) -> Result<mpsc::UnboundedReceiver<CandlesSnapshot>, RegistryClosed> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.insert(
            FeedKey::new(TopicKind::Candles, Shape::Snapshot, symbol),
            FeedSender::CandlesSnapshot(tx),
        )?;
        Ok(rx)
    }

    /// Close and delete the entry at `key`.
    ///
    /// Silent no-op when absent; unsubscribing a never-subscribed key is
    /// tolerated here and judged (or not) by the caller.
    pub fn remove(&self, key: &FeedKey) -> bool {
        self.inner.lock().feeds.remove(key).is_some()
    }

    /// Route a decoded notification to its feed.
    ///
    /// The lookup and send happen under the registry lock, so a delivery can
    /// never race a removal into a closed channel. Absent keys and
    /// disconnected receivers both report [`Delivery::NoSubscriber`].
    pub fn deliver(&self, notification: Notification) -> Delivery {
        let key = notification.key();
        let inner = self.inner.lock();
        let Some(sender) = inner.feeds.get(&key) else {
            return Delivery::NoSubscriber;
        };

        let sent = match (sender, notification) {
            (FeedSender::Ticker(tx), Notification::Ticker(msg)) => tx.send(msg).is_ok(),
            (FeedSender::OrderbookSnapshot(tx), Notification::OrderbookSnapshot(msg)) => {
                tx.send(msg).is_ok()
            }
            (FeedSender::OrderbookUpdate(tx), Notification::OrderbookUpdate(msg)) => {
                tx.send(msg).is_ok()
            }
            (FeedSender::TradesSnapshot(tx), Notification::TradesSnapshot(msg)) => {
                tx.send(msg).is_ok()
            }
            (FeedSender::TradesUpdate(tx), Notification::TradesUpdate(msg)) => tx.send(msg).is_ok(),
            (FeedSender::CandlesSnapshot(tx), Notification::CandlesSnapshot(msg)) => {
                tx.send(msg).is_ok()
            }
            (FeedSender::CandlesUpdate(tx), Notification::CandlesUpdate(msg)) => {
                tx.send(msg).is_ok()
            }
            // The key is derived from the payload variant, so a stored sender
            // of a different variant cannot be found under it.
            _ => false,
        };

        if sent {
            Delivery::Delivered
        } else {
            Delivery::NoSubscriber
        }
    }

    /// Close every entry exactly once, leave the table empty, and refuse
    /// further inserts.
    ///
    /// Atomic with respect to concurrent subscribe/unsubscribe: the flag and
    /// the drain happen under one lock acquisition, so no new entry can
    /// survive the drain.
    pub fn drain_all(&self) {
        let drained = {
            let mut inner = self.inner.lock();
            inner.closed = true;
            mem::take(&mut inner.feeds)
        };
        // Senders drop here, outside the lock; each channel closes once.
        drop(drained);
    }

    /// Whether [`Self::drain_all`] has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Whether an entry exists at `key`.
    #[must_use]
    pub fn contains(&self, key: &FeedKey) -> bool {
        self.inner.lock().feeds.contains_key(key)
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().feeds.len()
    }

    /// Whether the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().feeds.is_empty()
    }

    /// Per-kind entry counts.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let inner = self.inner.lock();
        let mut stats = RegistryStats::default();
        for key in inner.feeds.keys() {
            match key.kind {
                TopicKind::Ticker => stats.ticker_feeds += 1,
                TopicKind::Orderbook => stats.orderbook_feeds += 1,
                TopicKind::Trades => stats.trades_feeds += 1,
                TopicKind::Candles => stats.candles_feeds += 1,
            }
        }
        stats
    }

    fn insert(&self, key: FeedKey, sender: FeedSender) -> Result<(), RegistryClosed> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(RegistryClosed);
        }
        // Replacing drops any previous sender, superseding that channel.
        inner.feeds.insert(key, sender);
        Ok(())
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Live entry counts per topic kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Ticker entries.
    pub ticker_feeds: usize,
    /// Order book entries (snapshot and update counted separately).
    pub orderbook_feeds: usize,
    /// Trades entries (snapshot and update counted separately).
    pub trades_feeds: usize,
    /// Candles entries (snapshot and update counted separately).
    pub candles_feeds: usize,
}

impl RegistryStats {
    /// Total number of live entries.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.ticker_feeds + self.orderbook_feeds + self.trades_feeds + self.candles_feeds
    }
}

// =============================================================================
// Tests
// =============================================================================
