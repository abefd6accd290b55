//! Feed Identity Types
//!
//! Domain types identifying a market data feed: the topic kind (ticker,
//! order book, trades, candles), the payload shape (snapshot vs. incremental
//! update), and the instrument symbol. Together they form the composite
//! `FeedKey` under which the registry tracks one delivery channel.
//!
//! # Design
//!
//! The server tags every pushed notification with a method name and embeds
//! the symbol in the payload. A `FeedKey` is the normalized form of that
//! addressing: one key, one channel, one subscriber.

use serde::{Deserialize, Serialize};

// =============================================================================
// Types
// =============================================================================

/// An opaque instrument identifier string (e.g. `"ETHBTC"`).
pub type Symbol = String;

/// Category of market data feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicKind {
    /// Best bid/ask and 24h statistics for a symbol.
    Ticker,
    /// Order book price levels.
    Orderbook,
    /// Executed trades.
    Trades,
    /// OHLCV candles for a timeframe.
    Candles,
}

impl TopicKind {
    /// Get all topic kinds.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Ticker, Self::Orderbook, Self::Trades, Self::Candles]
    }
}

/// Payload shape of a topic.
///
/// Order book, trades, and candles deliver a full `Snapshot` at subscribe
/// time followed by incremental `Update`s. Ticker only ever updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Full state at subscribe time.
    Snapshot,
    /// Incremental delta.
    Update,
}

// =============================================================================
// Feed Key
// =============================================================================

/// Composite key identifying a single delivery channel.
///
/// At most one channel exists per key at any time. Candle feeds do not carry
/// their period in the key: one active period per symbol, a re-subscribe
/// with a different period supersedes the previous channel under the same
/// key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedKey {
    /// Topic kind of the feed.
    pub kind: TopicKind,
    /// Payload shape carried on the channel.
    pub shape: Shape,
    /// Instrument symbol.
    pub symbol: Symbol,
}

impl FeedKey {
    /// Create a key from its parts.
    #[must_use]
    pub fn new(kind: TopicKind, shape: Shape, symbol: impl Into<Symbol>) -> Self {
        Self {
            kind,
            shape,
            symbol: symbol.into(),
        }
    }

    /// Key for a ticker feed (update-only topic).
    #[must_use]
    pub fn ticker(symbol: impl Into<Symbol>) -> Self {
        Self::new(TopicKind::Ticker, Shape::Update, symbol)
    }
}

// =============================================================================
// Candle Periods
// =============================================================================

/// Candle timeframe sent with `subscribeCandles`/`unsubscribeCandles`.
///
/// Open enumeration: the server may accept further periods; the set here
/// mirrors the protocol's published intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CandlePeriod {
    /// 1 minute.
    M1,
    /// 3 minutes.
    M3,
    /// 5 minutes.
    M5,
    /// 15 minutes.
    M15,
    /// 30 minutes.
    M30,
    /// 1 hour.
    H1,
    /// 4 hours.
    H4,
    /// 1 day.
    D1,
    /// 7 days.
    D7,
    /// 1 month.
    #[serde(rename = "1M")]
    Month1,
}

impl CandlePeriod {
    /// Wire spelling of the period.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::M1 => "M1",
            Self::M3 => "M3",
            Self::M5 => "M5",
            Self::M15 => "M15",
            Self::M30 => "M30",
            Self::H1 => "H1",
            Self::H4 => "H4",
            Self::D1 => "D1",
            Self::D7 => "D7",
            Self::Month1 => "1M",
        }
    }
}

impl std::fmt::Display for CandlePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Tests
// =============================================================================
