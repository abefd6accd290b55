#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::default_trait_access
    )
)]

//! feedmux - Market Data Notification Router
//!
//! A subscription-multiplexed notification router over a single long-lived
//! bidirectional RPC connection to a market data server. The server pushes
//! notifications (ticker, trades, order book deltas, candles) tagged by
//! method name with the instrument symbol embedded in the payload; feedmux
//! correlates subscribe/unsubscribe calls with their acknowledgments,
//! demultiplexes every inbound notification to the right per-symbol typed
//! channel, and tears everything down cleanly on unsubscribe or shutdown.
//!
//! The transport itself (framing, request correlation, authentication) is a
//! collaborator behind the [`RpcTransport`] port; feedmux plugs its
//! [`Dispatcher`] into the transport's message loop via [`NotificationSink`].
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Feed identity types
//!   - `feed`: Topic kinds, payload shapes, composite feed keys, periods
//!
//! - **Application**: Port definitions
//!   - `ports`: `RpcTransport` (outbound calls), `NotificationSink` (inbound)
//!
//! - **Infrastructure**: Stream routing adapters
//!   - `stream`: Wire types, decoder, registry, dispatcher, client
//!
//! # Data Flow
//!
//! ```text
//!                          ┌────────────┐     ┌──────────────┐──▸ ticker ETHBTC
//! RPC transport ──(method,─▸ Dispatcher ├────▸│ FeedRegistry │──▸ trades ETHBTC
//!      ▴           payload)└──────┬─────┘     └──────────────┘──▸ candles BTCUSD
//!      │                          └──▸ error feed (decode failures)
//!      └── subscribe/unsubscribe calls ◂── StreamClient ◂── caller
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Feed identity types with no infrastructure dependencies.
pub mod domain;

/// Application layer - Port definitions.
pub mod application;

/// Infrastructure layer - Adapters over the transport boundary.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::feed::{CandlePeriod, FeedKey, Shape, Symbol, TopicKind};

// Ports
pub use application::ports::{NotificationSink, RpcTransport, TransportError};

// Stream routing
pub use infrastructure::stream::{
    Candle, CandlesSnapshot, CandlesSubscribeRequest, CandlesUpdate, ClientError, CurrencyInfo,
    DecodeError, Delivery, Dispatcher, ErrorFeed, FeedRegistry, GetCurrencyRequest,
    GetSymbolRequest, Notification, NotificationDecoder, OrderbookLevel, OrderbookSnapshot,
    OrderbookUpdate, RegistryClosed, RegistryStats, StreamClient, SubscribeRequest, SymbolInfo,
    TickerUpdate, Trade, TradeSide, TradesPage, TradesQuery, TradesSnapshot, TradesUpdate,
};
