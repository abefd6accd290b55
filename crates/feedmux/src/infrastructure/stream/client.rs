//! Stream Client
//!
//! The outward-facing API of the router: per-topic subscribe/unsubscribe
//! calls, typed info queries over the same correlated-call contract, the
//! error feed accessor, and connection shutdown.
//!
//! # Subscription Contract
//!
//! Every `subscribe<Topic>`/`unsubscribe<Topic>` call is acknowledged by the
//! server with a boolean result. A subscribe only provisions delivery
//! channels after a `true` ack; on a transport failure, a malformed ack, or
//! a `false` ack the registry is left untouched. An unsubscribe releases its
//! channels on *any* received response, whatever the boolean says — once the
//! server has acknowledged the request in any form, no further messages are
//! expected and holding the channel open would leak it.
//!
//! Calls suspend the calling task until the transport round trip completes;
//! no deadline is imposed here. Deadline semantics, request correlation, and
//! reconnection all belong to the transport collaborator.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;

use super::decoder::DecodeError;
use super::dispatcher::{Dispatcher, ErrorFeed};
use super::messages::{
    CandlesSnapshot, CandlesSubscribeRequest, CandlesUpdate, CurrencyInfo, GetCurrencyRequest,
    GetSymbolRequest, OrderbookSnapshot, OrderbookUpdate, SubscribeRequest, SymbolInfo,
    TickerUpdate, TradesPage, TradesQuery, TradesSnapshot, TradesUpdate,
};
use super::registry::{FeedRegistry, RegistryStats};
use crate::application::ports::{RpcTransport, TransportError};
use crate::domain::feed::{CandlePeriod, FeedKey, Shape, TopicKind};

// =============================================================================
// Errors
// =============================================================================

/// Failure of a client operation, annotated with the operation name.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The correlated transport call failed; nothing was changed.
    #[error("{op} call failed: {source}")]
    Transport {
        /// Operation (method) name.
        op: &'static str,
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// The server acknowledged the subscription with `false`.
    #[error("{op} rejected by server")]
    Rejected {
        /// Operation (method) name.
        op: &'static str,
    },

    /// Parameters failed to encode or the result failed to decode.
    #[error("{op} payload error: {source}")]
    Codec {
        /// Operation (method) name.
        op: &'static str,
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },

    /// The client has been shut down.
    #[error("client is shut down")]
    Closed,
}

// =============================================================================
// Stream Client
// =============================================================================

/// Subscription-multiplexed client over one RPC connection.
///
/// Owns the feed registry and the dispatcher; the transport collaborator is
/// handed [`Self::handler`] as its out-of-band message sink and consulted
/// for every control call.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use feedmux::{RpcTransport, StreamClient};
///
/// async fn run(transport: Arc<dyn RpcTransport>) -> Result<(), Box<dyn std::error::Error>> {
///     let client = StreamClient::new(transport);
///     // hand client.handler() to the transport's notification loop, then:
///     let mut ticker = client.subscribe_ticker("ETHBTC").await?;
///     while let Some(update) = ticker.recv().await {
///         println!("{}: {}", update.symbol, update.last);
///     }
///     Ok(())
/// }
/// ```
pub struct StreamClient {
    transport: Arc<dyn RpcTransport>,
    registry: Arc<FeedRegistry>,
    dispatcher: Arc<Dispatcher>,
    errors: Arc<ErrorFeed>,
}

impl StreamClient {
    /// Create a client over a transport.
    #[must_use]
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        let registry = Arc::new(FeedRegistry::new());
        let errors = Arc::new(ErrorFeed::new());
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&registry), Arc::clone(&errors)));
        Self {
            transport,
            registry,
            dispatcher,
            errors,
        }
    }

    /// The inbound-message handler to register with the transport.
    #[must_use]
    pub fn handler(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// Take the out-of-band error feed. Returns `None` if already taken.
    pub fn error_feed(&self) -> Option<mpsc::UnboundedReceiver<DecodeError>> {
        self.errors.take_receiver()
    }

    /// Live feed counts per topic kind.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    // =========================================================================
    // Ticker
    // =========================================================================

    /// Subscribe to ticker notifications for a symbol.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure, a rejected
    /// subscription, a malformed acknowledgment, or after shutdown.
    pub async fn subscribe_ticker(
        &self,
        symbol: &str,
    ) -> Result<mpsc::UnboundedReceiver<TickerUpdate>, ClientError> {
        self.guard_open()?;
        self.subscription_call("subscribeTicker", &subscribe_params(symbol))
            .await?;
        let updates = self
            .registry
            .open_ticker(symbol)
            .map_err(|_| ClientError::Closed)?;
        tracing::debug!(symbol, "ticker subscription active");
        Ok(updates)
    }

    /// Unsubscribe from ticker notifications and close the feed.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] only when the transport call itself fails;
    /// the feed is then left open.
    pub async fn unsubscribe_ticker(&self, symbol: &str) -> Result<(), ClientError> {
        self.guard_open()?;
        self.release_call("unsubscribeTicker", &subscribe_params(symbol))
            .await?;
        self.registry.remove(&FeedKey::ticker(symbol));
        Ok(())
    }

    // =========================================================================
    // Trades
    // =========================================================================

    /// Subscribe to trade notifications for a symbol.
    ///
    /// Returns the update feed and the snapshot feed delivered at subscribe
    /// time.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure, a rejected
    /// subscription, a malformed acknowledgment, or after shutdown.
    pub async fn subscribe_trades(
        &self,
        symbol: &str,
    ) -> Result<
        (
            mpsc::UnboundedReceiver<TradesUpdate>,
            mpsc::UnboundedReceiver<TradesSnapshot>,
        ),
        ClientError,
    > {
        self.guard_open()?;
        self.subscription_call("subscribeTrades", &subscribe_params(symbol))
            .await?;
        let updates = self
            .registry
            .open_trades_update(symbol)
            .map_err(|_| ClientError::Closed)?;
        let snapshots = self
            .registry
            .open_trades_snapshot(symbol)
            .map_err(|_| ClientError::Closed)?;
        tracing::debug!(symbol, "trades subscription active");
        Ok((updates, snapshots))
    }

    /// Unsubscribe from trade notifications and close both feeds.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] only when the transport call itself fails.
    pub async fn unsubscribe_trades(&self, symbol: &str) -> Result<(), ClientError> {
        self.guard_open()?;
        self.release_call("unsubscribeTrades", &subscribe_params(symbol))
            .await?;
        self.registry
            .remove(&FeedKey::new(TopicKind::Trades, Shape::Update, symbol));
        self.registry
            .remove(&FeedKey::new(TopicKind::Trades, Shape::Snapshot, symbol));
        Ok(())
    }

    // =========================================================================
    // Order Book
    // =========================================================================

    /// Subscribe to order book notifications for a symbol.
    ///
    /// Returns the update feed and the snapshot feed delivered at subscribe
    /// time.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure, a rejected
    /// subscription, a malformed acknowledgment, or after shutdown.
    pub async fn subscribe_orderbook(
        &self,
        symbol: &str,
    ) -> Result<
        (
            mpsc::UnboundedReceiver<OrderbookUpdate>,
            mpsc::UnboundedReceiver<OrderbookSnapshot>,
        ),
        ClientError,
    > {
        self.guard_open()?;
        self.subscription_call("subscribeOrderbook", &subscribe_params(symbol))
            .await?;
        let updates = self
            .registry
            .open_orderbook_update(symbol)
            .map_err(|_| ClientError::Closed)?;
        let snapshots = self
            .registry
            .open_orderbook_snapshot(symbol)
            .map_err(|_| ClientError::Closed)?;
        tracing::debug!(symbol, "orderbook subscription active");
        Ok((updates, snapshots))
    }

    /// Unsubscribe from order book notifications and close both feeds.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] only when the transport call itself fails.
    pub async fn unsubscribe_orderbook(&self, symbol: &str) -> Result<(), ClientError> {
        self.guard_open()?;
        self.release_call("unsubscribeOrderbook", &subscribe_params(symbol))
            .await?;
        self.registry
            .remove(&FeedKey::new(TopicKind::Orderbook, Shape::Update, symbol));
        self.registry
            .remove(&FeedKey::new(TopicKind::Orderbook, Shape::Snapshot, symbol));
        Ok(())
    }

    // =========================================================================
    // Candles
    // =========================================================================

    /// Subscribe to candle notifications for a symbol and timeframe.
    ///
    /// One active timeframe per symbol: re-subscribing the same symbol with
    /// a different period supersedes the previous channels under the same
    /// registry key.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure, a rejected
    /// subscription, a malformed acknowledgment, or after shutdown.
    pub async fn subscribe_candles(
        &self,
        symbol: &str,
        period: CandlePeriod,
    ) -> Result<
        (
            mpsc::UnboundedReceiver<CandlesUpdate>,
            mpsc::UnboundedReceiver<CandlesSnapshot>,
        ),
        ClientError,
    > {
        self.guard_open()?;
        self.subscription_call(
            "subscribeCandles",
            &CandlesSubscribeRequest {
                symbol: symbol.to_owned(),
                period,
            },
        )
        .await?;
        let updates = self
            .registry
            .open_candles_update(symbol)
            .map_err(|_| ClientError::Closed)?;
        let snapshots = self
            .registry
            .open_candles_snapshot(symbol)
            .map_err(|_| ClientError::Closed)?;
        tracing::debug!(symbol, period = %period, "candles subscription active");
        Ok((updates, snapshots))
    }

    /// Unsubscribe from candle notifications and close both feeds.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] only when the transport call itself fails.
    pub async fn unsubscribe_candles(
        &self,
        symbol: &str,
        period: CandlePeriod,
    ) -> Result<(), ClientError> {
        self.guard_open()?;
        self.release_call(
            "unsubscribeCandles",
            &CandlesSubscribeRequest {
                symbol: symbol.to_owned(),
                period,
            },
        )
        .await?;
        self.registry
            .remove(&FeedKey::new(TopicKind::Candles, Shape::Update, symbol));
        self.registry
            .remove(&FeedKey::new(TopicKind::Candles, Shape::Snapshot, symbol));
        Ok(())
    }

    // =========================================================================
    // Info Queries
    // =========================================================================

    /// Fetch currency metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure or a malformed result.
    pub async fn get_currency(&self, currency: &str) -> Result<CurrencyInfo, ClientError> {
        self.call(
            "getCurrency",
            &GetCurrencyRequest {
                currency: currency.to_owned(),
            },
        )
        .await
    }

    /// Fetch instrument metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure or a malformed result.
    pub async fn get_symbol(&self, symbol: &str) -> Result<SymbolInfo, ClientError> {
        self.call(
            "getSymbol",
            &GetSymbolRequest {
                symbol: symbol.to_owned(),
            },
        )
        .await
    }

    /// Fetch a page of trade history.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure or a malformed result.
    pub async fn get_trades(&self, query: &TradesQuery) -> Result<TradesPage, ClientError> {
        self.call("getTrades", query).await
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Shut the client down.
    ///
    /// Closes the transport connection, closes every still-open delivery
    /// channel exactly once and empties the registry, then closes the error
    /// feed last and reinstalls a fresh one. Single-shot by contract;
    /// subscriptions issued afterwards fail with [`ClientError::Closed`] —
    /// shutdown takes precedence over any subscribe still in flight.
    pub async fn shutdown(&self) {
        tracing::info!("shutting down stream client");
        self.transport.close_connection().await;
        self.registry.drain_all();
        self.errors.reset();
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn guard_open(&self) -> Result<(), ClientError> {
        if self.registry.is_closed() {
            return Err(ClientError::Closed);
        }
        Ok(())
    }

    /// Issue a correlated call and decode its typed result.
    async fn call<P, R>(&self, op: &'static str, params: &P) -> Result<R, ClientError>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        let params = serde_json::to_value(params).map_err(|source| ClientError::Codec { op, source })?;
        let result = self
            .transport
            .call(op, params)
            .await
            .map_err(|source| ClientError::Transport { op, source })?;
        serde_json::from_value(result).map_err(|source| ClientError::Codec { op, source })
    }

    /// Issue a subscribe-style call and interpret its boolean acknowledgment.
    async fn subscription_call<P>(&self, op: &'static str, params: &P) -> Result<(), ClientError>
    where
        P: Serialize + Sync,
    {
        let accepted: bool = self.call(op, params).await?;
        if accepted {
            Ok(())
        } else {
            Err(ClientError::Rejected { op })
        }
    }

    /// Issue an unsubscribe-style call; any received response counts.
    async fn release_call<P>(&self, op: &'static str, params: &P) -> Result<(), ClientError>
    where
        P: Serialize + Sync,
    {
        let params = serde_json::to_value(params).map_err(|source| ClientError::Codec { op, source })?;
        self.transport
            .call(op, params)
            .await
            .map_err(|source| ClientError::Transport { op, source })?;
        Ok(())
    }
}

fn subscribe_params(symbol: &str) -> SubscribeRequest {
    SubscribeRequest {
        symbol: symbol.to_owned(),
    }
}

// =============================================================================
// Tests
// =============================================================================
