//! Notification and Request Wire Types
//!
//! Wire format types for the market data stream: the payloads of pushed
//! notifications (one snapshot/update pair per topic), the parameter objects
//! sent with subscribe/unsubscribe and info calls, and the [`Notification`]
//! sum type the decoder produces.
//!
//! Prices and quantities arrive as decimal strings and are mapped to
//! [`rust_decimal::Decimal`]; timestamps are ISO 8601 and map to
//! [`chrono::DateTime<Utc>`].
//!
//! # Notification Methods
//!
//! | method              | payload                |
//! |---------------------|------------------------|
//! | `ticker`            | [`TickerUpdate`]       |
//! | `snapshotOrderbook` | [`OrderbookSnapshot`]  |
//! | `updateOrderbook`   | [`OrderbookUpdate`]    |
//! | `snapshotTrades`    | [`TradesSnapshot`]     |
//! | `updateTrades`      | [`TradesUpdate`]       |
//! | `snapshotCandles`   | [`CandlesSnapshot`]    |
//! | `updateCandles`     | [`CandlesUpdate`]      |

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::feed::{CandlePeriod, FeedKey, Shape, Symbol, TopicKind};

// =============================================================================
// Ticker
// =============================================================================

/// Ticker notification for one symbol.
///
/// # Wire Format (JSON)
/// ```json
/// {
///   "ask": "0.054464", "bid": "0.054463", "last": "0.054463",
///   "open": "0.057559", "low": "0.053615", "high": "0.057559",
///   "volume": "33068.346", "volumeQuote": "1832.687530809",
///   "timestamp": "2017-10-19T15:45:44.941Z", "symbol": "ETHBTC"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerUpdate {
    /// Best ask price.
    pub ask: Decimal,
    /// Best bid price.
    pub bid: Decimal,
    /// Last trade price.
    pub last: Decimal,
    /// Last trade price 24 hours ago.
    pub open: Decimal,
    /// Lowest trade price within 24 hours.
    pub low: Decimal,
    /// Highest trade price within 24 hours.
    pub high: Decimal,
    /// Total traded amount within 24 hours in base currency.
    pub volume: Decimal,
    /// Total traded amount within 24 hours in quote currency.
    pub volume_quote: Decimal,
    /// Last update or refresh timestamp.
    pub timestamp: DateTime<Utc>,
    /// Instrument symbol.
    pub symbol: Symbol,
}

// =============================================================================
// Order Book
// =============================================================================

/// One price level of an order book side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderbookLevel {
    /// Level price.
    pub price: Decimal,
    /// Level size; zero in an update means the level was removed.
    pub size: Decimal,
}

/// Full order book state at subscribe time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderbookSnapshot {
    /// Ask side levels.
    pub ask: Vec<OrderbookLevel>,
    /// Bid side levels.
    pub bid: Vec<OrderbookLevel>,
    /// Instrument symbol.
    pub symbol: Symbol,
    /// Monotonic sequence number for ordering against updates.
    pub sequence: u64,
}

/// Incremental order book delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderbookUpdate {
    /// Changed ask levels.
    pub ask: Vec<OrderbookLevel>,
    /// Changed bid levels.
    pub bid: Vec<OrderbookLevel>,
    /// Instrument symbol.
    pub symbol: Symbol,
    /// Monotonic sequence number for ordering against the snapshot.
    pub sequence: u64,
}

// =============================================================================
// Trades
// =============================================================================

/// Aggressor side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    /// Taker bought.
    Buy,
    /// Taker sold.
    Sell,
}

/// A single executed trade.
///
/// # Wire Format (JSON)
/// ```json
/// {
///   "id": 54469813, "price": "0.054670", "quantity": "0.183",
///   "side": "buy", "timestamp": "2017-10-19T16:34:25.041Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Server-assigned trade identifier.
    pub id: u64,
    /// Execution price.
    pub price: Decimal,
    /// Executed quantity.
    pub quantity: Decimal,
    /// Aggressor side.
    pub side: TradeSide,
    /// Execution timestamp.
    pub timestamp: DateTime<Utc>,
}

/// Recent trades delivered at subscribe time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradesSnapshot {
    /// Trade list, most recent last.
    pub data: Vec<Trade>,
    /// Instrument symbol.
    pub symbol: Symbol,
}

/// One newly executed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradesUpdate {
    /// The trade.
    pub data: Trade,
    /// Instrument symbol.
    pub symbol: Symbol,
}

// =============================================================================
// Candles
// =============================================================================

/// One OHLCV candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candle {
    /// Candle open time.
    pub timestamp: DateTime<Utc>,
    /// Open price.
    pub open: Decimal,
    /// Close price.
    pub close: Decimal,
    /// Lowest price of the interval.
    pub min: Decimal,
    /// Highest price of the interval.
    pub max: Decimal,
    /// Traded amount in base currency.
    pub volume: Decimal,
    /// Traded amount in quote currency.
    pub volume_quote: Decimal,
}

/// Candle history delivered at subscribe time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandlesSnapshot {
    /// Candle list, oldest first.
    pub data: Vec<Candle>,
    /// Instrument symbol.
    pub symbol: Symbol,
    /// Timeframe of the candles.
    pub period: CandlePeriod,
}

/// Refresh of the currently forming candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandlesUpdate {
    /// The candle.
    pub data: Candle,
    /// Instrument symbol.
    pub symbol: Symbol,
    /// Timeframe of the candle.
    pub period: CandlePeriod,
}

// =============================================================================
// Decoded Notification
// =============================================================================

/// A decoded inbound notification, one variant per (topic, shape).
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// `ticker` notification.
    Ticker(TickerUpdate),
    /// `snapshotOrderbook` notification.
    OrderbookSnapshot(OrderbookSnapshot),
    /// `updateOrderbook` notification.
    OrderbookUpdate(OrderbookUpdate),
    /// `snapshotTrades` notification.
    TradesSnapshot(TradesSnapshot),
    /// `updateTrades` notification.
    TradesUpdate(TradesUpdate),
    /// `snapshotCandles` notification.
    CandlesSnapshot(CandlesSnapshot),
    /// `updateCandles` notification.
    CandlesUpdate(CandlesUpdate),
}

impl Notification {
    /// Symbol embedded in the payload.
    #[must_use]
    pub fn symbol(&self) -> &str {
        match self {
            Self::Ticker(msg) => &msg.symbol,
            Self::OrderbookSnapshot(msg) => &msg.symbol,
            Self::OrderbookUpdate(msg) => &msg.symbol,
            Self::TradesSnapshot(msg) => &msg.symbol,
            Self::TradesUpdate(msg) => &msg.symbol,
            Self::CandlesSnapshot(msg) => &msg.symbol,
            Self::CandlesUpdate(msg) => &msg.symbol,
        }
    }

    /// Topic kind of the notification.
    #[must_use]
    pub const fn kind(&self) -> TopicKind {
        match self {
            Self::Ticker(_) => TopicKind::Ticker,
            Self::OrderbookSnapshot(_) | Self::OrderbookUpdate(_) => TopicKind::Orderbook,
            Self::TradesSnapshot(_) | Self::TradesUpdate(_) => TopicKind::Trades,
            Self::CandlesSnapshot(_) | Self::CandlesUpdate(_) => TopicKind::Candles,
        }
    }

    /// Payload shape of the notification.
    #[must_use]
    pub const fn shape(&self) -> Shape {
        match self {
            Self::OrderbookSnapshot(_) | Self::TradesSnapshot(_) | Self::CandlesSnapshot(_) => {
                Shape::Snapshot
            }
            Self::Ticker(_)
            | Self::OrderbookUpdate(_)
            | Self::TradesUpdate(_)
            | Self::CandlesUpdate(_) => Shape::Update,
        }
    }

    /// Registry key this notification routes to.
    #[must_use]
    pub fn key(&self) -> FeedKey {
        FeedKey::new(self.kind(), self.shape(), self.symbol())
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Parameters of `subscribe<Topic>`/`unsubscribe<Topic>` calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    /// Instrument symbol.
    pub symbol: Symbol,
}

/// Parameters of `subscribeCandles`/`unsubscribeCandles` calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandlesSubscribeRequest {
    /// Instrument symbol.
    pub symbol: Symbol,
    /// Candle timeframe.
    pub period: CandlePeriod,
}

/// Parameters of the `getCurrency` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetCurrencyRequest {
    /// Currency identifier.
    pub currency: String,
}

/// Parameters of the `getSymbol` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetSymbolRequest {
    /// Instrument symbol.
    pub symbol: Symbol,
}

/// Parameters of the `getTrades` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradesQuery {
    /// Instrument symbol.
    pub symbol: Symbol,
    /// Maximum number of trades to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Sort direction (`"ASC"` or `"DESC"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    /// Filter field (`"timestamp"` or `"id"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
    /// Lower filter bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    /// Upper filter bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub till: Option<DateTime<Utc>>,
    /// Pagination offset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
}

impl TradesQuery {
    /// Query for a symbol with no filters.
    #[must_use]
    pub fn new(symbol: impl Into<Symbol>) -> Self {
        Self {
            symbol: symbol.into(),
            limit: None,
            sort: None,
            by: None,
            from: None,
            till: None,
            offset: None,
        }
    }
}

// =============================================================================
// Info Query Responses
// =============================================================================

/// Currency metadata returned by `getCurrency`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyInfo {
    /// Currency identifier.
    pub id: String,
    /// Display name.
    #[serde(rename = "fullname")]
    pub full_name: String,
    /// Whether the currency is a cryptocurrency.
    pub crypto: bool,
    /// Deposits enabled.
    pub payin_enabled: bool,
    /// Deposits require a payment identifier.
    pub payin_payment_id: bool,
    /// Confirmations required to credit a deposit.
    pub payin_confirmations: u32,
    /// Withdrawals enabled.
    pub payout_enabled: bool,
    /// Withdrawals require a payment identifier.
    pub payout_is_payment_id: bool,
    /// Internal transfers enabled.
    pub transfer_enabled: bool,
    /// Currency delisted.
    pub delisted: bool,
    /// Flat withdrawal fee.
    pub payout_fee: Decimal,
}

/// Instrument metadata returned by `getSymbol`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    /// Instrument symbol.
    pub id: Symbol,
    /// Base currency identifier.
    pub base_currency: String,
    /// Quote currency identifier.
    pub quote_currency: String,
    /// Minimum quantity step.
    pub quantity_increment: Decimal,
    /// Minimum price step.
    pub tick_size: Decimal,
    /// Taker fee rate.
    pub take_liquidity_rate: Decimal,
    /// Maker fee rate.
    pub provide_liquidity_rate: Decimal,
    /// Currency fees are charged in.
    pub fee_currency: String,
}

/// Trade history page returned by `getTrades`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradesPage {
    /// Returned trades.
    pub data: Vec<Trade>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn ticker_update_decodes_wire_format() {
        let payload = json!({
            "ask": "0.054464", "bid": "0.054463", "last": "0.054463",
            "open": "0.057559", "low": "0.053615", "high": "0.057559",
            "volume": "33068.346", "volumeQuote": "1832.687530809",
            "timestamp": "2017-10-19T15:45:44.941Z", "symbol": "ETHBTC"
        });

        let msg: TickerUpdate = serde_json::from_value(payload).unwrap();
        assert_eq!(msg.symbol, "ETHBTC");
        assert_eq!(msg.ask.to_string(), "0.054464");
        assert_eq!(msg.volume_quote.to_string(), "1832.687530809");
    }

    #[test]
    fn trade_side_decodes_lowercase() {
        let trade: Trade = serde_json::from_value(json!({
            "id": 54469813, "price": "0.054670", "quantity": "0.183",
            "side": "buy", "timestamp": "2017-10-19T16:34:25.041Z"
        }))
        .unwrap();

        assert_eq!(trade.side, TradeSide::Buy);
        assert_eq!(trade.id, 54_469_813);
    }

    #[test]
    fn candles_snapshot_carries_period() {
        let msg: CandlesSnapshot = serde_json::from_value(json!({
            "data": [{
                "timestamp": "2017-10-19T16:30:00.000Z",
                "open": "0.054801", "close": "0.054625",
                "min": "0.054601", "max": "0.054894",
                "volume": "380.750", "volumeQuote": "20.844945402"
            }],
            "symbol": "ETHBTC",
            "period": "M30"
        }))
        .unwrap();

        assert_eq!(msg.period, CandlePeriod::M30);
        assert_eq!(msg.data.len(), 1);
    }

    #[test]
    fn notification_key_follows_variant() {
        let snapshot = Notification::OrderbookSnapshot(OrderbookSnapshot {
            ask: vec![],
            bid: vec![],
            symbol: "ETHBTC".to_string(),
            sequence: 1,
        });

        let key = snapshot.key();
        assert_eq!(key.kind, TopicKind::Orderbook);
        assert_eq!(key.shape, Shape::Snapshot);
        assert_eq!(key.symbol, "ETHBTC");
    }

    #[test]
    fn ticker_notification_is_update_shaped() {
        let payload = json!({
            "ask": "1", "bid": "1", "last": "1", "open": "1", "low": "1",
            "high": "1", "volume": "1", "volumeQuote": "1",
            "timestamp": "2017-10-19T15:45:44.941Z", "symbol": "BTCUSD"
        });
        let msg: TickerUpdate = serde_json::from_value(payload).unwrap();
        let note = Notification::Ticker(msg);

        assert_eq!(note.shape(), Shape::Update);
        assert_eq!(note.kind(), TopicKind::Ticker);
        assert_eq!(note.symbol(), "BTCUSD");
    }

    #[test]
    fn trades_query_omits_unset_filters() {
        let params = serde_json::to_value(TradesQuery::new("ETHBTC")).unwrap();
        assert_eq!(params, json!({"symbol": "ETHBTC"}));
    }

    #[test]
    fn candles_subscribe_request_spells_period() {
        let params = serde_json::to_value(CandlesSubscribeRequest {
            symbol: "BTCUSD".to_string(),
            period: CandlePeriod::H1,
        })
        .unwrap();

        assert_eq!(params, json!({"symbol": "BTCUSD", "period": "H1"}));
    }

    #[test]
    fn currency_info_decodes_wire_names() {
        let msg: CurrencyInfo = serde_json::from_value(json!({
            "id": "ETH", "fullname": "Ethereum", "crypto": true,
            "payinEnabled": true, "payinPaymentId": false,
            "payinConfirmations": 20, "payoutEnabled": true,
            "payoutIsPaymentId": false, "transferEnabled": true,
            "delisted": false, "payoutFee": "0.042"
        }))
        .unwrap();

        assert_eq!(msg.full_name, "Ethereum");
        assert_eq!(msg.payin_confirmations, 20);
        assert_eq!(msg.payout_fee.to_string(), "0.042");
    }

    #[test]
    fn symbol_info_decodes_wire_names() {
        let msg: SymbolInfo = serde_json::from_value(json!({
            "id": "ETHBTC", "baseCurrency": "ETH", "quoteCurrency": "BTC",
            "quantityIncrement": "0.001", "tickSize": "0.000001",
            "takeLiquidityRate": "0.001", "provideLiquidityRate": "-0.0001",
            "feeCurrency": "BTC"
        }))
        .unwrap();

        assert_eq!(msg.base_currency, "ETH");
        assert_eq!(msg.tick_size.to_string(), "0.000001");
    }
}
