//! Notification Decoder
//!
//! Maps a notification method name plus raw JSON payload to a typed
//! [`Notification`]. The method table is fixed; methods outside it are
//! ignored rather than rejected, since the server may emit methods this
//! client does not yet understand and the dispatch loop must not stall on
//! them.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::messages::Notification;

// =============================================================================
// Errors
// =============================================================================

/// A recognized notification whose payload did not match its declared shape.
///
/// Carries the method name and the raw payload for out-of-band diagnostics;
/// the symbol may not be recoverable from a malformed payload, so this error
/// is never attributed to a specific subscriber.
#[derive(Debug, thiserror::Error)]
#[error("failed to decode `{method}` notification: {source}")]
pub struct DecodeError {
    /// Method name of the offending notification.
    pub method: String,
    /// Raw payload, kept for diagnostics.
    pub payload: Value,
    /// Underlying deserialization failure.
    #[source]
    pub source: serde_json::Error,
}

// =============================================================================
// Decoder
// =============================================================================

/// Stateless decoder over the fixed notification method table.
#[derive(Debug, Default, Clone)]
pub struct NotificationDecoder;

impl NotificationDecoder {
    /// Create a new decoder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode one inbound notification.
    ///
    /// Returns `Ok(None)` for method names outside the table.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when a recognized method's payload does not
    /// deserialize into its declared shape.
    pub fn decode(
        &self,
        method: &str,
        payload: &Value,
    ) -> Result<Option<Notification>, DecodeError> {
        let decoded = match method {
            "ticker" => Notification::Ticker(parse(method, payload)?),
            "snapshotOrderbook" => Notification::OrderbookSnapshot(parse(method, payload)?),
            "updateOrderbook" => Notification::OrderbookUpdate(parse(method, payload)?),
            "snapshotTrades" => Notification::TradesSnapshot(parse(method, payload)?),
            "updateTrades" => Notification::TradesUpdate(parse(method, payload)?),
            "snapshotCandles" => Notification::CandlesSnapshot(parse(method, payload)?),
            "updateCandles" => Notification::CandlesUpdate(parse(method, payload)?),
            _ => return Ok(None),
        };
        Ok(Some(decoded))
    }
}

fn parse<T: DeserializeOwned>(method: &str, payload: &Value) -> Result<T, DecodeError> {
    serde_json::from_value(payload.clone()).map_err(|source| DecodeError {
        method: method.to_owned(),
        payload: payload.clone(),
        source,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;
    use test_case::test_case;

    use super::*;
    use crate::domain::feed::{Shape, TopicKind};

    fn orderbook_payload() -> Value {
        json!({
            "ask": [{"price": "0.054588", "size": "0.245"}],
            "bid": [{"price": "0.054558", "size": "0.500"}],
            "symbol": "ETHBTC",
            "sequence": 8073827
        })
    }

    fn trades_update_payload() -> Value {
        json!({
            "data": {
                "id": 54469813, "price": "0.054670", "quantity": "0.183",
                "side": "buy", "timestamp": "2017-10-19T16:34:25.041Z"
            },
            "symbol": "ETHBTC"
        })
    }

    fn candles_update_payload() -> Value {
        json!({
            "data": {
                "timestamp": "2017-10-19T16:30:00.000Z",
                "open": "0.054801", "close": "0.054625",
                "min": "0.054601", "max": "0.054894",
                "volume": "380.750", "volumeQuote": "20.844945402"
            },
            "symbol": "BTCUSD",
            "period": "H1"
        })
    }

    #[test_case("snapshotOrderbook", TopicKind::Orderbook, Shape::Snapshot)]
    #[test_case("updateOrderbook", TopicKind::Orderbook, Shape::Update)]
    fn orderbook_methods_map_to_kind_and_shape(method: &str, kind: TopicKind, shape: Shape) {
        let decoder = NotificationDecoder::new();

        let note = decoder
            .decode(method, &orderbook_payload())
            .unwrap()
            .unwrap();

        assert_eq!(note.kind(), kind);
        assert_eq!(note.shape(), shape);
        assert_eq!(note.symbol(), "ETHBTC");
    }

    #[test]
    fn ticker_method_decodes() {
        let decoder = NotificationDecoder::new();
        let payload = json!({
            "ask": "0.054464", "bid": "0.054463", "last": "0.054463",
            "open": "0.057559", "low": "0.053615", "high": "0.057559",
            "volume": "33068.346", "volumeQuote": "1832.687530809",
            "timestamp": "2017-10-19T15:45:44.941Z", "symbol": "ETHBTC"
        });

        let note = decoder.decode("ticker", &payload).unwrap().unwrap();
        assert!(matches!(note, Notification::Ticker(_)));
    }

    #[test]
    fn trades_and_candles_methods_decode() {
        let decoder = NotificationDecoder::new();

        let note = decoder
            .decode("updateTrades", &trades_update_payload())
            .unwrap()
            .unwrap();
        assert!(matches!(note, Notification::TradesUpdate(_)));

        let note = decoder
            .decode("updateCandles", &candles_update_payload())
            .unwrap()
            .unwrap();
        assert!(matches!(note, Notification::CandlesUpdate(_)));
    }

    #[test_case("report")]
    #[test_case("activeOrders")]
    #[test_case("")]
    #[test_case("Ticker")] // method names are case-sensitive
    fn unknown_methods_are_ignored(method: &str) {
        let decoder = NotificationDecoder::new();
        let outcome = decoder.decode(method, &orderbook_payload()).unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn shape_mismatch_yields_decode_error_with_context() {
        let decoder = NotificationDecoder::new();
        let payload = json!({"symbol": "ETHBTC"}); // missing every other field

        let err = decoder.decode("ticker", &payload).unwrap_err();
        assert_eq!(err.method, "ticker");
        assert_eq!(err.payload, payload);
    }

    #[test]
    fn non_object_payload_yields_decode_error() {
        let decoder = NotificationDecoder::new();
        let err = decoder.decode("snapshotTrades", &json!(42)).unwrap_err();
        assert_eq!(err.method, "snapshotTrades");
    }

    proptest! {
        // Forward compatibility: whatever the server invents, methods outside
        // the table are ignored without error.
        #[test]
        fn arbitrary_unknown_methods_never_error(method in "[a-zA-Z0-9_]{1,24}") {
            prop_assume!(![
                "ticker", "snapshotOrderbook", "updateOrderbook",
                "snapshotTrades", "updateTrades", "snapshotCandles",
                "updateCandles",
            ].contains(&method.as_str()));

            let decoder = NotificationDecoder::new();
            let outcome = decoder.decode(&method, &orderbook_payload());
            prop_assert!(matches!(outcome, Ok(None)));
        }

        // Malformed payloads on recognized methods error but never panic.
        #[test]
        fn malformed_payloads_never_panic(garbage in "[ -~]{0,64}") {
            let decoder = NotificationDecoder::new();
            let payload = json!(garbage);
            let _ = decoder.decode("updateOrderbook", &payload);
        }
    }
}
