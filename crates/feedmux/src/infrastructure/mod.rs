//! Infrastructure layer - Adapters over the transport boundary.
//!
//! - `stream`: Notification wire types, decoder, dispatcher, feed registry,
//!   and the outward-facing stream client.

pub mod stream;
