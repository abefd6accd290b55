//! Stream Routing Adapters
//!
//! Everything between the transport's message loop and a subscriber's typed
//! channel:
//!
//! - `messages`: Wire payload and parameter types
//! - `decoder`: Method table → typed notification
//! - `registry`: The composite-keyed table of live feeds
//! - `dispatcher`: Inbound entry point and the out-of-band error feed
//! - `client`: Subscribe/unsubscribe API, info queries, and shutdown

pub mod client;
pub mod decoder;
pub mod dispatcher;
pub mod messages;
pub mod registry;

pub use client::{ClientError, StreamClient};
pub use decoder::{DecodeError, NotificationDecoder};
pub use dispatcher::{Dispatcher, ErrorFeed};
pub use messages::*;
pub use registry::{Delivery, FeedRegistry, RegistryClosed, RegistryStats};
