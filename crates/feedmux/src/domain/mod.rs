//! Domain layer - Feed identity types with no infrastructure dependencies.
//!
//! - `feed`: Topic kinds, payload shapes, and the composite feed key that
//!   identifies a single delivery channel.

pub mod feed;
