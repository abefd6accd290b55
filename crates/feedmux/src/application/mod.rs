//! Application layer - Port definitions.
//!
//! - `ports`: Contracts between the router and its transport collaborator.

pub mod ports;
