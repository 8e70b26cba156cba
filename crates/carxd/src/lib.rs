//! Car Expert daemon library
//!
//! The router and state live here so integration tests can drive them
//! without binding a socket.

pub mod metrics;
pub mod routes;
pub mod server;
