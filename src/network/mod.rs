//! Network Module
//!
//! TCP server and connection handling.
//!
//! ## Architecture
//! - Single acceptor thread per server
//! - One worker thread per client connection, handling requests sequentially
//! - Requests routed through a [`Handler`] (store or controller dispatcher)

mod connection;
mod server;

pub use connection::Connection;
pub use server::{Handler, Server};
