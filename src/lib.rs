//! sheet-relay — forwards chat messages and logs extracted rows.

pub mod channels;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod keepalive;
pub mod router;
pub mod server;
pub mod sheets;
