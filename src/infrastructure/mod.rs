//! Adapters for the ports in `domain::ports`.

pub mod http;
pub mod in_memory;
#[cfg(feature = "session-rocksdb")]
pub mod rocksdb;
pub mod terminal_checkout;
