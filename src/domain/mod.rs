//! Domain types and the ports the payment core talks through.

pub mod order;
pub mod payment;
pub mod ports;
pub mod registration;
