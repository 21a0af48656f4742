//! Application layer: the payment confirmation protocol.
//!
//! `PaymentFlow` sequences the pieces for one participant:
//! `CheckoutInitiator` creates the order, `GatewayAdapter` runs the checkout,
//! `PaymentVerifier` checks the signed result, and `ConfirmationPoller` waits
//! for the webhook-backed status. Only the poller can report a payment as paid.

pub mod checkout;
pub mod flow;
pub mod gateway;
pub mod poller;
pub mod session;
pub mod verifier;
