use super::order::MinorUnits;
use super::registration::{PaymentStatus, Registration};
use crate::error::PaymentError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The signed triple the gateway hands back when the participant finishes the
/// checkout UI. Proof of a completed UI flow, not of settlement.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedPayment {
    #[serde(alias = "razorpay_order_id")]
    pub order_id: String,
    #[serde(alias = "razorpay_payment_id")]
    pub payment_id: String,
    #[serde(alias = "razorpay_signature")]
    pub signature: String,
}

impl fmt::Debug for SignedPayment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedPayment")
            .field("order_id", &self.order_id)
            .field("payment_id", &self.payment_id)
            .field("signature", &"<redacted>")
            .finish()
    }
}

/// Body of the verification call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[serde(flatten)]
    pub payment: SignedPayment,
    pub registration_id: String,
}

/// The backend's immediate, pre-webhook assessment of a signed payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReceipt {
    pub payment_status: PaymentStatus,
    pub registration_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub payment_status: PaymentStatus,
}

/// Contact details the checkout modal is prefilled with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prefill {
    pub name: String,
    pub email: String,
    pub contact: String,
}

impl From<&Registration> for Prefill {
    fn from(registration: &Registration) -> Self {
        Self {
            name: registration.participant.name.clone(),
            email: registration.participant.email.clone(),
            contact: registration.participant.phone.clone(),
        }
    }
}

/// Everything a checkout session is opened with.
#[derive(Clone, PartialEq, Serialize)]
pub struct CheckoutOptions {
    pub key: String,
    pub amount: MinorUnits,
    pub currency: String,
    pub order_id: String,
    pub name: String,
    pub description: String,
    pub prefill: Prefill,
    pub theme_color: String,
}

impl fmt::Debug for CheckoutOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutOptions")
            .field("amount", &self.amount)
            .field("currency", &self.currency)
            .field("order_id", &self.order_id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// What the SDK itself reports: its `handler` fired, or its modal was closed.
#[derive(Debug, Clone, PartialEq)]
pub enum SdkEvent {
    Handler(SignedPayment),
    ModalDismissed,
}

/// The single outcome of opening a checkout session.
#[derive(Debug)]
pub enum GatewayOutcome {
    /// The participant completed the gateway UI. Still has to be verified and
    /// confirmed by the webhook.
    Completed(SignedPayment),
    /// The participant closed the modal. Retryable, not a failure.
    Dismissed,
    /// The session could not be opened at all.
    Failed(PaymentError),
}

/// Where the payment flow currently stands, as shown to the participant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PaymentPhase {
    #[default]
    Ready,
    Processing,
    Verifying,
    Paid,
    Failed {
        message: String,
    },
}

impl PaymentPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Failed { .. })
    }
}

impl fmt::Display for PaymentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => f.write_str("ready"),
            Self::Processing => f.write_str("processing"),
            Self::Verifying => f.write_str("verifying"),
            Self::Paid => f.write_str("paid"),
            Self::Failed { message } => write!(f, "failed: {message}"),
        }
    }
}
