use super::registration::RaceCategory;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An amount in the gateway's smallest currency unit (e.g. paise).
///
/// This is the only unit the checkout session is opened with. It always comes
/// from the backend; the client never computes a charge itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinorUnits(u64);

impl MinorUnits {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// The same amount in major units, for display.
    pub fn to_major(self) -> Decimal {
        Decimal::from(self.0) / Decimal::ONE_HUNDRED
    }
}

impl fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.to_major())
    }
}

/// Order creation request for one payment attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub race_category: RaceCategory,
    pub registration_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
}

/// Gateway-side payment intent. One per attempt, immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,
    pub currency: String,
    /// Registration fee after any coupon, in major units.
    pub base_amount: Decimal,
    /// Gateway pass-through fee, in major units.
    pub gateway_fee: Decimal,
    /// What the participant is actually billed.
    pub charged_amount: MinorUnits,
    #[serde(default)]
    pub registration_id: String,
}
