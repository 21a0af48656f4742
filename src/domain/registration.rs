use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment lifecycle of a registration as reported by the backend.
///
/// Only the backend moves a registration out of `Pending`, in response to the
/// gateway webhook. The client observes the status, it never writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Pending may move anywhere; a terminal status only ever repeats itself.
    pub fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Pending => true,
            terminal => terminal == next,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// A race category name, checked against the configured list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RaceCategory(String);

impl RaceCategory {
    pub fn parse(raw: &str, allowed: &[String]) -> Result<Self> {
        let candidate = raw.trim();
        allowed
            .iter()
            .find(|category| category.eq_ignore_ascii_case(candidate))
            .map(|category| Self(category.clone()))
            .ok_or_else(|| PaymentError::InvalidCategory(candidate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RaceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Participant profile shared by new and stored registrations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub race_category: String,
    pub shirt_size: String,
}

impl Participant {
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("shirt size", &self.shirt_size),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(PaymentError::ValidationError(format!("Participant {field} is required")));
        }
        if !self.email.contains('@') {
            return Err(PaymentError::ValidationError(format!(
                "'{}' is not a valid email address",
                self.email
            )));
        }
        Ok(())
    }
}

/// Body of a registration creation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRegistration {
    #[serde(flatten)]
    pub participant: Participant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
}

/// A participant's signup record and its payment state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub participant: Participant,
    /// Registration fee in major currency units.
    pub amount: Decimal,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
