use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::domain::ScholarshipId;

/// Currency amount in integer minor units (cents for two-decimal
/// currencies). Arithmetic stays in integers end to end; decimal input is
/// parsed digit-wise, never multiplied as a float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MinorUnits(pub u64);

/// Error raised while parsing a decimal amount.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount '{0}' is not a valid decimal number")]
    Malformed(String),
    #[error("amount '{0}' has more than two fraction digits")]
    TooPrecise(String),
    #[error("amount '{0}' exceeds the representable range")]
    Overflow(String),
}

impl MinorUnits {
    /// Parse a decimal string such as `"1250"`, `"12.5"`, or `"12.50"` into
    /// minor units, accepting at most two fraction digits.
    pub fn parse_decimal(raw: &str) -> Result<Self, AmountError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AmountError::Malformed(raw.to_string()));
        }

        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (trimmed, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(AmountError::Malformed(raw.to_string()));
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(AmountError::Malformed(raw.to_string()));
        }
        if fraction.len() > 2 {
            return Err(AmountError::TooPrecise(raw.to_string()));
        }

        let whole_units: u64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| AmountError::Overflow(raw.to_string()))?
        };

        let mut cents: u64 = 0;
        for digit in fraction.chars() {
            cents = cents * 10 + u64::from(digit as u8 - b'0');
        }
        if fraction.len() == 1 {
            cents *= 10;
        }

        whole_units
            .checked_mul(100)
            .and_then(|minor| minor.checked_add(cents))
            .map(MinorUnits)
            .ok_or_else(|| AmountError::Overflow(raw.to_string()))
    }
}

impl fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Request to open a hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub title: String,
    pub amount: MinorUnits,
    pub currency: String,
    pub scholarship_id: ScholarshipId,
    pub student_email: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Handle returned by the gateway; `url` is the redirect target for the
/// client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Open,
    Complete,
    Expired,
}

/// Snapshot of a checkout session as reported by the gateway. The gateway is
/// the sole source of truth for settlement; the application store is never
/// trusted for that fact until the gateway confirms it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDetails {
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    pub scholarship_id: ScholarshipId,
    pub student_email: String,
}

/// Gateway dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("payment gateway unreachable: {0}")]
    Unreachable(String),
    #[error("checkout session not known to the gateway")]
    UnknownSession,
}

/// Outbound port to the hosted checkout provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError>;

    /// Pure read; callers may retry the same session id after a failure.
    async fn retrieve_session(&self, session_id: &str) -> Result<SessionDetails, GatewayError>;
}
