//! Backend wire format.
//!
//! The dispatch endpoint speaks snake_case keys that differ from the draft's
//! field names; translation happens here and nowhere else.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::draft::{Priority, ValidatedRequest};
use crate::UnixTimeMs;

pub const REFERENCE_PREFIX: &str = "AMB-";
pub const PROVISIONAL_REFERENCE_DIGITS: usize = 6;
pub const GENERIC_DISPATCH_FAILURE: &str = "Failed to create ambulance request";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRequestBody {
    pub emergency_type: String,
    pub contact_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    pub pickup_address: String,
    pub destination_address: String,
    pub customer_condition: String,
    pub priority: Priority,
}

impl From<&ValidatedRequest> for DispatchRequestBody {
    fn from(request: &ValidatedRequest) -> Self {
        Self {
            emergency_type: request.emergency_type.label().to_string(),
            contact_number: request.contact_number.as_str().to_string(),
            customer_email: request.customer_email.clone(),
            pickup_address: request.pickup_address.clone(),
            destination_address: request.destination_address.clone(),
            customer_condition: request.condition.clone(),
            priority: request.priority,
        }
    }
}

/// `requestId` arrives as either a string or a number depending on the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawRequestId {
    Text(String),
    Number(serde_json::Number),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DispatchResponseBody {
    #[serde(rename = "requestId", default)]
    pub request_id: Option<RawRequestId>,
}

impl DispatchResponseBody {
    pub fn issued_id(&self) -> Option<String> {
        let id = match self.request_id.as_ref()? {
            RawRequestId::Text(s) => s.trim().to_string(),
            RawRequestId::Number(n) => n.to_string(),
        };
        (!id.is_empty()).then_some(id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// Best-effort: the `error` field of a JSON body, if there is a non-blank one.
pub fn extract_error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProfileResponseBody {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Identifier shown to the caller after a successful dispatch.
///
/// `Provisional` references are made up on the device when the backend did
/// not return an id. They can collide with real ids, so they stay a distinct
/// case all the way to the view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RequestReference {
    Issued(String),
    Provisional(String),
}

impl RequestReference {
    pub fn from_response(body: &DispatchResponseBody, now: UnixTimeMs) -> Self {
        match body.issued_id() {
            Some(id) => Self::Issued(id),
            None => Self::provisional(now),
        }
    }

    /// Last six digits of the millisecond timestamp, zero padded.
    pub fn provisional(now: UnixTimeMs) -> Self {
        let digits = now.0.to_string();
        let tail = &digits[digits.len().saturating_sub(PROVISIONAL_REFERENCE_DIGITS)..];
        Self::Provisional(format!("{tail:0>width$}", width = PROVISIONAL_REFERENCE_DIGITS))
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Issued(id) | Self::Provisional(id) => id,
        }
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, Self::Provisional(_))
    }

    pub fn display(&self) -> String {
        format!("{REFERENCE_PREFIX}{}", self.id())
    }
}

impl fmt::Display for RequestReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{REFERENCE_PREFIX}{}", self.id())
    }
}
