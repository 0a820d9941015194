use serde::{Deserialize, Serialize};

use crate::content::EmergencyNumber;
use crate::draft::{Gender, UrgencyLevel};
use crate::error::SubmitErrorKind;
use crate::model::{LookupStatus, ScreenVariant};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ViewState {
    Idle,
    Loading,
    Submitted {
        /// `AMB-<id>`.
        reference: String,
        is_provisional: bool,
        eta: String,
    },
    Failed {
        kind: SubmitErrorKind,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyTypeOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormView {
    pub emergency_type: Option<String>,
    pub patient_name: String,
    pub patient_age: String,
    pub patient_gender: Option<Gender>,
    pub contact_number: String,
    pub email: String,
    pub address: String,
    pub landmark: String,
    pub description: String,
    pub urgency: UrgencyLevel,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickRequestView {
    pub contact_number: Option<String>,
    /// Resolved coordinates, or the placeholder that will be submitted.
    pub pickup_location: String,
    pub profile_status: LookupStatus,
    pub location_status: LookupStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewModel {
    pub variant: ScreenVariant,
    pub authenticated: bool,
    pub state: ViewState,
    pub can_submit: bool,
    pub submit_label: String,
    pub form: FormView,
    pub quick_request: QuickRequestView,
    pub emergency_types: Vec<EmergencyTypeOption>,
    pub emergency_numbers: Vec<EmergencyNumber>,
    pub guidance: Vec<String>,
    pub average_response_time: String,
}

impl ViewModel {
    pub fn reference(&self) -> Option<&str> {
        match &self.state {
            ViewState::Submitted { reference, .. } => Some(reference),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            ViewState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }
}
