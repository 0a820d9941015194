use serde::{Deserialize, Serialize};

use crate::capabilities::{AuthToken, GeolocationResult, HttpResult, SessionResult};
use crate::config::DispatchConfig;
use crate::draft::{EmergencyType, Gender, UrgencyLevel};
use crate::model::{AttemptId, ScreenVariant};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // Lifecycle
    Configure(Box<DispatchConfig>),
    Mounted { variant: ScreenVariant },
    Teardown,
    ResetRequested,

    // Session
    SessionChanged { token: Option<AuthToken> },

    // Form input
    EmergencyTypeSelected(Option<EmergencyType>),
    PatientNameChanged(String),
    PatientAgeChanged(String),
    PatientGenderSelected(Option<Gender>),
    ContactNumberInput(String),
    EmailChanged(String),
    AddressChanged(String),
    LandmarkChanged(String),
    DescriptionChanged(String),
    UrgencySelected(UrgencyLevel),

    SubmitRequested,

    // Capability callbacks
    #[serde(skip)]
    SessionLoaded(Box<SessionResult>),
    #[serde(skip)]
    ProfileLoaded {
        request_id: String,
        result: Box<HttpResult>,
    },
    #[serde(skip)]
    LocationResolved {
        lookup: AttemptId,
        result: Box<GeolocationResult>,
    },
    #[serde(skip)]
    DispatchCompleted {
        attempt: AttemptId,
        result: Box<HttpResult>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Configure(_) => "configure",
            Self::Mounted { .. } => "mounted",
            Self::Teardown => "teardown",
            Self::ResetRequested => "reset_requested",
            Self::SessionChanged { .. } => "session_changed",
            Self::EmergencyTypeSelected(_) => "emergency_type_selected",
            Self::PatientNameChanged(_) => "patient_name_changed",
            Self::PatientAgeChanged(_) => "patient_age_changed",
            Self::PatientGenderSelected(_) => "patient_gender_selected",
            Self::ContactNumberInput(_) => "contact_number_input",
            Self::EmailChanged(_) => "email_changed",
            Self::AddressChanged(_) => "address_changed",
            Self::LandmarkChanged(_) => "landmark_changed",
            Self::DescriptionChanged(_) => "description_changed",
            Self::UrgencySelected(_) => "urgency_selected",
            Self::SubmitRequested => "submit_requested",
            Self::SessionLoaded(_) => "session_loaded",
            Self::ProfileLoaded { .. } => "profile_loaded",
            Self::LocationResolved { .. } => "location_resolved",
            Self::DispatchCompleted { .. } => "dispatch_completed",
        }
    }
}
