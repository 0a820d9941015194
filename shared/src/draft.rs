//! The in-progress request and the rules that decide whether it can be sent.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::DispatchConfig;
use crate::model::{QuickRequestPrefill, ScreenVariant};

pub const CONTACT_NUMBER_DIGITS: usize = 10;
pub const MAX_FREE_TEXT_LENGTH: usize = 4096;
pub const DEFAULT_DESTINATION: &str = "Not specified";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmergencyType {
    #[serde(rename = "Heart Attack")]
    HeartAttack,
    #[serde(rename = "Stroke")]
    Stroke,
    #[serde(rename = "Severe Injury/Accident")]
    SevereInjury,
    #[serde(rename = "Breathing Difficulty")]
    BreathingDifficulty,
    #[serde(rename = "Pregnancy/Delivery")]
    Pregnancy,
    #[serde(rename = "Poisoning")]
    Poisoning,
    #[serde(rename = "Burns")]
    Burns,
    #[serde(rename = "Mental Health Emergency")]
    MentalHealth,
    #[serde(rename = "Other Medical Emergency")]
    OtherMedicalEmergency,
}

impl EmergencyType {
    pub const ALL: [EmergencyType; 9] = [
        EmergencyType::HeartAttack,
        EmergencyType::Stroke,
        EmergencyType::SevereInjury,
        EmergencyType::BreathingDifficulty,
        EmergencyType::Pregnancy,
        EmergencyType::Poisoning,
        EmergencyType::Burns,
        EmergencyType::MentalHealth,
        EmergencyType::OtherMedicalEmergency,
    ];

    /// Also the value the backend expects in `emergency_type`.
    pub const fn label(self) -> &'static str {
        match self {
            Self::HeartAttack => "Heart Attack",
            Self::Stroke => "Stroke",
            Self::SevereInjury => "Severe Injury/Accident",
            Self::BreathingDifficulty => "Breathing Difficulty",
            Self::Pregnancy => "Pregnancy/Delivery",
            Self::Poisoning => "Poisoning",
            Self::Burns => "Burns",
            Self::MentalHealth => "Mental Health Emergency",
            Self::OtherMedicalEmergency => "Other Medical Emergency",
        }
    }
}

impl fmt::Display for EmergencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the urgency selector offers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    #[default]
    High,
    Medium,
    Low,
}

/// What the backend accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Normal,
    High,
}

impl From<UrgencyLevel> for Priority {
    fn from(level: UrgencyLevel) -> Self {
        match level {
            UrgencyLevel::High => Priority::High,
            UrgencyLevel::Medium | UrgencyLevel::Low => Priority::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Strips everything but ASCII digits and keeps at most ten of them.
pub fn sanitize_contact_number(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_digit)
        .take(CONTACT_NUMBER_DIGITS)
        .collect()
}

/// Exactly ten ASCII digits.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactNumber(String);

impl ContactNumber {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let digits: String = input.chars().filter(char::is_ascii_digit).collect();
        if digits.len() != CONTACT_NUMBER_DIGITS {
            return Err(ValidationError::InvalidContactNumber {
                digits: digits.len(),
            });
        }
        Ok(Self(digits))
    }

    /// Profile numbers may carry a country code; the trailing ten digits are
    /// the subscriber number.
    pub fn from_profile(raw: &str) -> Result<Self, ValidationError> {
        let digits: Vec<char> = raw.chars().filter(char::is_ascii_digit).collect();
        let start = digits.len().saturating_sub(CONTACT_NUMBER_DIGITS);
        Self::parse(&digits[start..].iter().collect::<String>())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ContactNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tail = &self.0[self.0.len().saturating_sub(2)..];
        write!(f, "ContactNumber(********{tail})")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    EmergencyType,
    ContactNumber,
    Address,
    Description,
}

impl RequiredField {
    pub const fn label(self) -> &'static str {
        match self {
            Self::EmergencyType => "emergency type",
            Self::ContactNumber => "contact number",
            Self::Address => "address",
            Self::Description => "description",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("missing required field: {}", .0.label())]
    MissingField(RequiredField),
    #[error("contact number must have 10 digits, got {digits}")]
    InvalidContactNumber { digits: usize },
    #[error("{} is too long ({len} > {max})", .field.label())]
    TooLong {
        field: RequiredField,
        len: usize,
        max: usize,
    },
}

impl ValidationError {
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingField(_) => "Please fill in all required fields".into(),
            Self::InvalidContactNumber { .. } => {
                "Please enter a valid 10 digit contact number".into()
            }
            Self::TooLong { field, max, .. } => {
                format!("The {} must be at most {max} characters", field.label())
            }
        }
    }
}

/// Form state for the full request screen.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmbulanceRequestDraft {
    pub emergency_type: Option<EmergencyType>,
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

// Free text may describe a patient; keep it out of logs.
impl fmt::Debug for AmbulanceRequestDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AmbulanceRequestDraft")
            .field("emergency_type", &self.emergency_type)
            .field("patient_name_present", &!self.patient_name.is_empty())
            .field("patient_age_present", &!self.patient_age.is_empty())
            .field("patient_gender", &self.patient_gender)
            .field("contact_number_digits", &self.contact_number.len())
            .field("email_present", &!self.email.is_empty())
            .field("address_present", &!self.address.is_empty())
            .field("landmark_present", &!self.landmark.is_empty())
            .field("description_present", &!self.description.is_empty())
            .field("urgency", &self.urgency)
            .finish()
    }
}

impl AmbulanceRequestDraft {
    pub fn set_contact_number(&mut self, input: &str) {
        self.contact_number = sanitize_contact_number(input);
    }

    /// Ages are typed into a numeric input; anything else is dropped.
    pub fn set_patient_age(&mut self, input: &str) {
        self.patient_age = input.chars().filter(char::is_ascii_digit).take(3).collect();
    }
}

/// A request that passed validation, in domain terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub emergency_type: EmergencyType,
    pub contact_number: ContactNumber,
    pub customer_email: Option<String>,
    pub pickup_address: String,
    pub destination_address: String,
    pub condition: String,
    pub priority: Priority,
}

fn required(value: &str, field: RequiredField) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    if trimmed.len() > MAX_FREE_TEXT_LENGTH {
        return Err(ValidationError::TooLong {
            field,
            len: trimmed.len(),
            max: MAX_FREE_TEXT_LENGTH,
        });
    }
    Ok(trimmed.to_string())
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Full form: type, contact number, address and description are required,
/// checked in that order so the first missing one is reported.
pub fn validate_full_form(draft: &AmbulanceRequestDraft) -> Result<ValidatedRequest, ValidationError> {
    let emergency_type = draft
        .emergency_type
        .ok_or(ValidationError::MissingField(RequiredField::EmergencyType))?;
    let contact = required(&draft.contact_number, RequiredField::ContactNumber)?;
    let pickup_address = required(&draft.address, RequiredField::Address)?;
    let condition = required(&draft.description, RequiredField::Description)?;
    let contact_number = ContactNumber::parse(&contact)?;

    Ok(ValidatedRequest {
        emergency_type,
        contact_number,
        customer_email: optional(&draft.email),
        pickup_address,
        destination_address: optional(&draft.landmark)
            .unwrap_or_else(|| DEFAULT_DESTINATION.to_string()),
        condition,
        priority: draft.urgency.into(),
    })
}

/// Quick request: only the profile contact number is required; a missing
/// location is replaced by the configured placeholder.
pub fn validate_quick_request(
    prefill: &QuickRequestPrefill,
    config: &DispatchConfig,
) -> Result<ValidatedRequest, ValidationError> {
    let raw = prefill
        .contact_number
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::MissingField(RequiredField::ContactNumber))?;
    let contact_number = ContactNumber::from_profile(raw)?;

    let pickup_address = prefill
        .location
        .map(|c| c.to_string())
        .unwrap_or_else(|| config.location_placeholder.clone());

    Ok(ValidatedRequest {
        emergency_type: config.quick_emergency_type,
        contact_number,
        customer_email: prefill.customer_email.as_deref().and_then(optional),
        pickup_address,
        destination_address: DEFAULT_DESTINATION.to_string(),
        condition: config.quick_condition.clone(),
        priority: Priority::High,
    })
}

pub fn validate(
    variant: ScreenVariant,
    draft: &AmbulanceRequestDraft,
    prefill: &QuickRequestPrefill,
    config: &DispatchConfig,
) -> Result<ValidatedRequest, ValidationError> {
    match variant {
        ScreenVariant::FullForm => validate_full_form(draft),
        ScreenVariant::QuickRequest => validate_quick_request(prefill, config),
    }
}
