use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::RequestReference;
use crate::capabilities::Position;
use crate::config::DispatchConfig;
use crate::draft::AmbulanceRequestDraft;
use crate::error::SubmitError;

/// Which of the two request screens is mounted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenVariant {
    /// Caller fills in every field by hand.
    #[default]
    FullForm,
    /// One tap. Contact comes from the profile, pickup from geolocation.
    QuickRequest,
}

/// Validated lat/lon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return None;
        }
        Some(Self {
            latitude,
            longitude,
        })
    }

    pub fn from_position(position: &Position) -> Option<Self> {
        Self::new(position.latitude, position.longitude)
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Pickup string sent to the backend: four decimals, about eleven metres.
impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStatus {
    #[default]
    NotStarted,
    Pending,
    Resolved,
    Failed,
}

/// Values the quick request screen fills in on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuickRequestPrefill {
    pub contact_number: Option<String>,
    pub customer_email: Option<String>,
    pub location: Option<Coordinates>,
    pub profile_status: LookupStatus,
    pub location_status: LookupStatus,
    #[serde(skip)]
    pub profile_request_id: Option<String>,
    #[serde(skip)]
    pub location_lookup: Option<AttemptId>,
}

impl QuickRequestPrefill {
    pub fn has_contact(&self) -> bool {
        self.contact_number
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty())
    }
}

/// Token for one Loading transition or one location lookup. Results carrying
/// any other token are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptId(pub u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Explicit timestamp unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnixTimeMs(pub u64);

impl UnixTimeMs {
    /// Wall clock through `web_time`, which reads `Date.now()` on wasm32.
    pub fn now() -> Self {
        let ms = web_time::SystemTime::now()
            .duration_since(web_time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self(ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubmissionState {
    #[default]
    Idle,
    Loading {
        attempt: AttemptId,
        request_id: String,
    },
    Submitted {
        reference: RequestReference,
    },
    Failed {
        error: SubmitError,
    },
}

impl SubmissionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    /// Idle and Failed accept a new submission; Loading and Submitted do not.
    pub fn accepts_submit(&self) -> bool {
        matches!(self, Self::Idle | Self::Failed { .. })
    }

    pub fn in_flight(&self) -> Option<(AttemptId, &str)> {
        match self {
            Self::Loading {
                attempt,
                request_id,
            } => Some((*attempt, request_id)),
            _ => None,
        }
    }
}

#[derive(Default)]
pub struct Model {
    pub config: DispatchConfig,
    pub variant: ScreenVariant,
    pub mounted: bool,
    pub draft: AmbulanceRequestDraft,
    pub prefill: QuickRequestPrefill,
    pub credential: Option<SecretString>,
    /// Set while a session read is outstanding; a push through
    /// `SessionChanged` clears it so the older read cannot overwrite it.
    pub session_loading: bool,
    pub submission: SubmissionState,
    pub next_attempt: u64,
}

impl Model {
    pub fn next_attempt_id(&mut self) -> AttemptId {
        self.next_attempt = self.next_attempt.wrapping_add(1);
        AttemptId(self.next_attempt)
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    /// Back to a fresh screen. Config and credential survive.
    pub fn reset_screen(&mut self, variant: ScreenVariant) {
        self.variant = variant;
        self.draft = AmbulanceRequestDraft::default();
        self.prefill = QuickRequestPrefill::default();
        self.submission = SubmissionState::Idle;
    }
}
