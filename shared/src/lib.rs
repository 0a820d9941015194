//! Headless core for the emergency ambulance request screen.
//!
//! The shell renders [`ViewModel`] and performs the effects in
//! [`capabilities`]; everything else lives here.

#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod app;
pub mod capabilities;
pub mod config;
pub mod content;
pub mod draft;
pub mod error;
pub mod event;
pub mod model;
pub mod view;

pub use api::RequestReference;
pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::{ConfigError, DispatchConfig};
pub use draft::{
    AmbulanceRequestDraft, ContactNumber, EmergencyType, Priority, RequiredField, UrgencyLevel,
    ValidationError,
};
pub use error::{SubmitError, SubmitErrorKind};
pub use event::Event;
pub use model::{
    AttemptId, Coordinates, LookupStatus, Model, QuickRequestPrefill, ScreenVariant,
    SubmissionState, UnixTimeMs,
};
pub use view::{ViewModel, ViewState};
