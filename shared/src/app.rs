use secrecy::ExposeSecret;
use tracing::{debug, info, instrument, warn};

use crate::api::{
    self, DispatchRequestBody, DispatchResponseBody, ProfileResponseBody, RequestReference,
};
use crate::capabilities::{
    AuthToken, Capabilities, GeolocationResult, HttpError, HttpRequest, HttpResult, SessionResult,
};
use crate::config::DispatchConfig;
use crate::content;
use crate::draft::{self, ContactNumber, EmergencyType, ValidatedRequest};
use crate::error::SubmitError;
use crate::event::Event;
use crate::model::{
    AttemptId, Coordinates, LookupStatus, Model, ScreenVariant, SubmissionState, UnixTimeMs,
};
use crate::view::{EmergencyTypeOption, FormView, QuickRequestView, ViewModel, ViewState};

#[derive(Default)]
pub struct App;

/// `POST {base}{dispatch_path}` with the bearer token and JSON body.
#[instrument(skip(config, token, request), fields(emergency_type = %request.emergency_type))]
pub fn build_dispatch_request(
    config: &DispatchConfig,
    token: &str,
    request: &ValidatedRequest,
) -> Result<HttpRequest, HttpError> {
    let url = config.dispatch_url()?;
    HttpRequest::post(url)
        .with_bearer_token(token)?
        .with_json(&DispatchRequestBody::from(request))?
        .with_timeout(config.request_timeout())
}

#[instrument(skip(config, token))]
pub fn build_profile_request(config: &DispatchConfig, token: &str) -> Result<HttpRequest, HttpError> {
    HttpRequest::get(config.profile_url()?)
        .with_bearer_token(token)?
        .with_timeout(config.request_timeout())
}

impl App {
    fn load_session(model: &mut Model, caps: &Capabilities) {
        model.session_loading = true;
        caps.session
            .read_token(model.config.token_storage_key.clone(), |result| {
                Event::SessionLoaded(Box::new(result))
            });
    }

    fn locate(model: &mut Model, caps: &Capabilities) {
        let lookup = model.next_attempt_id();
        model.prefill.location_status = LookupStatus::Pending;
        model.prefill.location_lookup = Some(lookup);
        caps.geolocation
            .current_position(model.config.high_accuracy_location, move |result| {
                Event::LocationResolved {
                    lookup,
                    result: Box::new(result),
                }
            });
    }

    /// Starts the profile lookup once the quick request screen is mounted and a
    /// credential is known. Runs at most once per mount unless it failed.
    fn fetch_profile(model: &mut Model, caps: &Capabilities) {
        if !model.mounted || model.variant != ScreenVariant::QuickRequest {
            return;
        }
        if matches!(
            model.prefill.profile_status,
            LookupStatus::Pending | LookupStatus::Resolved
        ) {
            return;
        }
        let Some(token) = model.credential.as_ref() else {
            return;
        };

        match build_profile_request(&model.config, token.expose_secret()) {
            Ok(request) => {
                let request_id = request.request_id().to_string();
                debug!(%request_id, "fetching caller profile");
                model.prefill.profile_status = LookupStatus::Pending;
                model.prefill.profile_request_id = Some(request_id.clone());
                caps.http.execute(request, move |result| Event::ProfileLoaded {
                    request_id,
                    result: Box::new(result),
                });
            }
            Err(e) => {
                warn!(error = %e, "could not build profile request");
                model.prefill.profile_status = LookupStatus::Failed;
            }
        }
    }

    fn cancel_in_flight(model: &mut Model, caps: &Capabilities) {
        if let Some((attempt, request_id)) = model.submission.in_flight() {
            info!(%attempt, request_id, "cancelling in-flight dispatch");
            caps.http.cancel(request_id);
        }
        if let Some(request_id) = model.prefill.profile_request_id.take() {
            debug!(%request_id, "cancelling profile lookup");
            caps.http.cancel(request_id);
            model.prefill.profile_status = LookupStatus::NotStarted;
        }
        // Geolocation cannot be aborted; forgetting the token drops its result.
        if model.prefill.location_lookup.take().is_some() {
            model.prefill.location_status = LookupStatus::NotStarted;
        }
    }

    fn set_credential(model: &mut Model, token: Option<AuthToken>) {
        let was_authenticated = model.is_authenticated();
        model.credential = token.map(AuthToken::into_secret);
        if was_authenticated != model.is_authenticated() {
            info!(authenticated = model.is_authenticated(), "session changed");
        }
    }

    fn submit(model: &mut Model, caps: &Capabilities) {
        if !model.mounted {
            debug!("submit ignored: screen not mounted");
            return;
        }
        if !model.submission.accepts_submit() {
            debug!("submit ignored: request already in flight or submitted");
            return;
        }
        if model.session_loading {
            debug!("submit ignored: session still loading");
            return;
        }

        let Some(token) = model.credential.as_ref() else {
            warn!("submit without a session credential");
            model.submission = SubmissionState::Failed {
                error: SubmitError::NotAuthenticated,
            };
            return;
        };

        let validated = match draft::validate(
            model.variant,
            &model.draft,
            &model.prefill,
            &model.config,
        ) {
            Ok(validated) => validated,
            Err(e) => {
                info!(error = %e, "request rejected before sending");
                model.submission = SubmissionState::Failed { error: e.into() };
                return;
            }
        };

        let request = match build_dispatch_request(&model.config, token.expose_secret(), &validated)
        {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "could not build dispatch request");
                model.submission = SubmissionState::Failed { error: e.into() };
                return;
            }
        };

        let attempt = model.next_attempt_id();
        let request_id = request.request_id().to_string();
        info!(
            %attempt,
            %request_id,
            variant = ?model.variant,
            priority = ?validated.priority,
            "dispatching ambulance request"
        );
        model.submission = SubmissionState::Loading {
            attempt,
            request_id,
        };
        caps.http.execute(request, move |result| Event::DispatchCompleted {
            attempt,
            result: Box::new(result),
        });
    }

    /// Returns false when the response no longer belongs to the screen.
    fn complete_dispatch(model: &mut Model, attempt: AttemptId, result: HttpResult) -> bool {
        let current = model.submission.in_flight().map(|(a, _)| a);
        if !model.mounted || current != Some(attempt) {
            debug!(%attempt, ?current, "ignoring stale dispatch response");
            return false;
        }

        model.submission = match result {
            Ok(response) if response.is_success() => {
                let body = response.json::<DispatchResponseBody>().unwrap_or_else(|e| {
                    warn!(error = %e, "dispatch succeeded with an unreadable body");
                    DispatchResponseBody::default()
                });
                let reference = RequestReference::from_response(&body, UnixTimeMs::now());
                if reference.is_provisional() {
                    warn!(%reference, "no requestId in response, using provisional reference");
                } else {
                    info!(%reference, "ambulance request accepted");
                }
                SubmissionState::Submitted { reference }
            }
            Ok(response) => {
                let status = response.status();
                let message = api::extract_error_message(response.body());
                warn!(status, server_message = ?message, "dispatch rejected");
                SubmissionState::Failed {
                    error: SubmitError::from_status(status, message),
                }
            }
            Err(e) => {
                warn!(error = %e, "dispatch transport failure");
                SubmissionState::Failed { error: e.into() }
            }
        };
        true
    }

    fn apply_profile(model: &mut Model, request_id: &str, result: HttpResult) -> bool {
        if !model.mounted
            || model.variant != ScreenVariant::QuickRequest
            || model.prefill.profile_request_id.as_deref() != Some(request_id)
        {
            debug!(request_id, "ignoring stale profile response");
            return false;
        }
        model.prefill.profile_request_id = None;

        let profile = match result {
            Ok(response) if response.is_success() => response.json::<ProfileResponseBody>(),
            Ok(response) => Err(HttpError::InvalidResponse {
                reason: format!("status {}", response.status()),
                request_id: request_id.to_string(),
            }),
            Err(e) => Err(e),
        };

        match profile {
            Ok(profile) => {
                model.prefill.contact_number = profile
                    .phone
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty());
                model.prefill.customer_email = profile
                    .email
                    .map(|e| e.trim().to_string())
                    .filter(|e| !e.is_empty());
                model.prefill.profile_status = LookupStatus::Resolved;
                debug!(
                    has_contact = model.prefill.has_contact(),
                    "caller profile loaded"
                );
            }
            Err(e) => {
                warn!(error = %e, "profile lookup failed, contact left empty");
                model.prefill.profile_status = LookupStatus::Failed;
            }
        }
        true
    }

    fn apply_location(model: &mut Model, lookup: AttemptId, result: GeolocationResult) -> bool {
        if !model.mounted
            || model.variant != ScreenVariant::QuickRequest
            || model.prefill.location_lookup != Some(lookup)
        {
            debug!(%lookup, "ignoring stale location result");
            return false;
        }
        model.prefill.location_lookup = None;

        match result.map(|p| Coordinates::from_position(&p)) {
            Ok(Some(coordinates)) => {
                model.prefill.location = Some(coordinates);
                model.prefill.location_status = LookupStatus::Resolved;
            }
            Ok(None) => {
                warn!("platform reported an out of range position");
                model.prefill.location_status = LookupStatus::Failed;
            }
            Err(e) => {
                info!(error = %e, "location unavailable, placeholder will be submitted");
                model.prefill.location_status = LookupStatus::Failed;
            }
        }
        true
    }

    fn apply_session(model: &mut Model, result: SessionResult) -> bool {
        if !model.session_loading {
            debug!("ignoring superseded session read");
            return false;
        }
        model.session_loading = false;
        match result {
            Ok(output) => Self::set_credential(model, output.token),
            Err(e) => {
                warn!(error = %e, "session read failed");
                Self::set_credential(model, None);
            }
        }
        true
    }

    fn can_submit(model: &Model) -> bool {
        if !model.mounted || model.session_loading || !model.submission.accepts_submit() {
            return false;
        }
        match model.variant {
            ScreenVariant::FullForm => true,
            ScreenVariant::QuickRequest => model.prefill.has_contact(),
        }
    }

    fn view_state(submission: &SubmissionState) -> ViewState {
        match submission {
            SubmissionState::Idle => ViewState::Idle,
            SubmissionState::Loading { .. } => ViewState::Loading,
            SubmissionState::Submitted { reference } => ViewState::Submitted {
                reference: reference.display(),
                is_provisional: reference.is_provisional(),
                eta: content::ESTIMATED_ARRIVAL.into(),
            },
            SubmissionState::Failed { error } => ViewState::Failed {
                kind: error.kind(),
                message: error.user_message(),
            },
        }
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(event = event.name(), variant = ?model.variant, "update");

        match event {
            Event::Configure(config) => match config.validate() {
                Ok(()) => {
                    info!(base_url = %config.api_base_url, "dispatch config applied");
                    model.config = *config;
                }
                Err(e) => warn!(error = %e, "rejected dispatch config, keeping previous"),
            },

            Event::Mounted { variant } => {
                Self::cancel_in_flight(model, caps);
                model.reset_screen(variant);
                model.mounted = true;
                info!(?variant, "request screen mounted");

                if !model.is_authenticated() {
                    Self::load_session(model, caps);
                }
                if variant == ScreenVariant::QuickRequest {
                    Self::locate(model, caps);
                    Self::fetch_profile(model, caps);
                }
            }

            Event::Teardown => {
                Self::cancel_in_flight(model, caps);
                model.submission = SubmissionState::Idle;
                model.mounted = false;
                model.session_loading = false;
                info!("request screen torn down");
                return;
            }

            Event::ResetRequested => {
                if model.submission.is_loading() {
                    debug!("reset ignored while a request is in flight");
                    return;
                }
                model.draft = Default::default();
                model.submission = SubmissionState::Idle;
            }

            Event::SessionChanged { token } => {
                model.session_loading = false;
                Self::set_credential(model, token);
                Self::fetch_profile(model, caps);
            }

            Event::SessionLoaded(result) => {
                if !Self::apply_session(model, *result) {
                    return;
                }
                Self::fetch_profile(model, caps);
            }

            Event::EmergencyTypeSelected(emergency_type) => {
                model.draft.emergency_type = emergency_type;
            }
            Event::PatientNameChanged(name) => model.draft.patient_name = name,
            Event::PatientAgeChanged(age) => model.draft.set_patient_age(&age),
            Event::PatientGenderSelected(gender) => model.draft.patient_gender = gender,
            Event::ContactNumberInput(input) => model.draft.set_contact_number(&input),
            Event::EmailChanged(email) => model.draft.email = email,
            Event::AddressChanged(address) => model.draft.address = address,
            Event::LandmarkChanged(landmark) => model.draft.landmark = landmark,
            Event::DescriptionChanged(description) => model.draft.description = description,
            Event::UrgencySelected(urgency) => model.draft.urgency = urgency,

            Event::SubmitRequested => Self::submit(model, caps),

            Event::DispatchCompleted { attempt, result } => {
                if !Self::complete_dispatch(model, attempt, *result) {
                    return;
                }
            }

            Event::ProfileLoaded { request_id, result } => {
                if !Self::apply_profile(model, &request_id, *result) {
                    return;
                }
            }

            Event::LocationResolved { lookup, result } => {
                if !Self::apply_location(model, lookup, *result) {
                    return;
                }
            }
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        let draft = &model.draft;
        let prefill = &model.prefill;
        let loading = model.submission.is_loading();

        ViewModel {
            variant: model.variant,
            authenticated: model.is_authenticated(),
            state: Self::view_state(&model.submission),
            can_submit: Self::can_submit(model),
            submit_label: if loading {
                content::SUBMIT_LABEL_LOADING
            } else {
                content::SUBMIT_LABEL_IDLE
            }
            .into(),
            form: FormView {
                emergency_type: draft.emergency_type.map(|t| t.label().to_string()),
                patient_name: draft.patient_name.clone(),
                patient_age: draft.patient_age.clone(),
                patient_gender: draft.patient_gender,
                contact_number: draft.contact_number.clone(),
                email: draft.email.clone(),
                address: draft.address.clone(),
                landmark: draft.landmark.clone(),
                description: draft.description.clone(),
                urgency: draft.urgency,
            },
            quick_request: QuickRequestView {
                contact_number: prefill.contact_number.as_deref().map(|raw| {
                    ContactNumber::from_profile(raw)
                        .map(|n| n.as_str().to_string())
                        .unwrap_or_else(|_| raw.to_string())
                }),
                pickup_location: prefill
                    .location
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| model.config.location_placeholder.clone()),
                profile_status: prefill.profile_status,
                location_status: prefill.location_status,
            },
            emergency_types: EmergencyType::ALL
                .into_iter()
                .map(|t| EmergencyTypeOption {
                    value: t.label().to_string(),
                    label: t.label().to_string(),
                })
                .collect(),
            emergency_numbers: content::emergency_numbers(),
            guidance: content::guidance(),
            average_response_time: content::AVERAGE_RESPONSE_TIME.into(),
        }
    }
}
