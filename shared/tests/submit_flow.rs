use ambulance_core::capabilities::{
    AuthToken, HttpError, HttpHeaders, HttpMethod, HttpOperation, HttpRequest, HttpResponse,
    SessionOperation,
};
use ambulance_core::{
    App, DispatchConfig, Effect, EmergencyType, Event, Model, ScreenVariant, SubmissionState,
    SubmitError, SubmitErrorKind, UrgencyLevel, ValidationError, ViewState,
};
use assert_matches::assert_matches;
use crux_core::testing::AppTester;
use serde_json::json;

fn http_ops(effects: &[Effect]) -> Vec<HttpOperation> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Http(request) => Some(request.operation.clone()),
            _ => None,
        })
        .collect()
}

fn executed(effects: &[Effect]) -> Vec<HttpRequest> {
    http_ops(effects)
        .into_iter()
        .filter_map(|op| match op {
            HttpOperation::Execute(request) => Some(request),
            HttpOperation::Cancel { .. } => None,
        })
        .collect()
}

fn mounted_with_session(app: &AppTester<App, Effect>) -> Model {
    let mut model = Model::default();
    app.update(
        Event::Mounted {
            variant: ScreenVariant::FullForm,
        },
        &mut model,
    );
    app.update(
        Event::SessionChanged {
            token: AuthToken::new("tok-abc"),
        },
        &mut model,
    );
    model
}

fn fill_form(app: &AppTester<App, Effect>, model: &mut Model) {
    for event in [
        Event::EmergencyTypeSelected(Some(EmergencyType::HeartAttack)),
        Event::ContactNumberInput("98765-43210".into()),
        Event::AddressChanged("12 MG Road, Bengaluru".into()),
        Event::DescriptionChanged("Severe chest pain, sweating".into()),
        Event::UrgencySelected(UrgencyLevel::High),
    ] {
        app.update(event, model);
    }
}

fn submit(app: &AppTester<App, Effect>, model: &mut Model) -> HttpRequest {
    let update = app.update(Event::SubmitRequested, model);
    let mut requests = executed(&update.effects);
    assert_eq!(requests.len(), 1, "exactly one dispatch per submit");
    requests.remove(0)
}

fn in_flight_attempt(model: &Model) -> ambulance_core::AttemptId {
    model
        .submission
        .in_flight()
        .map(|(attempt, _)| attempt)
        .expect("submission should be loading")
}

fn respond(
    app: &AppTester<App, Effect>,
    model: &mut Model,
    result: Result<HttpResponse, HttpError>,
) {
    let attempt = in_flight_attempt(model);
    app.update(
        Event::DispatchCompleted {
            attempt,
            result: Box::new(result),
        },
        model,
    );
}

#[test]
fn mount_without_session_reads_the_stored_token() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(
        Event::Mounted {
            variant: ScreenVariant::FullForm,
        },
        &mut model,
    );

    let reads: Vec<_> = update
        .effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Session(request) => Some(request.operation.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        reads,
        vec![SessionOperation::ReadToken {
            storage_key: "authToken".into()
        }]
    );
    assert!(model.session_loading);
}

#[test]
fn submit_waits_for_the_stored_token_to_be_read() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    app.update(
        Event::Mounted {
            variant: ScreenVariant::FullForm,
        },
        &mut model,
    );
    fill_form(&app, &mut model);
    assert!(!app.view(&model).can_submit);

    let update = app.update(Event::SubmitRequested, &mut model);
    assert!(http_ops(&update.effects).is_empty());
    assert_eq!(model.submission, SubmissionState::Idle);

    app.update(
        Event::SessionLoaded(Box::new(Ok(ambulance_core::capabilities::SessionOutput {
            token: AuthToken::new("tok-late"),
        }))),
        &mut model,
    );
    let view = app.view(&model);
    assert!(view.authenticated);
    assert!(view.can_submit);
    assert_eq!(view.state, ViewState::Idle);

    let request = submit(&app, &mut model);
    assert_eq!(request.header("Authorization"), Some("Bearer tok-late"));
}

#[test]
fn missing_field_fails_validation_without_network() {
    let app = AppTester::<App, Effect>::default();
    let mut model = mounted_with_session(&app);
    app.update(Event::ContactNumberInput("9876543210".into()), &mut model);

    let update = app.update(Event::SubmitRequested, &mut model);

    assert!(http_ops(&update.effects).is_empty());
    assert_matches!(
        model.submission,
        SubmissionState::Failed {
            error: SubmitError::ValidationFailed(ValidationError::MissingField(_))
        }
    );
    let view = app.view(&model);
    assert_eq!(view.error_message(), Some("Please fill in all required fields"));
    assert!(view.can_submit);
}

#[test]
fn short_contact_number_is_rejected() {
    let app = AppTester::<App, Effect>::default();
    let mut model = mounted_with_session(&app);
    fill_form(&app, &mut model);
    app.update(Event::ContactNumberInput("98765".into()), &mut model);

    let update = app.update(Event::SubmitRequested, &mut model);

    assert!(http_ops(&update.effects).is_empty());
    assert_matches!(
        model.submission,
        SubmissionState::Failed {
            error: SubmitError::ValidationFailed(ValidationError::InvalidContactNumber {
                digits: 5
            })
        }
    );
}

#[test]
fn contact_input_is_sanitized_as_typed() {
    let app = AppTester::<App, Effect>::default();
    let mut model = mounted_with_session(&app);

    app.update(Event::ContactNumberInput("+91 (987) 654-3210 ext".into()), &mut model);

    assert_eq!(model.draft.contact_number, "9198765432");
    assert_eq!(app.view(&model).form.contact_number, "9198765432");
}

#[test]
fn submit_without_credential_never_enters_loading() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    app.update(
        Event::Mounted {
            variant: ScreenVariant::FullForm,
        },
        &mut model,
    );
    app.update(
        Event::SessionLoaded(Box::new(Ok(ambulance_core::capabilities::SessionOutput {
            token: None,
        }))),
        &mut model,
    );
    fill_form(&app, &mut model);

    let update = app.update(Event::SubmitRequested, &mut model);

    assert!(http_ops(&update.effects).is_empty());
    assert_eq!(
        model.submission,
        SubmissionState::Failed {
            error: SubmitError::NotAuthenticated
        }
    );
    assert_eq!(
        app.view(&model).error_message(),
        Some("You must be logged in to request an ambulance")
    );
}

#[test]
fn successful_dispatch_shows_issued_reference() {
    let app = AppTester::<App, Effect>::default();
    let mut model = mounted_with_session(&app);
    fill_form(&app, &mut model);

    let request = submit(&app, &mut model);
    assert_eq!(request.method(), HttpMethod::Post);
    assert_eq!(request.url().as_str(), "http://localhost:8080/api/ambulance");
    assert_eq!(request.header("Authorization"), Some("Bearer tok-abc"));

    let body: serde_json::Value = serde_json::from_slice(request.body().unwrap()).unwrap();
    assert_eq!(
        body,
        json!({
            "emergency_type": "Heart Attack",
            "contact_number": "9876543210",
            "pickup_address": "12 MG Road, Bengaluru",
            "destination_address": "Not specified",
            "customer_condition": "Severe chest pain, sweating",
            "priority": "high",
        })
    );

    let view = app.view(&model);
    assert_eq!(view.state, ViewState::Loading);
    assert_eq!(view.submit_label, "Requesting...");
    assert!(!view.can_submit);

    let response = HttpResponse::json_body(201, &json!({"requestId": "123"}), request.request_id());
    respond(&app, &mut model, Ok(response));

    let view = app.view(&model);
    assert_eq!(view.reference(), Some("AMB-123"));
    assert_matches!(
        view.state,
        ViewState::Submitted {
            is_provisional: false,
            ..
        }
    );
    assert_eq!(view.submit_label, "Request Emergency Ambulance");
}

#[test]
fn numeric_request_id_is_accepted() {
    let app = AppTester::<App, Effect>::default();
    let mut model = mounted_with_session(&app);
    fill_form(&app, &mut model);
    let request = submit(&app, &mut model);

    let response = HttpResponse::json_body(200, &json!({"requestId": 4521}), request.request_id());
    respond(&app, &mut model, Ok(response));

    assert_eq!(app.view(&model).reference(), Some("AMB-4521"));
}

#[test]
fn missing_request_id_falls_back_to_provisional_reference() {
    let app = AppTester::<App, Effect>::default();
    let mut model = mounted_with_session(&app);
    fill_form(&app, &mut model);
    let request = submit(&app, &mut model);

    let response = HttpResponse::json_body(200, &json!({"status": "ok"}), request.request_id());
    respond(&app, &mut model, Ok(response));

    let view = app.view(&model);
    let reference = view.reference().unwrap();
    let digits = reference.strip_prefix("AMB-").unwrap();
    assert_eq!(digits.len(), 6);
    assert!(digits.chars().all(|c| c.is_ascii_digit()));
    assert_matches!(
        view.state,
        ViewState::Submitted {
            is_provisional: true,
            ..
        }
    );
}

#[test]
fn empty_success_body_still_counts_as_submitted() {
    let app = AppTester::<App, Effect>::default();
    let mut model = mounted_with_session(&app);
    fill_form(&app, &mut model);
    let request = submit(&app, &mut model);

    let response = HttpResponse::new(204, HttpHeaders::new(), Vec::new(), request.request_id().into());
    respond(&app, &mut model, Ok(response));

    assert_matches!(model.submission, SubmissionState::Submitted { .. });
}

#[test]
fn server_error_message_is_surfaced() {
    let app = AppTester::<App, Effect>::default();
    let mut model = mounted_with_session(&app);
    fill_form(&app, &mut model);
    let request = submit(&app, &mut model);

    let response = HttpResponse::json_body(503, &json!({"error": "busy"}), request.request_id());
    respond(&app, &mut model, Ok(response));

    assert_eq!(
        model.submission,
        SubmissionState::Failed {
            error: SubmitError::NetworkOrServerError {
                status: Some(503),
                message: "busy".into()
            }
        }
    );
    let view = app.view(&model);
    assert_eq!(view.error_message(), Some("busy"));
    assert!(view.can_submit);
}

#[test]
fn server_error_without_message_uses_generic_text() {
    let app = AppTester::<App, Effect>::default();
    let mut model = mounted_with_session(&app);
    fill_form(&app, &mut model);
    let request = submit(&app, &mut model);

    let response = HttpResponse::new(
        500,
        HttpHeaders::new(),
        b"<html>oops</html>".to_vec(),
        request.request_id().into(),
    );
    respond(&app, &mut model, Ok(response));

    assert_eq!(
        app.view(&model).error_message(),
        Some("Failed to create ambulance request")
    );
}

#[test]
fn transport_failure_uses_generic_message() {
    let app = AppTester::<App, Effect>::default();
    let mut model = mounted_with_session(&app);
    fill_form(&app, &mut model);
    submit(&app, &mut model);

    respond(
        &app,
        &mut model,
        Err(HttpError::ConnectionError {
            host: "localhost".into(),
            message: "connection refused".into(),
        }),
    );

    let view = app.view(&model);
    assert_matches!(
        view.state,
        ViewState::Failed {
            kind: SubmitErrorKind::NetworkOrServer,
            ..
        }
    );
    assert_eq!(
        view.error_message(),
        Some("Unable to reach the ambulance service. Please try again.")
    );
}

#[test]
fn submit_while_loading_is_ignored() {
    let app = AppTester::<App, Effect>::default();
    let mut model = mounted_with_session(&app);
    fill_form(&app, &mut model);
    submit(&app, &mut model);
    let attempt = in_flight_attempt(&model);

    let update = app.update(Event::SubmitRequested, &mut model);

    assert!(http_ops(&update.effects).is_empty());
    assert_eq!(in_flight_attempt(&model), attempt);
}

#[test]
fn submit_after_success_is_ignored_until_reset() {
    let app = AppTester::<App, Effect>::default();
    let mut model = mounted_with_session(&app);
    fill_form(&app, &mut model);
    let request = submit(&app, &mut model);
    respond(
        &app,
        &mut model,
        Ok(HttpResponse::json_body(200, &json!({"requestId": "9"}), request.request_id())),
    );

    let update = app.update(Event::SubmitRequested, &mut model);
    assert!(http_ops(&update.effects).is_empty());

    app.update(Event::ResetRequested, &mut model);
    assert_eq!(model.submission, SubmissionState::Idle);
    assert!(model.draft.address.is_empty());
    assert!(model.is_authenticated());
}

#[test]
fn stale_attempt_response_is_ignored() {
    let app = AppTester::<App, Effect>::default();
    let mut model = mounted_with_session(&app);
    fill_form(&app, &mut model);

    let first = submit(&app, &mut model);
    let first_attempt = in_flight_attempt(&model);
    respond(
        &app,
        &mut model,
        Err(HttpError::Timeout {
            timeout_ms: 30_000,
            request_id: first.request_id().into(),
        }),
    );
    assert_matches!(model.submission, SubmissionState::Failed { .. });

    let second = submit(&app, &mut model);
    let second_attempt = in_flight_attempt(&model);
    assert_ne!(first_attempt, second_attempt);
    assert_ne!(first.request_id(), second.request_id());

    let update = app.update(
        Event::DispatchCompleted {
            attempt: first_attempt,
            result: Box::new(Ok(HttpResponse::json_body(
                200,
                &json!({"requestId": "old"}),
                first.request_id(),
            ))),
        },
        &mut model,
    );

    assert!(update.effects.is_empty());
    assert_eq!(in_flight_attempt(&model), second_attempt);
}

#[test]
fn teardown_cancels_in_flight_request_and_drops_late_reply() {
    let app = AppTester::<App, Effect>::default();
    let mut model = mounted_with_session(&app);
    fill_form(&app, &mut model);
    let request = submit(&app, &mut model);
    let attempt = in_flight_attempt(&model);

    let update = app.update(Event::Teardown, &mut model);

    assert_eq!(
        http_ops(&update.effects),
        vec![HttpOperation::Cancel {
            request_id: request.request_id().into()
        }]
    );
    assert_eq!(model.submission, SubmissionState::Idle);
    assert!(!model.mounted);

    app.update(
        Event::DispatchCompleted {
            attempt,
            result: Box::new(Ok(HttpResponse::json_body(
                200,
                &json!({"requestId": "late"}),
                request.request_id(),
            ))),
        },
        &mut model,
    );
    assert_eq!(model.submission, SubmissionState::Idle);
}

#[test]
fn invalid_config_is_rejected_and_previous_kept() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let config = DispatchConfig {
        api_base_url: "https://dispatch.example.org".into(),
        ..Default::default()
    };
    app.update(Event::Configure(Box::new(config)), &mut model);
    assert_eq!(model.config.api_base_url, "https://dispatch.example.org");

    let broken = DispatchConfig {
        api_base_url: "not a url".into(),
        ..Default::default()
    };
    app.update(Event::Configure(Box::new(broken)), &mut model);
    assert_eq!(model.config.api_base_url, "https://dispatch.example.org");
}

#[test]
fn configured_base_url_is_used_for_dispatch() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    app.update(
        Event::Configure(Box::new(DispatchConfig {
            api_base_url: "https://dispatch.example.org/".into(),
            ..Default::default()
        })),
        &mut model,
    );
    app.update(
        Event::Mounted {
            variant: ScreenVariant::FullForm,
        },
        &mut model,
    );
    app.update(
        Event::SessionChanged {
            token: AuthToken::new("t"),
        },
        &mut model,
    );
    fill_form(&app, &mut model);

    let request = submit(&app, &mut model);
    assert_eq!(
        request.url().as_str(),
        "https://dispatch.example.org/api/ambulance"
    );
}

#[test]
fn view_carries_static_screen_content() {
    let app = AppTester::<App, Effect>::default();
    let model = Model::default();
    let view = app.view(&model);

    assert_eq!(view.emergency_types.len(), 9);
    assert_eq!(view.emergency_numbers[0].number, "108");
    assert_eq!(view.guidance.len(), 5);
    assert!(view.average_response_time.contains("urban"));
    assert!(!view.can_submit);
}
