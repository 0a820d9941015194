mod geolocation;
mod http;
mod session;

pub use self::geolocation::{
    Geolocation, GeolocationError, GeolocationOperation, GeolocationResult, Position,
};
pub use self::http::{
    Http, HttpError, HttpHeaders, HttpMethod, HttpOperation, HttpRequest,
    HttpResponse, HttpResult, ValidatedUrl, MAX_TIMEOUT_MS,
};
pub use self::session::{
    AuthToken, Session, SessionError, SessionOperation, SessionOutput, SessionResult,
};

// Crux's built-in Render capability covers view updates.
pub use crux_core::render::Render;

use crate::event::Event;

#[derive(crux_core::macros::Effect)]
#[effect(app = "crate::app::App")]
pub struct Capabilities {
    pub http: Http<Event>,
    pub session: Session<Event>,
    pub geolocation: Geolocation<Event>,
    pub render: Render<Event>,
}
