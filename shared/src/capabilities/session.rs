//! Credential provider.
//!
//! The shell owns the session (login, storage, refresh). The core only ever
//! asks it for the current bearer token under a storage key, or is told about
//! a new one through `Event::SessionChanged`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crux_core::capability::{Capability, CapabilityContext, Operation};

pub const MAX_TOKEN_LENGTH: usize = 8192;

/// Bearer token as it crosses the FFI boundary. Debug output is redacted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken(String);

impl AuthToken {
    /// Blank tokens count as "not logged in", same as a missing one.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() || trimmed.len() > MAX_TOKEN_LENGTH {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn into_secret(self) -> secrecy::SecretString {
        secrecy::SecretString::new(self.0)
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken([REDACTED])")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionOperation {
    ReadToken { storage_key: String },
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionError {
    #[error("session storage unavailable: {reason}")]
    StorageUnavailable { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionOutput {
    pub token: Option<AuthToken>,
}

pub type SessionResult = Result<SessionOutput, SessionError>;

impl Operation for SessionOperation {
    type Output = SessionResult;
}

pub struct Session<Ev> {
    context: CapabilityContext<SessionOperation, Ev>,
}

impl<Ev> Capability<Ev> for Session<Ev> {
    type Operation = SessionOperation;
    type MappedSelf<MappedEv> = Session<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Session::new(self.context.map_event(f))
    }
}

impl<Ev> Session<Ev>
where
    Ev: Send + 'static,
{
    pub fn new(context: CapabilityContext<SessionOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn read_token<F>(&self, storage_key: impl Into<String>, callback: F)
    where
        F: FnOnce(SessionResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        let storage_key = storage_key.into();
        self.context.spawn(async move {
            let result = context
                .request_from_shell(SessionOperation::ReadToken { storage_key })
                .await;
            context.update_app(callback(result));
        });
    }
}
