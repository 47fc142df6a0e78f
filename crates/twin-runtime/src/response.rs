//! Responses produced by the dispatcher.

use crate::operation::{OperationHandle, OperationResult};
use serde::{Deserialize, Serialize};
use twin_model::{AssetAdministrationShell, AssetInformation, Submodel, SubmodelElement};
use twin_types::StatusCode;

/// Typed payload of a successful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Shells(Vec<AssetAdministrationShell>),
    Shell(AssetAdministrationShell),
    AssetInformation(AssetInformation),
    Submodels(Vec<Submodel>),
    Submodel(Submodel),
    Elements(Vec<SubmodelElement>),
    Element(SubmodelElement),
    OperationResult(OperationResult),
    OperationHandle(OperationHandle),
}

/// Outcome of one request. Always produced, even for failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: StatusCode,
    pub payload: Option<Payload>,
    /// Diagnostics for the caller, typically the error that caused a
    /// non-success status.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
}

impl Response {
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            payload: None,
            messages: Vec::new(),
        }
    }

    #[must_use]
    pub fn ok(payload: Payload) -> Self {
        Self::new(StatusCode::Success).with_payload(payload)
    }

    #[must_use]
    pub fn created(payload: Payload) -> Self {
        Self::new(StatusCode::SuccessCreated).with_payload(payload)
    }

    #[must_use]
    pub fn no_content() -> Self {
        Self::new(StatusCode::SuccessNoContent)
    }

    /// A failure response carrying `message`.
    #[must_use]
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status).with_message(message)
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    #[must_use]
    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// Consumes the response, returning its payload.
    #[must_use]
    pub fn into_payload(self) -> Option<Payload> {
        self.payload
    }
}
