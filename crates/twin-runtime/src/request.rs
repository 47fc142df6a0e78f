//! Requests accepted by the dispatcher.
//!
//! [`Request`] is a closed set: one variant per operation, each mapped to
//! exactly one handler through its [`RequestKind`].

use crate::dispatcher::DispatchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use twin_model::{AssetAdministrationShell, AssetInformation, OperationVariable, QueryModifier, Submodel, SubmodelElement};
use twin_types::{HandleId, IdShortPath, Identifier, RequestId};

/// Variant tag of a [`Request`], used as the handler registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    GetAllAssetAdministrationShells,
    GetAllAssetAdministrationShellsByIdShort,
    GetAssetAdministrationShellById,
    PostAssetAdministrationShell,
    PutAssetAdministrationShellById,
    DeleteAssetAdministrationShellById,
    GetAssetInformation,
    PutAssetInformation,
    GetAllSubmodels,
    GetSubmodelById,
    PostSubmodel,
    PutSubmodelById,
    DeleteSubmodelById,
    GetAllSubmodelElements,
    GetSubmodelElementByPath,
    PostSubmodelElementByPath,
    PutSubmodelElementByPath,
    DeleteSubmodelElementByPath,
    SetSubmodelElementValueByPath,
    InvokeOperationSync,
    InvokeOperationAsync,
    GetOperationAsyncResult,
}

impl RequestKind {
    /// Every kind, in declaration order.
    pub const ALL: [RequestKind; 22] = [
        Self::GetAllAssetAdministrationShells,
        Self::GetAllAssetAdministrationShellsByIdShort,
        Self::GetAssetAdministrationShellById,
        Self::PostAssetAdministrationShell,
        Self::PutAssetAdministrationShellById,
        Self::DeleteAssetAdministrationShellById,
        Self::GetAssetInformation,
        Self::PutAssetInformation,
        Self::GetAllSubmodels,
        Self::GetSubmodelById,
        Self::PostSubmodel,
        Self::PutSubmodelById,
        Self::DeleteSubmodelById,
        Self::GetAllSubmodelElements,
        Self::GetSubmodelElementByPath,
        Self::PostSubmodelElementByPath,
        Self::PutSubmodelElementByPath,
        Self::DeleteSubmodelElementByPath,
        Self::SetSubmodelElementValueByPath,
        Self::InvokeOperationSync,
        Self::InvokeOperationAsync,
        Self::GetOperationAsyncResult,
    ];
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// An abstract operation on the twin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Request {
    GetAllAssetAdministrationShells {
        modifier: QueryModifier,
    },
    GetAllAssetAdministrationShellsByIdShort {
        id_short: String,
        modifier: QueryModifier,
    },
    GetAssetAdministrationShellById {
        id: Identifier,
        modifier: QueryModifier,
    },
    PostAssetAdministrationShell {
        shell: AssetAdministrationShell,
    },
    PutAssetAdministrationShellById {
        id: Identifier,
        shell: AssetAdministrationShell,
    },
    DeleteAssetAdministrationShellById {
        id: Identifier,
    },
    GetAssetInformation {
        id: Identifier,
    },
    PutAssetInformation {
        id: Identifier,
        asset_information: AssetInformation,
    },
    GetAllSubmodels {
        modifier: QueryModifier,
    },
    GetSubmodelById {
        id: Identifier,
        modifier: QueryModifier,
    },
    PostSubmodel {
        submodel: Submodel,
    },
    PutSubmodelById {
        id: Identifier,
        submodel: Submodel,
    },
    DeleteSubmodelById {
        id: Identifier,
    },
    GetAllSubmodelElements {
        submodel_id: Identifier,
        modifier: QueryModifier,
    },
    GetSubmodelElementByPath {
        submodel_id: Identifier,
        path: IdShortPath,
        modifier: QueryModifier,
    },
    /// Creates `element` under `parent`, or at the submodel root when
    /// `parent` is `None`.
    PostSubmodelElementByPath {
        submodel_id: Identifier,
        parent: Option<IdShortPath>,
        element: SubmodelElement,
    },
    PutSubmodelElementByPath {
        submodel_id: Identifier,
        path: IdShortPath,
        element: SubmodelElement,
    },
    DeleteSubmodelElementByPath {
        submodel_id: Identifier,
        path: IdShortPath,
    },
    /// Sets a value from its raw string form, parsed against the shape of
    /// the element's current value.
    SetSubmodelElementValueByPath {
        submodel_id: Identifier,
        path: IdShortPath,
        raw_value: String,
    },
    InvokeOperationSync {
        request_id: RequestId,
        submodel_id: Identifier,
        path: IdShortPath,
        input_arguments: Vec<OperationVariable>,
        inoutput_arguments: Vec<OperationVariable>,
    },
    InvokeOperationAsync {
        request_id: RequestId,
        submodel_id: Identifier,
        path: IdShortPath,
        input_arguments: Vec<OperationVariable>,
        inoutput_arguments: Vec<OperationVariable>,
    },
    GetOperationAsyncResult {
        handle_id: HandleId,
    },
}

impl Request {
    #[must_use]
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::GetAllAssetAdministrationShells { .. } => RequestKind::GetAllAssetAdministrationShells,
            Self::GetAllAssetAdministrationShellsByIdShort { .. } => {
                RequestKind::GetAllAssetAdministrationShellsByIdShort
            }
            Self::GetAssetAdministrationShellById { .. } => RequestKind::GetAssetAdministrationShellById,
            Self::PostAssetAdministrationShell { .. } => RequestKind::PostAssetAdministrationShell,
            Self::PutAssetAdministrationShellById { .. } => RequestKind::PutAssetAdministrationShellById,
            Self::DeleteAssetAdministrationShellById { .. } => RequestKind::DeleteAssetAdministrationShellById,
            Self::GetAssetInformation { .. } => RequestKind::GetAssetInformation,
            Self::PutAssetInformation { .. } => RequestKind::PutAssetInformation,
            Self::GetAllSubmodels { .. } => RequestKind::GetAllSubmodels,
            Self::GetSubmodelById { .. } => RequestKind::GetSubmodelById,
            Self::PostSubmodel { .. } => RequestKind::PostSubmodel,
            Self::PutSubmodelById { .. } => RequestKind::PutSubmodelById,
            Self::DeleteSubmodelById { .. } => RequestKind::DeleteSubmodelById,
            Self::GetAllSubmodelElements { .. } => RequestKind::GetAllSubmodelElements,
            Self::GetSubmodelElementByPath { .. } => RequestKind::GetSubmodelElementByPath,
            Self::PostSubmodelElementByPath { .. } => RequestKind::PostSubmodelElementByPath,
            Self::PutSubmodelElementByPath { .. } => RequestKind::PutSubmodelElementByPath,
            Self::DeleteSubmodelElementByPath { .. } => RequestKind::DeleteSubmodelElementByPath,
            Self::SetSubmodelElementValueByPath { .. } => RequestKind::SetSubmodelElementValueByPath,
            Self::InvokeOperationSync { .. } => RequestKind::InvokeOperationSync,
            Self::InvokeOperationAsync { .. } => RequestKind::InvokeOperationAsync,
            Self::GetOperationAsyncResult { .. } => RequestKind::GetOperationAsyncResult,
        }
    }

    /// Checks structural preconditions before a handler is selected.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidArgument`] if an identifier the
    /// request addresses is empty.
    pub fn validate(&self) -> Result<(), DispatchError> {
        let id = match self {
            Self::GetAssetAdministrationShellById { id, .. }
            | Self::PutAssetAdministrationShellById { id, .. }
            | Self::DeleteAssetAdministrationShellById { id }
            | Self::GetAssetInformation { id }
            | Self::PutAssetInformation { id, .. }
            | Self::GetSubmodelById { id, .. }
            | Self::PutSubmodelById { id, .. }
            | Self::DeleteSubmodelById { id } => Some(("id", id)),
            Self::GetAllSubmodelElements { submodel_id, .. }
            | Self::GetSubmodelElementByPath { submodel_id, .. }
            | Self::PostSubmodelElementByPath { submodel_id, .. }
            | Self::PutSubmodelElementByPath { submodel_id, .. }
            | Self::DeleteSubmodelElementByPath { submodel_id, .. }
            | Self::SetSubmodelElementValueByPath { submodel_id, .. }
            | Self::InvokeOperationSync { submodel_id, .. }
            | Self::InvokeOperationAsync { submodel_id, .. } => Some(("submodel_id", submodel_id)),
            Self::PostAssetAdministrationShell { shell } => Some(("shell.id", &shell.id)),
            Self::PostSubmodel { submodel } => Some(("submodel.id", &submodel.id)),
            Self::GetAllAssetAdministrationShells { .. }
            | Self::GetAllAssetAdministrationShellsByIdShort { .. }
            | Self::GetAllSubmodels { .. }
            | Self::GetOperationAsyncResult { .. } => None,
        };
        match id {
            Some((field, id)) if id.is_empty() => Err(DispatchError::InvalidArgument(format!(
                "{}: {field} must not be empty",
                self.kind()
            ))),
            _ => Ok(()),
        }
    }
}
