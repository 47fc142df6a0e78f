//! Request handlers.
//!
//! One [`RequestHandler`] per [`RequestKind`]. All handlers share a
//! [`HandlerContext`] and follow the same sequence:
//!
//! ```text
//! resolve target ──absent──► ResourceNotFound (no event)
//!      │
//!      ▼
//! write to asset first (value writes with a bound provider)
//!      │ failure ──► ServerInternalError, persistence untouched
//!      ▼
//! mutate persistence
//!      │
//!      ▼
//! publish event (Required: failure fails the request,
//!                BestEffort: failure is logged)
//!      │
//!      ▼
//! Response
//! ```

mod asset_information;
mod element;
mod error;
mod operation;
mod shell;
mod submodel;

pub use asset_information::{GetAssetInformationHandler, PutAssetInformationHandler};
pub use element::{
    DeleteSubmodelElementByPathHandler, GetAllSubmodelElementsHandler, GetSubmodelElementByPathHandler,
    PostSubmodelElementByPathHandler, PutSubmodelElementByPathHandler, SetSubmodelElementValueByPathHandler,
};
pub use error::HandlerError;
pub use operation::{GetOperationAsyncResultHandler, InvokeOperationAsyncHandler, InvokeOperationSyncHandler};
pub use shell::{
    DeleteAssetAdministrationShellByIdHandler, GetAllAssetAdministrationShellsByIdShortHandler,
    GetAllAssetAdministrationShellsHandler, GetAssetAdministrationShellByIdHandler,
    PostAssetAdministrationShellHandler, PutAssetAdministrationShellByIdHandler,
};
pub use submodel::{
    DeleteSubmodelByIdHandler, GetAllSubmodelsHandler, GetSubmodelByIdHandler, PostSubmodelHandler,
    PutSubmodelByIdHandler,
};

use crate::asset::AssetConnectionManager;
use crate::bus::MessageBus;
use crate::persistence::Persistence;
use crate::request::{Request, RequestKind};
use crate::response::Response;
use std::sync::Arc;
use tracing::{error, warn};
use twin_event::EventMessage;
use twin_types::ErrorCode;

/// Processes requests of one kind.
pub trait RequestHandler: Send + Sync {
    /// The request kind this handler is registered for.
    fn kind(&self) -> RequestKind;

    /// Processes a request of [`kind`](Self::kind).
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`]; the dispatcher maps it to a status.
    fn process(&self, request: Request) -> Result<Response, HandlerError>;
}

/// What a failed publish means for the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishPolicy {
    /// The event is part of the contract: a publish failure fails the request.
    Required,
    /// The primary side effect already happened: a publish failure is logged.
    BestEffort,
}

/// Collaborators shared by all handlers.
#[derive(Clone)]
pub struct HandlerContext {
    pub persistence: Arc<dyn Persistence>,
    pub message_bus: Arc<dyn MessageBus>,
    pub assets: Arc<AssetConnectionManager>,
}

impl HandlerContext {
    #[must_use]
    pub fn new(
        persistence: Arc<dyn Persistence>,
        message_bus: Arc<dyn MessageBus>,
        assets: Arc<AssetConnectionManager>,
    ) -> Self {
        Self {
            persistence,
            message_bus,
            assets,
        }
    }

    /// Publishes `event` under `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Bus`] only for [`PublishPolicy::Required`].
    pub fn publish(&self, event: EventMessage, policy: PublishPolicy) -> Result<(), HandlerError> {
        let kind = event.kind();
        let reference = event.reference().clone();
        match (self.message_bus.publish(event), policy) {
            (Ok(()), _) => Ok(()),
            (Err(e), PublishPolicy::Required) => {
                error!(kind = %kind, reference = %reference, code = e.code(), error = %e, "required event not published");
                Err(e.into())
            }
            (Err(e), PublishPolicy::BestEffort) => {
                warn!(kind = %kind, reference = %reference, code = e.code(), error = %e, "event not published");
                Ok(())
            }
        }
    }
}

macro_rules! request_handler {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name {
            ctx: $crate::handler::HandlerContext,
        }

        impl $name {
            #[must_use]
            pub fn new(ctx: $crate::handler::HandlerContext) -> Self {
                Self { ctx }
            }
        }
    };
}
pub(crate) use request_handler;

/// One handler for every [`RequestKind`].
#[must_use]
pub fn default_handlers(ctx: &HandlerContext) -> Vec<Box<dyn RequestHandler>> {
    vec![
        Box::new(GetAllAssetAdministrationShellsHandler::new(ctx.clone())),
        Box::new(GetAllAssetAdministrationShellsByIdShortHandler::new(ctx.clone())),
        Box::new(GetAssetAdministrationShellByIdHandler::new(ctx.clone())),
        Box::new(PostAssetAdministrationShellHandler::new(ctx.clone())),
        Box::new(PutAssetAdministrationShellByIdHandler::new(ctx.clone())),
        Box::new(DeleteAssetAdministrationShellByIdHandler::new(ctx.clone())),
        Box::new(GetAssetInformationHandler::new(ctx.clone())),
        Box::new(PutAssetInformationHandler::new(ctx.clone())),
        Box::new(GetAllSubmodelsHandler::new(ctx.clone())),
        Box::new(GetSubmodelByIdHandler::new(ctx.clone())),
        Box::new(PostSubmodelHandler::new(ctx.clone())),
        Box::new(PutSubmodelByIdHandler::new(ctx.clone())),
        Box::new(DeleteSubmodelByIdHandler::new(ctx.clone())),
        Box::new(GetAllSubmodelElementsHandler::new(ctx.clone())),
        Box::new(GetSubmodelElementByPathHandler::new(ctx.clone())),
        Box::new(PostSubmodelElementByPathHandler::new(ctx.clone())),
        Box::new(PutSubmodelElementByPathHandler::new(ctx.clone())),
        Box::new(DeleteSubmodelElementByPathHandler::new(ctx.clone())),
        Box::new(SetSubmodelElementValueByPathHandler::new(ctx.clone())),
        Box::new(InvokeOperationSyncHandler::new(ctx.clone())),
        Box::new(InvokeOperationAsyncHandler::new(ctx.clone())),
        Box::new(GetOperationAsyncResultHandler::new(ctx.clone())),
    ]
}
