//! Asset information handlers.

use super::{request_handler, HandlerError, PublishPolicy, RequestHandler};
use crate::request::{Request, RequestKind};
use crate::response::{Payload, Response};
use twin_event::{EventMessage, Referable};
use twin_model::QueryModifier;
use twin_types::StatusCode;

request_handler!(GetAssetInformationHandler);

impl RequestHandler for GetAssetInformationHandler {
    fn kind(&self) -> RequestKind {
        RequestKind::GetAssetInformation
    }

    fn process(&self, request: Request) -> Result<Response, HandlerError> {
        let Request::GetAssetInformation { id } = request else {
            return Err(HandlerError::UnexpectedRequest(self.kind()));
        };
        let shell = self.ctx.persistence.get_shell(&id, &QueryModifier::default())?;
        Ok(Response::ok(Payload::AssetInformation(shell.asset_information)))
    }
}

request_handler!(
    /// Replaces the asset information of a shell, keeping the rest of it.
    PutAssetInformationHandler
);

impl PutAssetInformationHandler {
    const POLICY: PublishPolicy = PublishPolicy::Required;
}

impl RequestHandler for PutAssetInformationHandler {
    fn kind(&self) -> RequestKind {
        RequestKind::PutAssetInformation
    }

    fn process(&self, request: Request) -> Result<Response, HandlerError> {
        let Request::PutAssetInformation { id, asset_information } = request else {
            return Err(HandlerError::UnexpectedRequest(self.kind()));
        };
        let shell = self.ctx.persistence.update_shell(&id, &mut |shell| {
            shell.asset_information = asset_information.clone();
        })?;
        let reference = shell.reference();
        self.ctx.publish(
            EventMessage::element_update(reference, Referable::AssetInformation(asset_information)),
            Self::POLICY,
        )?;
        Ok(Response::new(StatusCode::Success))
    }
}
