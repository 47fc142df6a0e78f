//! Asset administration shell handlers.

use super::{request_handler, HandlerError, PublishPolicy, RequestHandler};
use crate::request::{Request, RequestKind};
use crate::response::{Payload, Response};
use tracing::debug;
use twin_event::{EventMessage, Referable};
use twin_types::StatusCode;

request_handler!(GetAllAssetAdministrationShellsHandler);

impl RequestHandler for GetAllAssetAdministrationShellsHandler {
    fn kind(&self) -> RequestKind {
        RequestKind::GetAllAssetAdministrationShells
    }

    fn process(&self, request: Request) -> Result<Response, HandlerError> {
        let Request::GetAllAssetAdministrationShells { modifier } = request else {
            return Err(HandlerError::UnexpectedRequest(self.kind()));
        };
        Ok(Response::ok(Payload::Shells(self.ctx.persistence.get_all_shells(&modifier))))
    }
}

request_handler!(GetAllAssetAdministrationShellsByIdShortHandler);

impl RequestHandler for GetAllAssetAdministrationShellsByIdShortHandler {
    fn kind(&self) -> RequestKind {
        RequestKind::GetAllAssetAdministrationShellsByIdShort
    }

    fn process(&self, request: Request) -> Result<Response, HandlerError> {
        let Request::GetAllAssetAdministrationShellsByIdShort { id_short, modifier } = request else {
            return Err(HandlerError::UnexpectedRequest(self.kind()));
        };
        let shells = self
            .ctx
            .persistence
            .get_all_shells(&modifier)
            .into_iter()
            .filter(|s| s.id_short == id_short)
            .collect();
        Ok(Response::ok(Payload::Shells(shells)))
    }
}

request_handler!(GetAssetAdministrationShellByIdHandler);

impl RequestHandler for GetAssetAdministrationShellByIdHandler {
    fn kind(&self) -> RequestKind {
        RequestKind::GetAssetAdministrationShellById
    }

    fn process(&self, request: Request) -> Result<Response, HandlerError> {
        let Request::GetAssetAdministrationShellById { id, modifier } = request else {
            return Err(HandlerError::UnexpectedRequest(self.kind()));
        };
        let shell = self.ctx.persistence.get_shell(&id, &modifier)?;
        Ok(Response::ok(Payload::Shell(shell)))
    }
}

request_handler!(PostAssetAdministrationShellHandler);

impl PostAssetAdministrationShellHandler {
    const POLICY: PublishPolicy = PublishPolicy::Required;
}

impl RequestHandler for PostAssetAdministrationShellHandler {
    fn kind(&self) -> RequestKind {
        RequestKind::PostAssetAdministrationShell
    }

    fn process(&self, request: Request) -> Result<Response, HandlerError> {
        let Request::PostAssetAdministrationShell { shell } = request else {
            return Err(HandlerError::UnexpectedRequest(self.kind()));
        };
        self.ctx
            .persistence
            .create_shell(shell.clone())
            .map_err(HandlerError::from_create)?;
        debug!(id = %shell.id, "shell created");
        self.ctx.publish(
            EventMessage::element_create(shell.reference(), Referable::Shell(shell.clone())),
            Self::POLICY,
        )?;
        Ok(Response::created(Payload::Shell(shell)))
    }
}

request_handler!(PutAssetAdministrationShellByIdHandler);

impl PutAssetAdministrationShellByIdHandler {
    const POLICY: PublishPolicy = PublishPolicy::Required;
}

impl RequestHandler for PutAssetAdministrationShellByIdHandler {
    fn kind(&self) -> RequestKind {
        RequestKind::PutAssetAdministrationShellById
    }

    fn process(&self, request: Request) -> Result<Response, HandlerError> {
        let Request::PutAssetAdministrationShellById { id, shell } = request else {
            return Err(HandlerError::UnexpectedRequest(self.kind()));
        };
        if shell.id != id {
            return Err(HandlerError::BadRequest(format!(
                "shell id '{}' does not match '{id}'",
                shell.id
            )));
        }
        self.ctx.persistence.replace_shell(shell.clone())?;
        self.ctx.publish(
            EventMessage::element_update(shell.reference(), Referable::Shell(shell)),
            Self::POLICY,
        )?;
        Ok(Response::new(StatusCode::Success))
    }
}

request_handler!(DeleteAssetAdministrationShellByIdHandler);

impl DeleteAssetAdministrationShellByIdHandler {
    const POLICY: PublishPolicy = PublishPolicy::Required;
}

impl RequestHandler for DeleteAssetAdministrationShellByIdHandler {
    fn kind(&self) -> RequestKind {
        RequestKind::DeleteAssetAdministrationShellById
    }

    fn process(&self, request: Request) -> Result<Response, HandlerError> {
        let Request::DeleteAssetAdministrationShellById { id } = request else {
            return Err(HandlerError::UnexpectedRequest(self.kind()));
        };
        let removed = self.ctx.persistence.remove_shell(&id)?;
        debug!(id = %id, "shell deleted");
        self.ctx.publish(
            EventMessage::element_delete(removed.reference(), Referable::Shell(removed)),
            Self::POLICY,
        )?;
        Ok(Response::new(StatusCode::Success))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetConnectionManager;
    use crate::handler::HandlerContext;
    use crate::persistence::InMemoryPersistence;
    use crate::testing::RecordingBus;
    use std::sync::Arc;
    use twin_event::EventKind;
    use twin_model::{AssetAdministrationShell, Environment, QueryModifier};
    use twin_types::Identifier;

    fn setup() -> (HandlerContext, Arc<RecordingBus>) {
        let env = Environment {
            asset_administration_shells: vec![AssetAdministrationShell::new(Identifier::new("urn:aas:1"), "Motor")],
            submodels: vec![],
        };
        let bus = Arc::new(RecordingBus::new());
        let ctx = HandlerContext::new(
            Arc::new(InMemoryPersistence::with_environment(env)),
            bus.clone(),
            Arc::new(AssetConnectionManager::empty()),
        );
        (ctx, bus)
    }

    #[test]
    fn get_by_id_short_filters() {
        let (ctx, _) = setup();
        let handler = GetAllAssetAdministrationShellsByIdShortHandler::new(ctx);
        let resp = handler
            .process(Request::GetAllAssetAdministrationShellsByIdShort {
                id_short: "Pump".into(),
                modifier: QueryModifier::default(),
            })
            .unwrap();
        assert_eq!(resp.payload, Some(Payload::Shells(vec![])));
    }

    #[test]
    fn post_existing_is_conflict_without_event() {
        let (ctx, bus) = setup();
        let handler = PostAssetAdministrationShellHandler::new(ctx);
        let err = handler
            .process(Request::PostAssetAdministrationShell {
                shell: AssetAdministrationShell::new(Identifier::new("urn:aas:1"), "Again"),
            })
            .unwrap_err();
        assert!(matches!(err, HandlerError::Conflict(_)));
        assert_eq!(err.status(), StatusCode::ClientErrorBadRequest);
        assert!(bus.events().is_empty());
    }

    #[test]
    fn post_publishes_create() {
        let (ctx, bus) = setup();
        let handler = PostAssetAdministrationShellHandler::new(ctx.clone());
        let resp = handler
            .process(Request::PostAssetAdministrationShell {
                shell: AssetAdministrationShell::new(Identifier::new("urn:aas:2"), "Pump"),
            })
            .unwrap();
        assert_eq!(resp.status, StatusCode::SuccessCreated);
        assert_eq!(bus.kinds(), vec![EventKind::ElementCreate]);
        assert_eq!(ctx.persistence.get_all_shells(&QueryModifier::default()).len(), 2);
    }

    #[test]
    fn put_with_mismatched_id_is_bad_request() {
        let (ctx, bus) = setup();
        let handler = PutAssetAdministrationShellByIdHandler::new(ctx);
        let err = handler
            .process(Request::PutAssetAdministrationShellById {
                id: Identifier::new("urn:aas:1"),
                shell: AssetAdministrationShell::new(Identifier::new("urn:aas:other"), "Motor"),
            })
            .unwrap_err();
        assert!(matches!(err, HandlerError::BadRequest(_)));
        assert!(bus.events().is_empty());
    }

    #[test]
    fn put_replaces_and_publishes_one_update() {
        let (ctx, bus) = setup();
        let mut replacement = AssetAdministrationShell::new(Identifier::new("urn:aas:1"), "Renamed");
        replacement.asset_information.global_asset_id = Some("urn:asset:motor".into());
        let resp = PutAssetAdministrationShellByIdHandler::new(ctx.clone())
            .process(Request::PutAssetAdministrationShellById {
                id: Identifier::new("urn:aas:1"),
                shell: replacement.clone(),
            })
            .unwrap();
        assert_eq!(resp.status, StatusCode::Success);
        assert_eq!(
            ctx.persistence
                .get_shell(&Identifier::new("urn:aas:1"), &QueryModifier::default())
                .unwrap(),
            replacement
        );

        let events = bus.events();
        assert_eq!(events.len(), 1);
        let EventMessage::ElementUpdate(ev) = &events[0] else {
            panic!("expected update event");
        };
        assert_eq!(ev.value, Referable::Shell(replacement));
    }

    #[test]
    fn put_unknown_shell_is_not_found_and_creates_nothing() {
        let (ctx, bus) = setup();
        let err = PutAssetAdministrationShellByIdHandler::new(ctx.clone())
            .process(Request::PutAssetAdministrationShellById {
                id: Identifier::new("urn:aas:2"),
                shell: AssetAdministrationShell::new(Identifier::new("urn:aas:2"), "Pump"),
            })
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::ClientErrorResourceNotFound);
        assert_eq!(ctx.persistence.get_all_shells(&QueryModifier::default()).len(), 1);
        assert!(bus.events().is_empty());
    }

    #[test]
    fn delete_missing_is_not_found() {
        let (ctx, bus) = setup();
        let before = ctx.persistence.environment();
        let handler = DeleteAssetAdministrationShellByIdHandler::new(ctx.clone());
        let err = handler
            .process(Request::DeleteAssetAdministrationShellById {
                id: Identifier::new("urn:aas:none"),
            })
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::ClientErrorResourceNotFound);
        assert_eq!(ctx.persistence.environment(), before);
        assert!(bus.events().is_empty());
    }

    #[test]
    fn delete_publishes_removed_shell() {
        let (ctx, bus) = setup();
        let handler = DeleteAssetAdministrationShellByIdHandler::new(ctx);
        handler
            .process(Request::DeleteAssetAdministrationShellById {
                id: Identifier::new("urn:aas:1"),
            })
            .unwrap();
        let events = bus.events();
        let EventMessage::ElementDelete(ev) = &events[0] else {
            panic!("expected delete event");
        };
        assert!(matches!(&ev.value, Referable::Shell(s) if s.id_short == "Motor"));
    }

    #[test]
    fn required_publish_failure_fails_request() {
        let (ctx, bus) = setup();
        bus.set_failing(true);
        let handler = DeleteAssetAdministrationShellByIdHandler::new(ctx);
        let err = handler
            .process(Request::DeleteAssetAdministrationShellById {
                id: Identifier::new("urn:aas:1"),
            })
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::ServerInternalError);
    }
}
