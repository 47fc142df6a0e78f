//! Submodel handlers.

use super::{request_handler, HandlerError, PublishPolicy, RequestHandler};
use crate::request::{Request, RequestKind};
use crate::response::{Payload, Response};
use tracing::debug;
use twin_event::{EventMessage, Referable};
use twin_types::StatusCode;

request_handler!(GetAllSubmodelsHandler);

impl RequestHandler for GetAllSubmodelsHandler {
    fn kind(&self) -> RequestKind {
        RequestKind::GetAllSubmodels
    }

    fn process(&self, request: Request) -> Result<Response, HandlerError> {
        let Request::GetAllSubmodels { modifier } = request else {
            return Err(HandlerError::UnexpectedRequest(self.kind()));
        };
        Ok(Response::ok(Payload::Submodels(self.ctx.persistence.get_all_submodels(&modifier))))
    }
}

request_handler!(GetSubmodelByIdHandler);

impl RequestHandler for GetSubmodelByIdHandler {
    fn kind(&self) -> RequestKind {
        RequestKind::GetSubmodelById
    }

    fn process(&self, request: Request) -> Result<Response, HandlerError> {
        let Request::GetSubmodelById { id, modifier } = request else {
            return Err(HandlerError::UnexpectedRequest(self.kind()));
        };
        let submodel = self.ctx.persistence.get_submodel(&id, &modifier)?;
        Ok(Response::ok(Payload::Submodel(submodel)))
    }
}

request_handler!(PostSubmodelHandler);

impl PostSubmodelHandler {
    const POLICY: PublishPolicy = PublishPolicy::Required;
}

impl RequestHandler for PostSubmodelHandler {
    fn kind(&self) -> RequestKind {
        RequestKind::PostSubmodel
    }

    fn process(&self, request: Request) -> Result<Response, HandlerError> {
        let Request::PostSubmodel { submodel } = request else {
            return Err(HandlerError::UnexpectedRequest(self.kind()));
        };
        self.ctx
            .persistence
            .create_submodel(submodel.clone())
            .map_err(HandlerError::from_create)?;
        debug!(id = %submodel.id, "submodel created");
        self.ctx.publish(
            EventMessage::element_create(submodel.reference(), Referable::Submodel(submodel.clone())),
            Self::POLICY,
        )?;
        Ok(Response::created(Payload::Submodel(submodel)))
    }
}

request_handler!(PutSubmodelByIdHandler);

impl PutSubmodelByIdHandler {
    const POLICY: PublishPolicy = PublishPolicy::Required;
}

impl RequestHandler for PutSubmodelByIdHandler {
    fn kind(&self) -> RequestKind {
        RequestKind::PutSubmodelById
    }

    fn process(&self, request: Request) -> Result<Response, HandlerError> {
        let Request::PutSubmodelById { id, submodel } = request else {
            return Err(HandlerError::UnexpectedRequest(self.kind()));
        };
        if submodel.id != id {
            return Err(HandlerError::BadRequest(format!(
                "submodel id '{}' does not match '{id}'",
                submodel.id
            )));
        }
        self.ctx.persistence.replace_submodel(submodel.clone())?;
        self.ctx.publish(
            EventMessage::element_update(submodel.reference(), Referable::Submodel(submodel)),
            Self::POLICY,
        )?;
        Ok(Response::new(StatusCode::Success))
    }
}

request_handler!(DeleteSubmodelByIdHandler);

impl DeleteSubmodelByIdHandler {
    const POLICY: PublishPolicy = PublishPolicy::Required;
}

impl RequestHandler for DeleteSubmodelByIdHandler {
    fn kind(&self) -> RequestKind {
        RequestKind::DeleteSubmodelById
    }

    fn process(&self, request: Request) -> Result<Response, HandlerError> {
        let Request::DeleteSubmodelById { id } = request else {
            return Err(HandlerError::UnexpectedRequest(self.kind()));
        };
        let removed = self.ctx.persistence.remove_submodel(&id)?;
        debug!(id = %id, "submodel deleted");
        self.ctx.publish(
            EventMessage::element_delete(removed.reference(), Referable::Submodel(removed)),
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
    use twin_model::{DataValue, Environment, Level, QueryModifier, Submodel, SubmodelElement, ValueType};
    use twin_types::Identifier;

    fn setup() -> (HandlerContext, Arc<RecordingBus>) {
        let motor = Submodel::new(Identifier::new("urn:sm:motor"), "Motor").with_elements(vec![
            SubmodelElement::collection(
                "Motor1",
                vec![
                    SubmodelElement::property("Temperature", ValueType::Double, Some(DataValue::Double(40.0))),
                    SubmodelElement::collection(
                        "Bearing",
                        vec![SubmodelElement::property("Wear", ValueType::Integer, None)],
                    ),
                ],
            ),
        ]);
        let env = Environment {
            asset_administration_shells: vec![],
            submodels: vec![motor],
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
    fn get_by_id_honours_level() {
        let (ctx, _) = setup();
        let resp = GetSubmodelByIdHandler::new(ctx)
            .process(Request::GetSubmodelById {
                id: Identifier::new("urn:sm:motor"),
                modifier: QueryModifier {
                    level: Level::Core,
                    ..QueryModifier::default()
                },
            })
            .unwrap();
        let Some(Payload::Submodel(sm)) = resp.payload else {
            panic!("expected submodel payload");
        };
        let motor1 = sm.submodel_elements[0].children().unwrap();
        assert_eq!(motor1.len(), 2);
        assert_eq!(motor1[1].children(), Some(&[][..]));
    }

    #[test]
    fn missing_submodel_is_not_found() {
        let (ctx, _) = setup();
        let err = GetSubmodelByIdHandler::new(ctx)
            .process(Request::GetSubmodelById {
                id: Identifier::new("urn:sm:none"),
                modifier: QueryModifier::default(),
            })
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::ClientErrorResourceNotFound);
    }

    #[test]
    fn post_duplicate_is_conflict() {
        let (ctx, bus) = setup();
        let err = PostSubmodelHandler::new(ctx)
            .process(Request::PostSubmodel {
                submodel: Submodel::new(Identifier::new("urn:sm:motor"), "Dup"),
            })
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::ClientErrorBadRequest);
        assert!(bus.events().is_empty());
    }

    #[test]
    fn post_stores_and_publishes_one_create() {
        let (ctx, bus) = setup();
        let pump = Submodel::new(Identifier::new("urn:sm:pump"), "Pump")
            .with_elements(vec![SubmodelElement::property("Flow", ValueType::Double, None)]);
        let resp = PostSubmodelHandler::new(ctx.clone())
            .process(Request::PostSubmodel { submodel: pump.clone() })
            .unwrap();
        assert_eq!(resp.status, StatusCode::SuccessCreated);
        assert_eq!(resp.payload, Some(Payload::Submodel(pump.clone())));
        assert_eq!(ctx.persistence.get_all_submodels(&QueryModifier::default()).len(), 2);

        let events = bus.events();
        assert_eq!(events.len(), 1);
        let EventMessage::ElementCreate(ev) = &events[0] else {
            panic!("expected create event");
        };
        assert_eq!(ev.element, pump.reference());
        assert_eq!(ev.value, Referable::Submodel(pump));
    }

    #[test]
    fn put_replaces_and_publishes_update() {
        let (ctx, bus) = setup();
        PutSubmodelByIdHandler::new(ctx.clone())
            .process(Request::PutSubmodelById {
                id: Identifier::new("urn:sm:motor"),
                submodel: Submodel::new(Identifier::new("urn:sm:motor"), "Renamed"),
            })
            .unwrap();
        let stored = ctx
            .persistence
            .get_submodel(&Identifier::new("urn:sm:motor"), &QueryModifier::default())
            .unwrap();
        assert_eq!(stored.id_short, "Renamed");
        assert_eq!(bus.kinds(), vec![EventKind::ElementUpdate]);
    }

    #[test]
    fn delete_publishes_delete() {
        let (ctx, bus) = setup();
        DeleteSubmodelByIdHandler::new(ctx.clone())
            .process(Request::DeleteSubmodelById {
                id: Identifier::new("urn:sm:motor"),
            })
            .unwrap();
        assert!(ctx.persistence.get_all_submodels(&QueryModifier::default()).is_empty());
        assert_eq!(bus.kinds(), vec![EventKind::ElementDelete]);
    }
}
