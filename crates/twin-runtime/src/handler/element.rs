//! Submodel element handlers.
//!
//! Elements bound to an asset value provider are read through and written
//! through: reads return the live value, writes reach the asset before
//! persistence changes.

use super::{request_handler, HandlerError, PublishPolicy, RequestHandler};
use crate::request::{Request, RequestKind};
use crate::response::{Payload, Response};
use tracing::debug;
use twin_event::{EventMessage, Referable};
use twin_model::{ElementValue, QueryModifier};
use twin_types::{Reference, StatusCode};

request_handler!(GetAllSubmodelElementsHandler);

impl RequestHandler for GetAllSubmodelElementsHandler {
    fn kind(&self) -> RequestKind {
        RequestKind::GetAllSubmodelElements
    }

    fn process(&self, request: Request) -> Result<Response, HandlerError> {
        let Request::GetAllSubmodelElements { submodel_id, modifier } = request else {
            return Err(HandlerError::UnexpectedRequest(self.kind()));
        };
        let elements = self.ctx.persistence.get_elements(&submodel_id, None, &modifier)?;
        Ok(Response::ok(Payload::Elements(elements)))
    }
}

request_handler!(
    /// Reads one element. A bound value provider supplies the live value;
    /// it is returned only, not stored.
    GetSubmodelElementByPathHandler
);

impl RequestHandler for GetSubmodelElementByPathHandler {
    fn kind(&self) -> RequestKind {
        RequestKind::GetSubmodelElementByPath
    }

    fn process(&self, request: Request) -> Result<Response, HandlerError> {
        let Request::GetSubmodelElementByPath {
            submodel_id,
            path,
            modifier,
        } = request
        else {
            return Err(HandlerError::UnexpectedRequest(self.kind()));
        };
        let reference = Reference::element(&submodel_id, &path);
        if !self.ctx.assets.has_value_provider(&reference) {
            let element = self.ctx.persistence.get_element(&reference, &modifier)?;
            return Ok(Response::ok(Payload::Element(element)));
        }

        // merge into the full element, then shape it for the caller
        let mut element = self.ctx.persistence.get_element(&reference, &QueryModifier::MAXIMAL)?;
        let live = self.ctx.assets.get_value_provider(&reference)?.read()?;
        debug!(reference = %reference, "value read from asset");
        element.set_value(live)?;
        Ok(Response::ok(Payload::Element(modifier.apply_element(&element))))
    }
}

request_handler!(PostSubmodelElementByPathHandler);

impl PostSubmodelElementByPathHandler {
    const POLICY: PublishPolicy = PublishPolicy::Required;
}

impl RequestHandler for PostSubmodelElementByPathHandler {
    fn kind(&self) -> RequestKind {
        RequestKind::PostSubmodelElementByPath
    }

    fn process(&self, request: Request) -> Result<Response, HandlerError> {
        let Request::PostSubmodelElementByPath {
            submodel_id,
            parent,
            element,
        } = request
        else {
            return Err(HandlerError::UnexpectedRequest(self.kind()));
        };
        let parent_ref = match &parent {
            Some(path) => Reference::element(&submodel_id, path),
            None => Reference::submodel(&submodel_id),
        };
        let created = self
            .ctx
            .persistence
            .create_element(&parent_ref, element.clone())
            .map_err(HandlerError::from_create)?;
        self.ctx.publish(
            EventMessage::element_create(created, Referable::Element(element.clone())),
            Self::POLICY,
        )?;
        Ok(Response::created(Payload::Element(element)))
    }
}

request_handler!(
    /// Replaces one element. With a bound value provider the new value is
    /// written to the asset first.
    PutSubmodelElementByPathHandler
);

impl PutSubmodelElementByPathHandler {
    const POLICY: PublishPolicy = PublishPolicy::Required;
}

impl RequestHandler for PutSubmodelElementByPathHandler {
    fn kind(&self) -> RequestKind {
        RequestKind::PutSubmodelElementByPath
    }

    fn process(&self, request: Request) -> Result<Response, HandlerError> {
        let Request::PutSubmodelElementByPath {
            submodel_id,
            path,
            element,
        } = request
        else {
            return Err(HandlerError::UnexpectedRequest(self.kind()));
        };
        if element.id_short() != path.last() {
            return Err(HandlerError::BadRequest(format!(
                "element '{}' cannot be stored at '{path}'",
                element.id_short()
            )));
        }
        let reference = Reference::element(&submodel_id, &path);
        self.ctx.persistence.get_element(&reference, &QueryModifier::default())?;

        if self.ctx.assets.has_value_provider(&reference) {
            self.ctx.assets.get_value_provider(&reference)?.write(&element.value())?;
            debug!(reference = %reference, "value written to asset");
        }
        // the element may have been deleted since the check above
        self.ctx.persistence.replace_element(&reference, element.clone())?;
        self.ctx.publish(
            EventMessage::element_update(reference, Referable::Element(element)),
            Self::POLICY,
        )?;
        Ok(Response::new(StatusCode::Success))
    }
}

request_handler!(DeleteSubmodelElementByPathHandler);

impl DeleteSubmodelElementByPathHandler {
    const POLICY: PublishPolicy = PublishPolicy::Required;
}

impl RequestHandler for DeleteSubmodelElementByPathHandler {
    fn kind(&self) -> RequestKind {
        RequestKind::DeleteSubmodelElementByPath
    }

    fn process(&self, request: Request) -> Result<Response, HandlerError> {
        let Request::DeleteSubmodelElementByPath { submodel_id, path } = request else {
            return Err(HandlerError::UnexpectedRequest(self.kind()));
        };
        let reference = Reference::element(&submodel_id, &path);
        let removed = self.ctx.persistence.remove_element(&reference)?;
        self.ctx.publish(
            EventMessage::element_delete(reference, Referable::Element(removed)),
            Self::POLICY,
        )?;
        Ok(Response::new(StatusCode::Success))
    }
}

request_handler!(
    /// Sets an element's value from its raw string form.
    ///
    /// The raw value is parsed against the element's current shape, written
    /// to a bound asset, then stored. `ValueChange` carries the old and new
    /// value.
    SetSubmodelElementValueByPathHandler
);

impl SetSubmodelElementValueByPathHandler {
    const POLICY: PublishPolicy = PublishPolicy::BestEffort;
}

impl RequestHandler for SetSubmodelElementValueByPathHandler {
    fn kind(&self) -> RequestKind {
        RequestKind::SetSubmodelElementValueByPath
    }

    fn process(&self, request: Request) -> Result<Response, HandlerError> {
        let Request::SetSubmodelElementValueByPath {
            submodel_id,
            path,
            raw_value,
        } = request
        else {
            return Err(HandlerError::UnexpectedRequest(self.kind()));
        };
        let reference = Reference::element(&submodel_id, &path);
        let current = self.ctx.persistence.get_element(&reference, &QueryModifier::MAXIMAL)?;
        let value = ElementValue::parse(&raw_value, &current)?;

        if self.ctx.assets.has_value_provider(&reference) {
            self.ctx.assets.get_value_provider(&reference)?.write(&value)?;
            debug!(reference = %reference, "value written to asset");
        }
        let old = self.ctx.persistence.set_element_value(&reference, value.clone())?;
        self.ctx
            .publish(EventMessage::value_change(reference, old, value), Self::POLICY)?;
        Ok(Response::new(StatusCode::Success))
    }
}
