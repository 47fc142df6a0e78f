//! Operation invocation handlers.

use super::{request_handler, HandlerContext, HandlerError, RequestHandler};
use crate::asset::OperationCall;
use crate::operation::{invoke_async, invoke_sync};
use crate::request::{Request, RequestKind};
use crate::response::{Payload, Response};
use twin_model::{OperationVariable, QueryModifier, SubmodelElement};
use twin_types::{IdShortPath, Identifier, Reference};

request_handler!(InvokeOperationSyncHandler);

impl RequestHandler for InvokeOperationSyncHandler {
    fn kind(&self) -> RequestKind {
        RequestKind::InvokeOperationSync
    }

    fn process(&self, request: Request) -> Result<Response, HandlerError> {
        let Request::InvokeOperationSync {
            request_id,
            submodel_id,
            path,
            input_arguments,
            inoutput_arguments,
        } = request
        else {
            return Err(HandlerError::UnexpectedRequest(self.kind()));
        };
        let (reference, call) = resolve_operation(&self.ctx, &submodel_id, &path, input_arguments, inoutput_arguments)?;
        let result = invoke_sync(&self.ctx, reference, request_id, call)?;
        Ok(Response::ok(Payload::OperationResult(result)))
    }
}

request_handler!(
    /// Starts an operation and answers with its handle right away.
    InvokeOperationAsyncHandler
);

impl RequestHandler for InvokeOperationAsyncHandler {
    fn kind(&self) -> RequestKind {
        RequestKind::InvokeOperationAsync
    }

    fn process(&self, request: Request) -> Result<Response, HandlerError> {
        let Request::InvokeOperationAsync {
            request_id,
            submodel_id,
            path,
            input_arguments,
            inoutput_arguments,
        } = request
        else {
            return Err(HandlerError::UnexpectedRequest(self.kind()));
        };
        let (reference, call) = resolve_operation(&self.ctx, &submodel_id, &path, input_arguments, inoutput_arguments)?;
        let handle = invoke_async(&self.ctx, reference, request_id, call)?;
        Ok(Response::ok(Payload::OperationHandle(handle)))
    }
}

request_handler!(GetOperationAsyncResultHandler);

impl RequestHandler for GetOperationAsyncResultHandler {
    fn kind(&self) -> RequestKind {
        RequestKind::GetOperationAsyncResult
    }

    fn process(&self, request: Request) -> Result<Response, HandlerError> {
        let Request::GetOperationAsyncResult { handle_id } = request else {
            return Err(HandlerError::UnexpectedRequest(self.kind()));
        };
        let result = self.ctx.persistence.get_operation_result(&handle_id)?;
        Ok(Response::ok(Payload::OperationResult(result)))
    }
}

/// Resolves the target of an invocation, which must be an existing
/// operation element, and pairs the arguments with its declared outputs.
fn resolve_operation(
    ctx: &HandlerContext,
    submodel_id: &Identifier,
    path: &IdShortPath,
    input: Vec<OperationVariable>,
    inoutput: Vec<OperationVariable>,
) -> Result<(Reference, OperationCall), HandlerError> {
    let reference = Reference::element(submodel_id, path);
    match ctx.persistence.get_element(&reference, &QueryModifier::MAXIMAL)? {
        SubmodelElement::Operation(operation) => Ok((
            reference,
            OperationCall {
                input,
                inoutput,
                output_variables: operation.output_variables,
            },
        )),
        other => Err(HandlerError::BadRequest(format!(
            "{reference} is a {}, not an Operation",
            other.model_type()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetConnectionManager, Binding};
    use crate::operation::{ExecutionState, OperationOutput};
    use crate::persistence::InMemoryPersistence;
    use crate::testing::{FakeConnection, RecordingBus, ThreadedOperationProvider};
    use std::sync::Arc;
    use twin_model::{Environment, Submodel, ValueType};
    use twin_types::{HandleId, RequestId, StatusCode};

    fn sm_id() -> Identifier {
        Identifier::new("urn:sm:motor")
    }

    fn deviation() -> OperationVariable {
        OperationVariable::new(SubmodelElement::property("Deviation", ValueType::Double, None))
    }

    fn setup() -> (HandlerContext, Arc<RecordingBus>) {
        setup_with(Arc::new(ThreadedOperationProvider::echo()))
    }

    fn setup_with(provider: Arc<ThreadedOperationProvider>) -> (HandlerContext, Arc<RecordingBus>) {
        let env = Environment {
            asset_administration_shells: vec![],
            submodels: vec![Submodel::new(sm_id(), "Motor").with_elements(vec![
                SubmodelElement::operation("Calibrate", vec![], vec![deviation()], vec![]),
                SubmodelElement::property("Speed", ValueType::Integer, None),
            ])],
        };
        let calibrate = Reference::element(&sm_id(), &IdShortPath::single("Calibrate").unwrap());
        let conn = FakeConnection::new("plc", vec![Binding::operation(calibrate, provider)]);
        let bus = Arc::new(RecordingBus::new());
        let ctx = HandlerContext::new(
            Arc::new(InMemoryPersistence::with_environment(env)),
            bus.clone(),
            Arc::new(AssetConnectionManager::new(vec![Arc::new(conn)]).unwrap()),
        );
        (ctx, bus)
    }

    fn invoke_sync_request(path: &str) -> Request {
        Request::InvokeOperationSync {
            request_id: RequestId::new(),
            submodel_id: sm_id(),
            path: IdShortPath::parse(path).unwrap(),
            input_arguments: vec![],
            inoutput_arguments: vec![],
        }
    }

    #[test]
    fn sync_invoke_returns_completed_result() {
        let (ctx, _) = setup();
        let resp = InvokeOperationSyncHandler::new(ctx).process(invoke_sync_request("Calibrate")).unwrap();
        let Some(Payload::OperationResult(result)) = resp.payload else {
            panic!("expected operation result");
        };
        assert_eq!(result.execution_state, ExecutionState::Completed);
    }

    #[test]
    fn provider_receives_declared_outputs() {
        let provider = Arc::new(ThreadedOperationProvider::with_behavior(|call| {
            Ok(OperationOutput {
                output: call.output_variables,
                inoutput: call.inoutput,
            })
        }));
        let (ctx, _) = setup_with(provider);
        let resp = InvokeOperationSyncHandler::new(ctx).process(invoke_sync_request("Calibrate")).unwrap();
        let Some(Payload::OperationResult(result)) = resp.payload else {
            panic!("expected operation result");
        };
        assert_eq!(result.output_arguments, vec![deviation()]);
    }

    #[test]
    fn invoking_a_property_is_bad_request() {
        let (ctx, bus) = setup();
        let err = InvokeOperationSyncHandler::new(ctx).process(invoke_sync_request("Speed")).unwrap_err();
        assert_eq!(err.status(), StatusCode::ClientErrorBadRequest);
        assert!(bus.events().is_empty());
    }

    #[test]
    fn invoking_missing_operation_is_not_found() {
        let (ctx, _) = setup();
        let err = InvokeOperationSyncHandler::new(ctx).process(invoke_sync_request("Reset")).unwrap_err();
        assert_eq!(err.status(), StatusCode::ClientErrorResourceNotFound);
    }

    #[test]
    fn unknown_handle_is_not_found() {
        let (ctx, _) = setup();
        let err = GetOperationAsyncResultHandler::new(ctx)
            .process(Request::GetOperationAsyncResult {
                handle_id: HandleId::new(),
            })
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::ClientErrorResourceNotFound);
    }
}
