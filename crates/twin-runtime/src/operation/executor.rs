//! Drives an invocation through the provider and the state machine.

use super::{OperationHandle, OperationOutput, OperationResult};
use crate::asset::{AssetConnectionError, OperationCall};
use crate::handler::{HandlerContext, HandlerError, PublishPolicy};
use tracing::{debug, info, warn};
use twin_event::EventMessage;
use twin_model::argument_values;
use twin_types::{ErrorCode, HandleId, Reference, RequestId};

/// Starts an asynchronous invocation and returns its handle.
///
/// The `Running` record exists and `OperationInvoke` has been published
/// before the provider sees the call. The outcome lands through
/// [`finish`], on whatever thread the provider completes on.
pub(crate) fn invoke_async(
    ctx: &HandlerContext,
    reference: Reference,
    request_id: RequestId,
    call: OperationCall,
) -> Result<OperationHandle, HandlerError> {
    if !ctx.assets.has_operation_provider(&reference) {
        return Err(HandlerError::NoOperationProvider(reference));
    }
    let provider = ctx.assets.get_operation_provider(&reference)?;

    let record = OperationResult::running(request_id, call.input.clone(), call.inoutput.clone());
    let handle = ctx.persistence.put_operation_context(None, request_id, record)?;
    info!(reference = %reference, handle_id = %handle.handle_id, "operation started");

    ctx.publish(invoke_event(&reference, &call), PublishPolicy::BestEffort)?;

    let completion_ctx = ctx.clone();
    let completion_ref = reference.clone();
    let handle_id = handle.handle_id;
    let dispatched = provider.invoke_async(
        call,
        Box::new(move |outcome| finish(&completion_ctx, &completion_ref, handle_id, outcome)),
    );

    if let Err(e) = dispatched {
        warn!(reference = %reference, handle_id = %handle_id, code = e.code(), error = %e, "operation rejected by provider");
        finish(ctx, &reference, handle_id, Err(e));
    }
    Ok(handle)
}

/// Applies a provider outcome to the stored record.
///
/// Runs at most once per handle in effect: the transition happens under
/// the record's lock and a terminal record is left alone, so only the
/// first outcome publishes `OperationFinish`.
pub(crate) fn finish(
    ctx: &HandlerContext,
    reference: &Reference,
    handle_id: HandleId,
    outcome: Result<OperationOutput, AssetConnectionError>,
) {
    let mut applied = false;
    let mut outcome = Some(outcome);
    let updated = ctx.persistence.update_operation_result(&handle_id, &mut |record: &mut OperationResult| {
        let Some(outcome) = outcome.take() else {
            return;
        };
        let transition = match outcome {
            Ok(out) => record.complete(out.output, out.inoutput),
            Err(e) => record.fail(e.to_string()),
        };
        applied = transition.is_ok();
    });

    let record = match updated {
        Ok(record) => record,
        Err(e) => {
            warn!(handle_id = %handle_id, code = e.code(), error = %e, "operation result lost");
            return;
        }
    };
    if !applied {
        debug!(handle_id = %handle_id, state = ?record.execution_state, "late completion ignored");
        return;
    }

    info!(reference = %reference, handle_id = %handle_id, state = ?record.execution_state, "operation finished");
    // best-effort publish cannot fail
    let _ = ctx.publish(finish_event(reference, &record), PublishPolicy::BestEffort);
}

/// Runs an invocation to completion on the calling thread.
///
/// A provider failure yields a `Failed` result rather than an error; only
/// a missing provider is an error.
pub(crate) fn invoke_sync(
    ctx: &HandlerContext,
    reference: Reference,
    request_id: RequestId,
    call: OperationCall,
) -> Result<OperationResult, HandlerError> {
    if !ctx.assets.has_operation_provider(&reference) {
        return Err(HandlerError::NoOperationProvider(reference));
    }
    let provider = ctx.assets.get_operation_provider(&reference)?;

    ctx.publish(invoke_event(&reference, &call), PublishPolicy::BestEffort)?;

    let mut record = OperationResult::running(request_id, call.input.clone(), call.inoutput.clone());
    let transition = match provider.invoke(&call) {
        Ok(out) => record.complete(out.output, out.inoutput),
        Err(e) => {
            warn!(reference = %reference, code = e.code(), error = %e, "operation failed");
            record.fail(e.to_string())
        }
    };
    transition?;

    ctx.publish(finish_event(&reference, &record), PublishPolicy::BestEffort)?;
    Ok(record)
}

fn invoke_event(reference: &Reference, call: &OperationCall) -> EventMessage {
    EventMessage::operation_invoke(
        reference.clone(),
        argument_values(&call.input),
        argument_values(&call.inoutput),
    )
}

fn finish_event(reference: &Reference, record: &OperationResult) -> EventMessage {
    EventMessage::operation_finish(
        reference.clone(),
        argument_values(&record.output_arguments),
        argument_values(&record.inoutput_arguments),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetConnectionManager, Binding};
    use crate::operation::ExecutionState;
    use crate::persistence::{InMemoryPersistence, Persistence};
    use crate::testing::{FakeConnection, RecordingBus, ThreadedOperationProvider};
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use twin_event::EventKind;
    use twin_model::{DataValue, OperationVariable, SubmodelElement, ValueType};
    use twin_types::Identifier;

    fn op_ref() -> Reference {
        Reference::submodel(&Identifier::new("urn:sm:motor")).child("Calibrate")
    }

    fn arg(name: &str, v: i64) -> OperationVariable {
        OperationVariable::new(SubmodelElement::property(name, ValueType::Integer, Some(DataValue::Integer(v))))
    }

    fn call(input: Vec<OperationVariable>, inoutput: Vec<OperationVariable>) -> OperationCall {
        OperationCall {
            input,
            inoutput,
            output_variables: vec![],
        }
    }

    fn context(provider: Option<Arc<ThreadedOperationProvider>>) -> (HandlerContext, Arc<RecordingBus>) {
        let bus = Arc::new(RecordingBus::new());
        let assets = match provider {
            Some(p) => {
                let conn = FakeConnection::new("plc", vec![Binding::operation(op_ref(), p)]);
                AssetConnectionManager::new(vec![Arc::new(conn)]).unwrap()
            }
            None => AssetConnectionManager::empty(),
        };
        let ctx = HandlerContext::new(Arc::new(InMemoryPersistence::new()), bus.clone(), Arc::new(assets));
        (ctx, bus)
    }

    fn wait_terminal(persistence: &dyn Persistence, handle: &HandleId) -> OperationResult {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let r = persistence.get_operation_result(handle).unwrap();
            if r.is_terminal() || Instant::now() > deadline {
                return r;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn async_completion_lands_on_record() {
        let provider = Arc::new(ThreadedOperationProvider::echo());
        let (ctx, bus) = context(Some(provider));
        let handle = invoke_async(&ctx, op_ref(), RequestId::new(), call(vec![arg("in", 7)], vec![arg("io", 1)])).unwrap();

        let result = wait_terminal(ctx.persistence.as_ref(), &handle.handle_id);
        assert_eq!(result.execution_state, ExecutionState::Completed);
        assert_eq!(result.output_arguments, vec![arg("in", 7)]);

        bus.wait_for(2, Duration::from_secs(5));
        assert_eq!(bus.kinds(), vec![EventKind::OperationInvoke, EventKind::OperationFinish]);
    }

    #[test]
    fn synchronous_rejection_fails_record() {
        let provider = Arc::new(ThreadedOperationProvider::echo());
        provider.reject_next();
        let (ctx, bus) = context(Some(provider));
        let handle = invoke_async(&ctx, op_ref(), RequestId::new(), call(vec![], vec![arg("io", 3)])).unwrap();

        let result = ctx.persistence.get_operation_result(&handle.handle_id).unwrap();
        assert_eq!(result.execution_state, ExecutionState::Failed);
        assert!(result.output_arguments.is_empty());
        assert_eq!(result.inoutput_arguments, vec![arg("io", 3)]);
        assert_eq!(bus.kinds(), vec![EventKind::OperationInvoke, EventKind::OperationFinish]);
    }

    #[test]
    fn no_provider_creates_no_record() {
        let (ctx, bus) = context(None);
        let err = invoke_async(&ctx, op_ref(), RequestId::new(), call(vec![], vec![])).unwrap_err();
        assert!(matches!(err, HandlerError::NoOperationProvider(_)));
        assert!(bus.events().is_empty());
    }

    #[test]
    fn second_completion_is_ignored() {
        let (ctx, bus) = context(Some(Arc::new(ThreadedOperationProvider::echo())));
        let handle = ctx
            .persistence
            .put_operation_context(None, RequestId::new(), OperationResult::running(RequestId::new(), vec![], vec![]))
            .unwrap();

        finish(&ctx, &op_ref(), handle.handle_id, Ok(OperationOutput::default()));
        finish(&ctx, &op_ref(), handle.handle_id, Err(AssetConnectionError::Failed("late".into())));

        let result = ctx.persistence.get_operation_result(&handle.handle_id).unwrap();
        assert_eq!(result.execution_state, ExecutionState::Completed);
        assert_eq!(bus.kinds(), vec![EventKind::OperationFinish]);
    }

    #[test]
    fn sync_invoke_reports_provider_failure_as_failed_result() {
        let provider = Arc::new(ThreadedOperationProvider::echo());
        provider.reject_next();
        let (ctx, bus) = context(Some(provider));
        let result = invoke_sync(&ctx, op_ref(), RequestId::new(), call(vec![arg("in", 1)], vec![])).unwrap();
        assert_eq!(result.execution_state, ExecutionState::Failed);
        assert!(result.message.is_some());
        assert_eq!(bus.kinds(), vec![EventKind::OperationInvoke, EventKind::OperationFinish]);
    }

    #[test]
    fn sync_invoke_returns_outputs() {
        let (ctx, _bus) = context(Some(Arc::new(ThreadedOperationProvider::echo())));
        let result = invoke_sync(&ctx, op_ref(), RequestId::new(), call(vec![arg("in", 5)], vec![arg("io", 2)])).unwrap();
        assert_eq!(result.execution_state, ExecutionState::Completed);
        assert_eq!(result.output_arguments, vec![arg("in", 5)]);
        assert_eq!(result.inoutput_arguments, vec![arg("io", 2)]);
    }
}
