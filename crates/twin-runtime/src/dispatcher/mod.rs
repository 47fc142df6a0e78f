//! Request dispatcher.
//!
//! Routes each [`Request`] to the handler registered for its
//! [`RequestKind`] and turns every outcome into a [`Response`]:
//!
//! ```text
//! Request ──validate──► handler.process ──► Ok(Response)
//!    │                       │
//!    │ InvalidArgument       ├─ Err(HandlerError) ─► Response(err.status())
//!    ▼                       └─ panic ─────────────► Response(ServerInternalError)
//! Response(ClientErrorBadRequest)
//! ```
//!
//! # Worker Pool
//!
//! [`execute_async`](RequestDispatcher::execute_async) runs requests on a
//! tokio blocking pool capped at `core.request_handler_threads` threads.
//! Requests beyond the cap queue until a thread frees up.

mod error;

pub use error::DispatchError;

use crate::config::CoreConfig;
use crate::handler::{default_handlers, HandlerContext, RequestHandler};
use crate::request::{Request, RequestKind};
use crate::response::Response;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, error, info, warn};
use twin_types::ErrorCode;

type Registry = HashMap<RequestKind, Box<dyn RequestHandler>>;

/// Routes requests to handlers, synchronously or on a worker pool.
pub struct RequestDispatcher {
    handlers: Arc<Registry>,
    runtime: Mutex<Option<Runtime>>,
}

impl RequestDispatcher {
    /// Builds the registry and the worker pool.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::DuplicateHandler`] if two handlers share a kind
    /// - [`DispatchError::PoolUnavailable`] if the pool cannot be created
    pub fn new(handlers: Vec<Box<dyn RequestHandler>>, config: &CoreConfig) -> Result<Self, DispatchError> {
        let mut registry: Registry = HashMap::with_capacity(handlers.len());
        for handler in handlers {
            let kind = handler.kind();
            if registry.insert(kind, handler).is_some() {
                return Err(DispatchError::DuplicateHandler(kind));
            }
        }

        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(config.request_handler_threads.max(1))
            .thread_name("twin-request-handler")
            .build()
            .map_err(|e| DispatchError::PoolUnavailable(e.to_string()))?;

        info!(
            handlers = registry.len(),
            threads = config.request_handler_threads,
            "request dispatcher ready"
        );
        Ok(Self {
            handlers: Arc::new(registry),
            runtime: Mutex::new(Some(runtime)),
        })
    }

    /// Dispatcher with one handler per [`RequestKind`].
    ///
    /// # Errors
    ///
    /// Same as [`RequestDispatcher::new`].
    pub fn with_context(ctx: &HandlerContext, config: &CoreConfig) -> Result<Self, DispatchError> {
        Self::new(default_handlers(ctx), config)
    }

    /// Processes `request` on the calling thread. Never fails: errors and
    /// handler panics come back as non-success responses.
    #[must_use]
    pub fn execute(&self, request: Request) -> Response {
        execute_with(&self.handlers, request)
    }

    /// Processes `request` on the worker pool and hands the response to
    /// `callback` on the worker thread.
    ///
    /// A panicking callback is logged and does not affect the pool.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::PoolUnavailable`] after
    /// [`shutdown`](Self::shutdown).
    pub fn execute_async(
        &self,
        request: Request,
        callback: impl FnOnce(Response) + Send + 'static,
    ) -> Result<(), DispatchError> {
        let guard = self.runtime.lock();
        let Some(runtime) = guard.as_ref() else {
            return Err(DispatchError::PoolUnavailable("dispatcher shut down".into()));
        };
        let handlers = Arc::clone(&self.handlers);
        let kind = request.kind();
        runtime.spawn_blocking(move || {
            let response = execute_with(&handlers, request);
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(response))) {
                warn!(kind = %kind, panic = %panic_message(payload.as_ref()), "response callback panicked");
            }
        });
        Ok(())
    }

    /// Stops the worker pool, waiting up to `timeout` for running requests.
    ///
    /// Must not be called from inside an async context.
    pub fn shutdown(&self, timeout: Duration) {
        if let Some(runtime) = self.runtime.lock().take() {
            runtime.shutdown_timeout(timeout);
            info!("request dispatcher stopped");
        }
    }
}

impl Drop for RequestDispatcher {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.get_mut().take() {
            runtime.shutdown_background();
        }
    }
}

fn execute_with(handlers: &Registry, request: Request) -> Response {
    let kind = request.kind();
    if let Err(e) = request.validate() {
        debug!(kind = %kind, code = e.code(), error = %e, "request rejected");
        return Response::error(e.status(), e.to_string());
    }
    let Some(handler) = handlers.get(&kind) else {
        let e = DispatchError::NoHandler(kind);
        error!(kind = %kind, code = e.code(), "{e}");
        return Response::error(e.status(), e.to_string());
    };

    match panic::catch_unwind(AssertUnwindSafe(|| handler.process(request))) {
        Ok(Ok(response)) => {
            debug!(kind = %kind, status = %response.status, "request processed");
            response
        }
        Ok(Err(e)) => {
            let status = e.status();
            if status.is_server_error() {
                warn!(kind = %kind, status = %status, code = e.code(), error = %e, "request failed");
            } else {
                debug!(kind = %kind, status = %status, code = e.code(), error = %e, "request failed");
            }
            Response::error(status, e.to_string())
        }
        Err(payload) => {
            let e = DispatchError::HandlerPanicked {
                kind,
                message: panic_message(payload.as_ref()),
            };
            error!(kind = %kind, code = e.code(), "{e}");
            Response::error(e.status(), e.to_string())
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
