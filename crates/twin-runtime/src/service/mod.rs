//! Service facade.
//!
//! Wires persistence, the message bus, asset connections and the request
//! dispatcher together and owns their lifecycle.
//!
//! ```text
//! Service::builder(config)
//!     .environment(env)            required
//!     .persistence(p)              default: InMemoryPersistence
//!     .message_bus(b)              default: InternalMessageBus
//!     .asset_connection(c) ...     zero or more
//!     .build()?
//!
//! start():  load environment → start bus → subscribe asset pushes
//! stop():   unsubscribe asset pushes → stop bus → stop dispatcher → close connections
//! ```
//!
//! # Example
//!
//! ```
//! use twin_model::{Environment, QueryModifier};
//! use twin_runtime::{Request, Service, ServiceConfig};
//! use twin_types::StatusCode;
//!
//! let service = Service::builder(ServiceConfig::default())
//!     .environment(Environment::default())
//!     .build()
//!     .unwrap();
//! service.start().unwrap();
//!
//! let response = service.execute(Request::GetAllSubmodels {
//!     modifier: QueryModifier::default(),
//! });
//! assert_eq!(response.status, StatusCode::Success);
//!
//! service.stop().unwrap();
//! ```

mod error;

pub use error::ServiceError;

use crate::asset::{AssetConnection, AssetConnectionManager, AssetSubscriptionProvider, ValueListener};
use crate::bus::{InternalMessageBus, MessageBus};
use crate::config::{ConfigError, ServiceConfig};
use crate::dispatcher::RequestDispatcher;
use crate::handler::{HandlerContext, PublishPolicy};
use crate::persistence::{InMemoryPersistence, Persistence};
use crate::request::Request;
use crate::response::Response;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use twin_event::EventMessage;
use twin_model::{ElementValue, Environment};
use twin_types::{ErrorCode, Reference};

/// How long [`Service::stop`] waits for in-flight requests.
const DISPATCHER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServiceState {
    Created,
    Running,
    Stopped,
}

/// Builder for [`Service`].
pub struct ServiceBuilder {
    config: ServiceConfig,
    environment: Option<Environment>,
    persistence: Option<Arc<dyn Persistence>>,
    message_bus: Option<Arc<dyn MessageBus>>,
    connections: Vec<Arc<dyn AssetConnection>>,
}

impl ServiceBuilder {
    /// Initial model loaded into persistence on [`Service::start`].
    #[must_use]
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    #[must_use]
    pub fn persistence(mut self, persistence: Arc<dyn Persistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    #[must_use]
    pub fn message_bus(mut self, message_bus: Arc<dyn MessageBus>) -> Self {
        self.message_bus = Some(message_bus);
        self
    }

    #[must_use]
    pub fn asset_connection(mut self, connection: Arc<dyn AssetConnection>) -> Self {
        self.connections.push(connection);
        self
    }

    /// Validates the configuration and assembles the service.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Configuration`] for an invalid config, a missing
    ///   environment or duplicate asset bindings
    /// - [`ServiceError::Dispatch`] if the worker pool cannot be created
    pub fn build(self) -> Result<Service, ServiceError> {
        self.config.validate()?;
        let environment = self.environment.ok_or(ConfigError::MissingEnvironment)?;

        let persistence = self
            .persistence
            .unwrap_or_else(|| Arc::new(InMemoryPersistence::new()));
        let message_bus = self.message_bus.unwrap_or_else(|| {
            Arc::new(InternalMessageBus::new(self.config.message_bus.subscriber_queue_capacity))
        });
        let assets = Arc::new(AssetConnectionManager::new(self.connections)?);

        let context = HandlerContext::new(persistence, message_bus, assets);
        let dispatcher = RequestDispatcher::with_context(&context, &self.config.core)?;

        Ok(Service {
            config: self.config,
            environment,
            context,
            dispatcher,
            state: Mutex::new(ServiceState::Created),
            subscribed: Mutex::new(Vec::new()),
        })
    }
}

/// A running digital twin core.
pub struct Service {
    config: ServiceConfig,
    environment: Environment,
    context: HandlerContext,
    dispatcher: RequestDispatcher,
    state: Mutex<ServiceState>,
    subscribed: Mutex<Vec<(Reference, Arc<dyn AssetSubscriptionProvider>)>>,
}

impl Service {
    #[must_use]
    pub fn builder(config: ServiceConfig) -> ServiceBuilder {
        ServiceBuilder {
            config,
            environment: None,
            persistence: None,
            message_bus: None,
            connections: Vec::new(),
        }
    }

    /// Loads the environment, starts the bus and subscribes to every
    /// asset subscription binding.
    ///
    /// A binding whose asset refuses the subscription is logged and
    /// skipped.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::AlreadyStarted`] / [`ServiceError::Stopped`] for
    ///   a second start
    /// - [`ServiceError::Bus`] if the bus fails to start
    pub fn start(&self) -> Result<(), ServiceError> {
        let mut state = self.state.lock();
        match *state {
            ServiceState::Created => {}
            ServiceState::Running => return Err(ServiceError::AlreadyStarted),
            ServiceState::Stopped => return Err(ServiceError::Stopped),
        }

        self.context.persistence.set_environment(self.environment.clone());
        self.context.message_bus.start()?;

        let mut subscribed = self.subscribed.lock();
        for (reference, provider) in self.context.assets.subscription_providers() {
            match provider.subscribe(self.value_listener(reference.clone())) {
                Ok(()) => {
                    debug!(reference = %reference, "asset subscription active");
                    subscribed.push((reference, provider));
                }
                Err(e) => {
                    warn!(reference = %reference, code = e.code(), error = %e, "asset refused subscription");
                }
            }
        }

        *state = ServiceState::Running;
        info!(
            connections = self.context.assets.connections().len(),
            subscriptions = subscribed.len(),
            "service started"
        );
        Ok(())
    }

    /// Shuts everything down in reverse order of [`start`](Self::start).
    ///
    /// In-flight asset completions are not awaited; one arriving later
    /// still updates persistence but its event is dropped by the stopped
    /// bus.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotStarted`] if the service is not running
    /// - [`ServiceError::Bus`] if the bus failed to stop
    pub fn stop(&self) -> Result<(), ServiceError> {
        let mut state = self.state.lock();
        if *state != ServiceState::Running {
            return Err(ServiceError::NotStarted);
        }
        *state = ServiceState::Stopped;

        for (reference, provider) in self.subscribed.lock().drain(..) {
            if let Err(e) = provider.unsubscribe() {
                warn!(reference = %reference, code = e.code(), error = %e, "failed to unsubscribe from asset");
            }
        }
        let bus_result = self.context.message_bus.stop();
        self.dispatcher.shutdown(DISPATCHER_SHUTDOWN_TIMEOUT);
        self.context.assets.close();
        info!("service stopped");
        bus_result.map_err(ServiceError::from)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        *self.state.lock() == ServiceState::Running
    }

    /// Processes a request on the calling thread.
    #[must_use]
    pub fn execute(&self, request: Request) -> Response {
        self.dispatcher.execute(request)
    }

    /// Processes a request on the worker pool.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Dispatch`] once the service has stopped.
    pub fn execute_async(
        &self,
        request: Request,
        callback: impl FnOnce(Response) + Send + 'static,
    ) -> Result<(), ServiceError> {
        Ok(self.dispatcher.execute_async(request, callback)?)
    }

    /// The bus events are published on, for subscribing.
    #[must_use]
    pub fn message_bus(&self) -> Arc<dyn MessageBus> {
        Arc::clone(&self.context.message_bus)
    }

    #[must_use]
    pub fn persistence(&self) -> Arc<dyn Persistence> {
        Arc::clone(&self.context.persistence)
    }

    #[must_use]
    pub fn asset_connections(&self) -> &AssetConnectionManager {
        &self.context.assets
    }

    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Stores values pushed by the asset and announces them.
    fn value_listener(&self, reference: Reference) -> ValueListener {
        let ctx = self.context.clone();
        Arc::new(move |value: ElementValue| {
            match ctx.persistence.set_element_value(&reference, value.clone()) {
                Ok(old) => {
                    // best-effort publish cannot fail
                    let _ = ctx.publish(
                        EventMessage::value_change(reference.clone(), old, value),
                        PublishPolicy::BestEffort,
                    );
                }
                Err(e) => {
                    warn!(reference = %reference, code = e.code(), error = %e, "pushed asset value not stored");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Binding;
    use crate::testing::{FakeConnection, FakeSubscriptionProvider, FakeValueProvider, RecordingBus};
    use twin_event::EventKind;
    use twin_model::{DataValue, QueryModifier, Submodel, SubmodelElement, ValueType};
    use twin_types::Identifier;

    fn speed() -> Reference {
        Reference::submodel(&Identifier::new("urn:sm:motor")).child("Speed")
    }

    fn environment() -> Environment {
        Environment {
            asset_administration_shells: vec![],
            submodels: vec![Submodel::new(Identifier::new("urn:sm:motor"), "Motor")
                .with_elements(vec![SubmodelElement::property("Speed", ValueType::Integer, Some(DataValue::Integer(0)))])],
        }
    }

    #[test]
    fn build_without_environment_is_configuration_error() {
        let err = Service::builder(ServiceConfig::default()).build().err().unwrap();
        assert!(matches!(err, ServiceError::Configuration(ConfigError::MissingEnvironment)));
    }

    #[test]
    fn build_rejects_invalid_config() {
        let mut config = ServiceConfig::default();
        config.core.request_handler_threads = 0;
        let err = Service::builder(config).environment(environment()).build().err().unwrap();
        assert!(matches!(err, ServiceError::Configuration(ConfigError::Invalid { .. })));
    }

    #[test]
    fn build_rejects_duplicate_bindings() {
        let provider = Arc::new(FakeValueProvider::new(ElementValue::Property(None)));
        let a = FakeConnection::new("a", vec![Binding::value(speed(), provider.clone())]);
        let b = FakeConnection::new("b", vec![Binding::value(speed(), provider)]);
        let err = Service::builder(ServiceConfig::default())
            .environment(environment())
            .asset_connection(Arc::new(a))
            .asset_connection(Arc::new(b))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, ServiceError::Configuration(ConfigError::DuplicateBinding { .. })));
    }

    #[test]
    fn lifecycle_is_one_way() {
        let service = Service::builder(ServiceConfig::default())
            .environment(environment())
            .build()
            .unwrap();
        assert!(matches!(service.stop(), Err(ServiceError::NotStarted)));
        service.start().unwrap();
        assert!(service.is_running());
        assert!(matches!(service.start(), Err(ServiceError::AlreadyStarted)));
        service.stop().unwrap();
        assert!(matches!(service.start(), Err(ServiceError::Stopped)));
    }

    #[test]
    fn start_loads_environment() {
        let service = Service::builder(ServiceConfig::default())
            .environment(environment())
            .build()
            .unwrap();
        assert!(service.persistence().get_all_submodels(&QueryModifier::default()).is_empty());
        service.start().unwrap();
        assert_eq!(service.persistence().get_all_submodels(&QueryModifier::default()).len(), 1);
        service.stop().unwrap();
    }

    #[test]
    fn pushed_values_are_stored_and_published() {
        let bus = Arc::new(RecordingBus::new());
        let pusher = Arc::new(FakeSubscriptionProvider::new());
        let conn = Arc::new(FakeConnection::new("plc", vec![Binding::subscription(speed(), pusher.clone())]));
        let service = Service::builder(ServiceConfig::default())
            .environment(environment())
            .message_bus(bus.clone())
            .asset_connection(conn.clone())
            .build()
            .unwrap();
        service.start().unwrap();

        pusher.push(ElementValue::Property(Some(DataValue::Integer(1500))));

        let stored = service
            .persistence()
            .get_element(&speed(), &QueryModifier::default())
            .unwrap();
        assert_eq!(stored.value(), ElementValue::Property(Some(DataValue::Integer(1500))));
        assert_eq!(bus.kinds(), vec![EventKind::ValueChange]);

        service.stop().unwrap();
        assert!(!pusher.is_subscribed());
        assert!(conn.is_closed());
    }

    #[test]
    fn refused_subscription_does_not_block_start() {
        let conn = FakeConnection::new(
            "plc",
            vec![Binding::subscription(speed(), Arc::new(FakeSubscriptionProvider::refusing()))],
        );
        let service = Service::builder(ServiceConfig::default())
            .environment(environment())
            .asset_connection(Arc::new(conn))
            .build()
            .unwrap();
        service.start().unwrap();
        assert!(service.is_running());
        service.stop().unwrap();
    }
}
