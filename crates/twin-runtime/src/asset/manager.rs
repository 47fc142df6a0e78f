//! Routing table from references to asset providers.

use super::{
    AssetConnection, AssetConnectionError, AssetOperationProvider, AssetSubscriptionProvider,
    AssetValueProvider, Capability, Provider,
};
use crate::config::ConfigError;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use twin_types::{ErrorCode, Reference};

struct Route {
    connection: String,
    provider: Provider,
}

/// Merges the bindings of all configured connections.
///
/// Pure routing: the manager answers "who serves this reference for this
/// capability" and nothing else.
///
/// # Example
///
/// ```
/// use twin_runtime::asset::AssetConnectionManager;
/// use twin_types::{Identifier, Reference};
///
/// let manager = AssetConnectionManager::new(Vec::new()).unwrap();
/// let r = Reference::submodel(&Identifier::new("urn:sm")).child("Speed");
/// assert!(!manager.has_value_provider(&r));
/// assert!(manager.get_value_provider(&r).is_err());
/// ```
pub struct AssetConnectionManager {
    connections: Vec<Arc<dyn AssetConnection>>,
    routes: HashMap<(Reference, Capability), Route>,
}

impl AssetConnectionManager {
    /// Builds the routing table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateBinding`] if two bindings (in the
    /// same or different connections) share a reference and capability.
    pub fn new(connections: Vec<Arc<dyn AssetConnection>>) -> Result<Self, ConfigError> {
        let mut routes: HashMap<(Reference, Capability), Route> = HashMap::new();
        for connection in &connections {
            for binding in connection.bindings() {
                let key = (binding.reference, binding.provider.capability());
                if let Some(existing) = routes.get(&key) {
                    let err = ConfigError::DuplicateBinding {
                        reference: key.0,
                        capability: key.1,
                        first: existing.connection.clone(),
                        second: connection.name().to_string(),
                    };
                    warn!(code = err.code(), "{err}");
                    return Err(err);
                }
                routes.insert(
                    key,
                    Route {
                        connection: connection.name().to_string(),
                        provider: binding.provider,
                    },
                );
            }
            info!(connection = connection.name(), "asset connection registered");
        }
        Ok(Self {
            connections,
            routes,
        })
    }

    /// A manager with no connections.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            connections: Vec::new(),
            routes: HashMap::new(),
        }
    }

    fn route(&self, reference: &Reference, capability: Capability) -> Result<&Provider, AssetConnectionError> {
        self.routes
            .get(&(reference.clone(), capability))
            .map(|r| &r.provider)
            .ok_or_else(|| AssetConnectionError::NotBound {
                reference: reference.clone(),
                capability,
            })
    }

    #[must_use]
    pub fn has_value_provider(&self, reference: &Reference) -> bool {
        self.routes.contains_key(&(reference.clone(), Capability::Value))
    }

    #[must_use]
    pub fn has_operation_provider(&self, reference: &Reference) -> bool {
        self.routes.contains_key(&(reference.clone(), Capability::Operation))
    }

    #[must_use]
    pub fn has_subscription_provider(&self, reference: &Reference) -> bool {
        self.routes.contains_key(&(reference.clone(), Capability::Subscription))
    }

    /// # Errors
    ///
    /// [`AssetConnectionError::NotBound`] if no value provider is bound.
    pub fn get_value_provider(&self, reference: &Reference) -> Result<Arc<dyn AssetValueProvider>, AssetConnectionError> {
        match self.route(reference, Capability::Value)? {
            Provider::Value(p) => Ok(Arc::clone(p)),
            _ => Err(not_bound(reference, Capability::Value)),
        }
    }

    /// # Errors
    ///
    /// [`AssetConnectionError::NotBound`] if no operation provider is bound.
    pub fn get_operation_provider(
        &self,
        reference: &Reference,
    ) -> Result<Arc<dyn AssetOperationProvider>, AssetConnectionError> {
        match self.route(reference, Capability::Operation)? {
            Provider::Operation(p) => Ok(Arc::clone(p)),
            _ => Err(not_bound(reference, Capability::Operation)),
        }
    }

    /// # Errors
    ///
    /// [`AssetConnectionError::NotBound`] if no subscription provider is bound.
    pub fn get_subscription_provider(
        &self,
        reference: &Reference,
    ) -> Result<Arc<dyn AssetSubscriptionProvider>, AssetConnectionError> {
        match self.route(reference, Capability::Subscription)? {
            Provider::Subscription(p) => Ok(Arc::clone(p)),
            _ => Err(not_bound(reference, Capability::Subscription)),
        }
    }

    /// All subscription bindings, for wiring at service start.
    #[must_use]
    pub fn subscription_providers(&self) -> Vec<(Reference, Arc<dyn AssetSubscriptionProvider>)> {
        self.routes
            .iter()
            .filter_map(|((reference, _), route)| match &route.provider {
                Provider::Subscription(p) => Some((reference.clone(), Arc::clone(p))),
                _ => None,
            })
            .collect()
    }

    /// Names of the configured connections, in configuration order.
    #[must_use]
    pub fn connections(&self) -> Vec<String> {
        self.connections.iter().map(|c| c.name().to_string()).collect()
    }

    /// Closes every connection. Failures are logged, not returned.
    pub fn close(&self) {
        for connection in &self.connections {
            if let Err(e) = connection.close() {
                warn!(connection = connection.name(), code = e.code(), error = %e, "failed to close asset connection");
            }
        }
    }
}

fn not_bound(reference: &Reference, capability: Capability) -> AssetConnectionError {
    AssetConnectionError::NotBound {
        reference: reference.clone(),
        capability,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Binding;
    use crate::testing::{FakeConnection, FakeSubscriptionProvider, FakeValueProvider, ThreadedOperationProvider};
    use twin_model::{DataValue, ElementValue};
    use twin_types::Identifier;

    fn speed() -> Reference {
        Reference::submodel(&Identifier::new("urn:sm:motor")).child("Speed")
    }

    fn value_provider() -> Arc<FakeValueProvider> {
        Arc::new(FakeValueProvider::new(ElementValue::Property(Some(DataValue::Integer(0)))))
    }

    #[test]
    fn routes_each_capability_independently() {
        let conn = FakeConnection::new(
            "plc",
            vec![
                Binding::value(speed(), value_provider()),
                Binding::operation(speed(), Arc::new(ThreadedOperationProvider::echo())),
            ],
        );
        let manager = AssetConnectionManager::new(vec![Arc::new(conn)]).unwrap();

        assert!(manager.has_value_provider(&speed()));
        assert!(manager.has_operation_provider(&speed()));
        assert!(!manager.has_subscription_provider(&speed()));
        assert!(manager.get_value_provider(&speed()).is_ok());
        assert!(matches!(
            manager.get_subscription_provider(&speed()),
            Err(AssetConnectionError::NotBound {
                capability: Capability::Subscription,
                ..
            })
        ));
        assert_eq!(manager.connections(), vec!["plc".to_string()]);
    }

    #[test]
    fn duplicate_binding_across_connections_is_rejected() {
        let a = FakeConnection::new("a", vec![Binding::value(speed(), value_provider())]);
        let b = FakeConnection::new("b", vec![Binding::value(speed(), value_provider())]);
        let err = AssetConnectionManager::new(vec![Arc::new(a), Arc::new(b)]).err().unwrap();
        match err {
            ConfigError::DuplicateBinding {
                capability,
                first,
                second,
                ..
            } => {
                assert_eq!(capability, Capability::Value);
                assert_eq!(first, "a");
                assert_eq!(second, "b");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_binding_within_connection_is_rejected() {
        let conn = FakeConnection::new(
            "a",
            vec![
                Binding::value(speed(), value_provider()),
                Binding::value(speed(), value_provider()),
            ],
        );
        assert!(AssetConnectionManager::new(vec![Arc::new(conn)]).is_err());
    }

    #[test]
    fn lists_subscription_providers() {
        let conn = FakeConnection::new(
            "a",
            vec![
                Binding::subscription(speed(), Arc::new(FakeSubscriptionProvider::new())),
                Binding::value(speed(), value_provider()),
            ],
        );
        let manager = AssetConnectionManager::new(vec![Arc::new(conn)]).unwrap();
        let subs = manager.subscription_providers();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].0, speed());
    }

    #[test]
    fn close_reaches_every_connection() {
        let a = Arc::new(FakeConnection::new("a", vec![]));
        let b = Arc::new(FakeConnection::new("b", vec![]).failing_close());
        let manager = AssetConnectionManager::new(vec![a.clone(), b.clone()]).unwrap();
        manager.close();
        assert!(a.is_closed());
        assert!(b.is_closed());
    }
}
