//! Asset connection contract.
//!
//! An [`AssetConnection`] links parts of the model to a live external
//! system. It declares [`Binding`]s, each pairing a [`Reference`] with one
//! provider:
//!
//! | Capability | Provider | Used by |
//! |------------|----------|---------|
//! | `Value` | [`AssetValueProvider`] | value reads (read-through) and writes (write-through) |
//! | `Operation` | [`AssetOperationProvider`] | operation invocation |
//! | `Subscription` | [`AssetSubscriptionProvider`] | asset-pushed value changes |
//!
//! The [`AssetConnectionManager`] merges all bindings into one routing
//! table. A `(Reference, Capability)` pair resolves to at most one
//! provider.
//!
//! # Threading
//!
//! Providers are shared across request threads (`Send + Sync`). Operation
//! completions and subscription pushes arrive on threads the provider
//! owns.

mod error;
mod manager;

pub use error::AssetConnectionError;
pub use manager::AssetConnectionManager;

use crate::operation::OperationOutput;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::mpsc;
use std::sync::Arc;
use twin_model::{ElementValue, OperationVariable};
use twin_types::Reference;

/// What a binding lets the runtime do with a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    Value,
    Operation,
    Subscription,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Value => "value",
            Self::Operation => "operation",
            Self::Subscription => "subscription",
        })
    }
}

/// Reads and writes the live value of one element.
pub trait AssetValueProvider: Send + Sync {
    /// Reads the current value from the asset.
    ///
    /// # Errors
    ///
    /// Returns [`AssetConnectionError`] if the asset cannot be read.
    fn read(&self) -> Result<ElementValue, AssetConnectionError>;

    /// Writes a value to the asset.
    ///
    /// # Errors
    ///
    /// Returns [`AssetConnectionError`] if the asset did not accept the value.
    fn write(&self, value: &ElementValue) -> Result<(), AssetConnectionError>;
}

/// Arguments of one invocation.
///
/// `output_variables` are the operation's declared outputs as stored in the
/// model. Providers use them as the template for the outputs they report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationCall {
    pub input: Vec<OperationVariable>,
    pub inoutput: Vec<OperationVariable>,
    pub output_variables: Vec<OperationVariable>,
}

/// Invoked exactly once with the outcome of an asynchronous invocation.
pub type CompletionCallback = Box<dyn FnOnce(Result<OperationOutput, AssetConnectionError>) + Send>;

/// Executes one operation on the asset.
pub trait AssetOperationProvider: Send + Sync {
    /// Starts the operation and returns immediately.
    ///
    /// On `Ok`, `on_complete` is called later, typically from a thread the
    /// provider owns. On `Err` the invocation was rejected up front and
    /// `on_complete` is dropped without being called.
    ///
    /// # Errors
    ///
    /// Returns [`AssetConnectionError`] if the invocation could not be started.
    fn invoke_async(&self, call: OperationCall, on_complete: CompletionCallback) -> Result<(), AssetConnectionError>;

    /// Runs the operation and waits for its outcome.
    ///
    /// The default implementation blocks on [`invoke_async`](Self::invoke_async).
    ///
    /// # Errors
    ///
    /// Returns [`AssetConnectionError`] if the invocation was rejected or failed.
    fn invoke(&self, call: &OperationCall) -> Result<OperationOutput, AssetConnectionError> {
        let (tx, rx) = mpsc::channel();
        self.invoke_async(
            call.clone(),
            Box::new(move |outcome| {
                let _ = tx.send(outcome);
            }),
        )?;
        rx.recv()
            .map_err(|_| AssetConnectionError::Failed("completion callback dropped".into()))?
    }
}

/// Receives values pushed by the asset.
pub type ValueListener = Arc<dyn Fn(ElementValue) + Send + Sync>;

/// Pushes value changes of one element from the asset.
pub trait AssetSubscriptionProvider: Send + Sync {
    /// Starts delivering values to `listener`.
    ///
    /// # Errors
    ///
    /// Returns [`AssetConnectionError`] if the asset refused the subscription.
    fn subscribe(&self, listener: ValueListener) -> Result<(), AssetConnectionError>;

    /// Stops delivering values.
    ///
    /// # Errors
    ///
    /// Returns [`AssetConnectionError`] if the asset could not be reached.
    fn unsubscribe(&self) -> Result<(), AssetConnectionError>;
}

/// A provider of one capability.
#[derive(Clone)]
pub enum Provider {
    Value(Arc<dyn AssetValueProvider>),
    Operation(Arc<dyn AssetOperationProvider>),
    Subscription(Arc<dyn AssetSubscriptionProvider>),
}

impl Provider {
    #[must_use]
    pub fn capability(&self) -> Capability {
        match self {
            Self::Value(_) => Capability::Value,
            Self::Operation(_) => Capability::Operation,
            Self::Subscription(_) => Capability::Subscription,
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Provider::{:?}", self.capability())
    }
}

/// One reference bound to one provider.
#[derive(Debug, Clone)]
pub struct Binding {
    pub reference: Reference,
    pub provider: Provider,
}

impl Binding {
    #[must_use]
    pub fn value(reference: Reference, provider: Arc<dyn AssetValueProvider>) -> Self {
        Self {
            reference,
            provider: Provider::Value(provider),
        }
    }

    #[must_use]
    pub fn operation(reference: Reference, provider: Arc<dyn AssetOperationProvider>) -> Self {
        Self {
            reference,
            provider: Provider::Operation(provider),
        }
    }

    #[must_use]
    pub fn subscription(reference: Reference, provider: Arc<dyn AssetSubscriptionProvider>) -> Self {
        Self {
            reference,
            provider: Provider::Subscription(provider),
        }
    }
}

/// A configured link to one external system.
pub trait AssetConnection: Send + Sync {
    /// Name used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Bindings this connection provides.
    fn bindings(&self) -> Vec<Binding>;

    /// Releases the connection. Called once on service stop.
    ///
    /// # Errors
    ///
    /// Returns [`AssetConnectionError`] if cleanup failed.
    fn close(&self) -> Result<(), AssetConnectionError> {
        Ok(())
    }
}
