//! Digital twin runtime.
//!
//! Serves requests against an in-memory model of asset administration
//! shells and submodels, keeps selected elements in sync with live assets
//! and announces every change on a message bus.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Model Layer                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  twin-types  : Identifier, Reference, IdShortPath, ErrorCode │
//! │  twin-model  : Environment, SubmodelElement, ElementValue    │
//! │  twin-event  : EventMessage, EventKind                       │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Runtime Layer (THIS CRATE)                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  service/     : Service, ServiceBuilder                      │
//! │  dispatcher/  : RequestDispatcher, worker pool               │
//! │  handler/     : one RequestHandler per RequestKind           │
//! │  persistence/ : Persistence, InMemoryPersistence             │
//! │  asset/       : AssetConnection, AssetConnectionManager      │
//! │  bus/         : MessageBus, InternalMessageBus               │
//! │  operation/   : OperationResult state machine                │
//! │  config/      : ServiceConfig (TOML + TWIN_* overrides)      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Request Flow
//!
//! ```text
//! Request ─► RequestDispatcher ─► handler ─┬─► AssetConnectionManager (write-through / read-through / invoke)
//!                                          ├─► Persistence
//!                                          └─► MessageBus (EventMessage)
//!        ◄──────────── Response ◄──────────┘
//! ```
//!
//! # Modules
//!
//! ## [`service`] - Entry Point
//!
//! - [`Service`]: owns every component and the start/stop lifecycle
//! - [`ServiceBuilder`]: injects persistence, bus and asset connections
//!
//! ## [`bus`] - Eventing
//!
//! - [`MessageBus`](bus::MessageBus): transport contract
//! - [`InternalMessageBus`](bus::InternalMessageBus): in-process, one worker per subscriber
//! - [`Subscription`](bus::Subscription): filter plus handler
//!
//! ## [`asset`] - Live Assets
//!
//! - [`AssetConnection`](asset::AssetConnection): a set of bindings
//! - [`AssetConnectionManager`](asset::AssetConnectionManager): routing table
//!
//! # Testing
//!
//! The `testing` feature exposes recording fakes for every extension
//! point in the [`testing`] module.

pub mod asset;
pub mod bus;
pub mod config;
pub mod dispatcher;
pub mod handler;
pub mod operation;
pub mod persistence;
pub mod request;
pub mod response;
pub mod service;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-exports for convenience
pub use asset::{
    AssetConnection, AssetConnectionError, AssetConnectionManager, AssetOperationProvider,
    AssetSubscriptionProvider, AssetValueProvider, Binding, Capability, CompletionCallback,
    OperationCall, Provider, ValueListener,
};
pub use bus::{EventFilter, EventHandler, InternalMessageBus, MessageBus, MessageBusError, Subscription};
pub use config::{ConfigError, CoreConfig, MessageBusConfig, ServiceConfig};
pub use dispatcher::{DispatchError, RequestDispatcher};
pub use handler::{HandlerContext, HandlerError, PublishPolicy, RequestHandler};
pub use operation::{ExecutionState, OperationError, OperationHandle, OperationOutput, OperationResult};
pub use persistence::{InMemoryPersistence, Persistence, PersistenceError};
pub use request::{Request, RequestKind};
pub use response::{Payload, Response};
pub use service::{Service, ServiceBuilder, ServiceError};
