//! Core types for the digital twin runtime.
//!
//! This crate provides the identifier, addressing and status types shared
//! by every layer of the workspace.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Model Layer                               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  twin-types   : IDs, Reference, StatusCode, ErrorCode ◄ HERE │
//! │  twin-model   : Environment, Submodel, ElementValue          │
//! │  twin-event   : EventMessage                                 │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Runtime Layer                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  twin-runtime : persistence, asset connections, message bus, │
//! │                 handlers, dispatcher, Service                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Identifier Design
//!
//! Runtime identifiers ([`RequestId`], [`HandleId`], [`SubscriptionId`])
//! are random UUID v4 values. Model identifiers ([`Identifier`]) are
//! assigned by whoever authors the model.
//!
//! # Example
//!
//! ```
//! use twin_types::{HandleId, Identifier, Reference, RequestId, StatusCode};
//!
//! let request = RequestId::new();
//! let handle = HandleId::new();
//! assert_ne!(request.uuid(), handle.uuid());
//!
//! let sm = Reference::submodel(&Identifier::new("urn:sm:1"));
//! assert_eq!(sm.to_string(), "[Submodel]urn:sm:1");
//!
//! assert!(StatusCode::ClientErrorResourceNotFound.is_client_error());
//! ```

mod error;
mod id;
mod reference;
mod status;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use id::{HandleId, Identifier, RequestId, SubscriptionId};
pub use reference::{IdShortPath, IdShortPathError, Key, KeyType, Reference};
pub use status::{StatusClass, StatusCode};
