//! Domain events for the digital twin runtime.
//!
//! # Event Flow
//!
//! ```text
//! Request ──► Handler ──► Persistence (mutation)
//!                │
//!                ▼
//!           MessageBus.publish(EventMessage)
//!                │
//!       ┌────────┼────────┐
//!       ▼        ▼        ▼
//!   subscriber subscriber subscriber   (own queue + worker each)
//! ```
//!
//! Structural events (create/update/delete) are part of the request's
//! contract: if they cannot be published the request fails. Value and
//! operation events are published after the primary side effect and are
//! best-effort.
//!
//! # Usage
//!
//! ```
//! use twin_event::{EventKind, EventMessage};
//! use twin_model::{DataValue, ElementValue};
//! use twin_types::{Identifier, Reference};
//!
//! let motor = Reference::submodel(&Identifier::new("urn:sm:motor")).child("Speed");
//! let event = EventMessage::value_change(
//!     motor.clone(),
//!     ElementValue::Property(Some(DataValue::Integer(0))),
//!     ElementValue::Property(Some(DataValue::Integer(1200))),
//! );
//!
//! assert_eq!(event.kind(), EventKind::ValueChange);
//! assert_eq!(event.reference(), &motor);
//! ```

mod kind;
mod message;

pub use kind::EventKind;
pub use message::{
    ElementCreateEvent, ElementDeleteEvent, ElementUpdateEvent, EventMessage, OperationFinishEvent,
    OperationInvokeEvent, Referable, ValueChangeEvent,
};
