//! Event messages.
//!
//! Every state change the runtime performs is broadcast as one
//! [`EventMessage`]. Messages are plain values: once published they are
//! cloned to each subscriber and never mutated.

use crate::kind::EventKind;
use serde::{Deserialize, Serialize};
use twin_model::{AssetAdministrationShell, AssetInformation, ElementValue, Submodel, SubmodelElement};
use twin_types::Reference;

/// Snapshot of the model element a structural event is about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Referable {
    Shell(AssetAdministrationShell),
    AssetInformation(AssetInformation),
    Submodel(Submodel),
    Element(SubmodelElement),
}

/// An element was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementCreateEvent {
    pub element: Reference,
    pub value: Referable,
}

/// An element was replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementUpdateEvent {
    pub element: Reference,
    pub value: Referable,
}

/// An element was removed. `value` is the element as it was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDeleteEvent {
    pub element: Reference,
    pub value: Referable,
}

/// The value of an element changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueChangeEvent {
    pub element: Reference,
    pub old_value: ElementValue,
    pub new_value: ElementValue,
}

/// An operation was invoked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationInvokeEvent {
    pub element: Reference,
    pub input: Vec<(String, ElementValue)>,
    pub inoutput: Vec<(String, ElementValue)>,
}

/// An operation reached a terminal state.
///
/// A failed invocation finishes with empty `output` and the in-out
/// arguments as they were passed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationFinishEvent {
    pub element: Reference,
    pub output: Vec<(String, ElementValue)>,
    pub inoutput: Vec<(String, ElementValue)>,
}

/// A domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventMessage {
    ElementCreate(ElementCreateEvent),
    ElementUpdate(ElementUpdateEvent),
    ElementDelete(ElementDeleteEvent),
    ValueChange(ValueChangeEvent),
    OperationInvoke(OperationInvokeEvent),
    OperationFinish(OperationFinishEvent),
}

impl EventMessage {
    #[must_use]
    pub fn element_create(element: Reference, value: Referable) -> Self {
        Self::ElementCreate(ElementCreateEvent { element, value })
    }

    #[must_use]
    pub fn element_update(element: Reference, value: Referable) -> Self {
        Self::ElementUpdate(ElementUpdateEvent { element, value })
    }

    #[must_use]
    pub fn element_delete(element: Reference, value: Referable) -> Self {
        Self::ElementDelete(ElementDeleteEvent { element, value })
    }

    #[must_use]
    pub fn value_change(element: Reference, old_value: ElementValue, new_value: ElementValue) -> Self {
        Self::ValueChange(ValueChangeEvent {
            element,
            old_value,
            new_value,
        })
    }

    #[must_use]
    pub fn operation_invoke(
        element: Reference,
        input: Vec<(String, ElementValue)>,
        inoutput: Vec<(String, ElementValue)>,
    ) -> Self {
        Self::OperationInvoke(OperationInvokeEvent {
            element,
            input,
            inoutput,
        })
    }

    #[must_use]
    pub fn operation_finish(
        element: Reference,
        output: Vec<(String, ElementValue)>,
        inoutput: Vec<(String, ElementValue)>,
    ) -> Self {
        Self::OperationFinish(OperationFinishEvent {
            element,
            output,
            inoutput,
        })
    }

    /// Returns the fieldless kind, for filtering.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ElementCreate(_) => EventKind::ElementCreate,
            Self::ElementUpdate(_) => EventKind::ElementUpdate,
            Self::ElementDelete(_) => EventKind::ElementDelete,
            Self::ValueChange(_) => EventKind::ValueChange,
            Self::OperationInvoke(_) => EventKind::OperationInvoke,
            Self::OperationFinish(_) => EventKind::OperationFinish,
        }
    }

    /// Returns the reference of the affected element.
    #[must_use]
    pub fn reference(&self) -> &Reference {
        match self {
            Self::ElementCreate(e) => &e.element,
            Self::ElementUpdate(e) => &e.element,
            Self::ElementDelete(e) => &e.element,
            Self::ValueChange(e) => &e.element,
            Self::OperationInvoke(e) => &e.element,
            Self::OperationFinish(e) => &e.element,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twin_model::{DataValue, ValueType};
    use twin_types::{IdShortPath, Identifier};

    fn temp_ref() -> Reference {
        Reference::element(
            &Identifier::new("urn:sm:motor"),
            &IdShortPath::parse("Motor1/Temperature").unwrap(),
        )
    }

    #[test]
    fn kind_and_reference() {
        let ev = EventMessage::value_change(
            temp_ref(),
            ElementValue::Property(Some(DataValue::Double(40.0))),
            ElementValue::Property(Some(DataValue::Double(42.5))),
        );
        assert_eq!(ev.kind(), EventKind::ValueChange);
        assert_eq!(ev.reference(), &temp_ref());
    }

    #[test]
    fn every_constructor_maps_to_its_kind() {
        let el = Referable::Element(SubmodelElement::property("Temperature", ValueType::Double, None));
        let events = [
            EventMessage::element_create(temp_ref(), el.clone()),
            EventMessage::element_update(temp_ref(), el.clone()),
            EventMessage::element_delete(temp_ref(), el),
            EventMessage::value_change(temp_ref(), ElementValue::Property(None), ElementValue::Property(None)),
            EventMessage::operation_invoke(temp_ref(), vec![], vec![]),
            EventMessage::operation_finish(temp_ref(), vec![], vec![]),
        ];
        let kinds: Vec<_> = events.iter().map(EventMessage::kind).collect();
        assert_eq!(kinds, EventKind::ALL);
    }

    #[test]
    fn serde_roundtrip_keeps_payload() {
        let ev = EventMessage::operation_finish(
            temp_ref(),
            vec![("result".into(), ElementValue::Property(Some(DataValue::Integer(1))))],
            vec![],
        );
        let json = serde_json::to_string(&ev).unwrap();
        let back: EventMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ev);
    }
}
