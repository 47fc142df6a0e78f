//! Model tree and typed element values for the digital twin runtime.
//!
//! # Overview
//!
//! - [`Environment`] is the root: shells plus submodels
//! - [`SubmodelElement`] is a node of a submodel's element tree
//! - [`ElementValue`] is the value-only view of an element
//! - [`QueryModifier`] shapes read results
//!
//! # Example
//!
//! ```
//! use twin_model::{DataValue, ElementValue, Environment, Submodel, SubmodelElement, ValueType};
//! use twin_types::{IdShortPath, Identifier, Reference};
//!
//! let mut env = Environment::default();
//! env.submodels.push(
//!     Submodel::new("urn:sm:motor", "Motor").with_elements(vec![SubmodelElement::collection(
//!         "Motor1",
//!         vec![SubmodelElement::property(
//!             "Temperature",
//!             ValueType::Double,
//!             Some(DataValue::Double(40.0)),
//!         )],
//!     )]),
//! );
//!
//! let temp = Reference::element(
//!     &Identifier::new("urn:sm:motor"),
//!     &IdShortPath::parse("Motor1/Temperature").unwrap(),
//! );
//! let element = env.element_mut(&temp).unwrap();
//! let value = ElementValue::parse("42.5", element).unwrap();
//! element.set_value(value).unwrap();
//! assert_eq!(element.value().as_data(), Some(&DataValue::Double(42.5)));
//! ```

mod model;
mod modifier;
mod operation;
mod value;

pub use model::{
    is_element_reference, AssetAdministrationShell, AssetInformation, AssetKind, Blob, Environment,
    Operation, Property, Submodel, SubmodelElement, SubmodelElementCollection,
};
pub use modifier::{Extent, Level, QueryModifier};
pub use operation::{argument_values, OperationVariable};
pub use value::{DataValue, ElementValue, ValueParseError, ValueType};
