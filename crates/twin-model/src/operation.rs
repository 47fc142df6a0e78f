//! Operation arguments.

use crate::model::SubmodelElement;
use crate::value::ElementValue;
use serde::{Deserialize, Serialize};

/// One input, output or in-out argument of an operation.
///
/// The wrapped element carries both the argument's name (its id_short)
/// and its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationVariable {
    pub value: SubmodelElement,
}

impl OperationVariable {
    #[must_use]
    pub fn new(value: SubmodelElement) -> Self {
        Self { value }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.value.id_short()
    }

    /// Named value of this argument, as carried by operation events.
    #[must_use]
    pub fn to_value(&self) -> (String, ElementValue) {
        (self.name().to_string(), self.value.value())
    }
}

/// Converts argument lists into the named values events carry.
#[must_use]
pub fn argument_values(variables: &[OperationVariable]) -> Vec<(String, ElementValue)> {
    variables.iter().map(OperationVariable::to_value).collect()
}
