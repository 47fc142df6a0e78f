//! Query modifiers applied when reading from persistence.

use crate::model::{Submodel, SubmodelElement};
use serde::{Deserialize, Serialize};

/// Whether blob contents are included in query results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Extent {
    WithBlobValue,
    #[default]
    WithoutBlobValue,
}

/// How deep element trees are returned.
///
/// `Core` returns the addressed element and its direct children; nested
/// collections below that come back empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Core,
    #[default]
    Deep,
}

/// Shape of a query result.
///
/// The default is `Deep` without blob values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryModifier {
    pub extent: Extent,
    pub level: Level,
}

impl QueryModifier {
    /// Everything: deep, blob contents included.
    pub const MAXIMAL: Self = Self {
        extent: Extent::WithBlobValue,
        level: Level::Deep,
    };

    #[must_use]
    pub fn new(extent: Extent, level: Level) -> Self {
        Self { extent, level }
    }

    /// Returns a copy of `element` shaped by this modifier.
    #[must_use]
    pub fn apply_element(&self, element: &SubmodelElement) -> SubmodelElement {
        let depth = match self.level {
            Level::Core => Some(1),
            Level::Deep => None,
        };
        self.shape(element, depth)
    }

    /// Returns a copy of `submodel` shaped by this modifier.
    #[must_use]
    pub fn apply_submodel(&self, submodel: &Submodel) -> Submodel {
        let mut out = submodel.clone();
        out.submodel_elements = submodel
            .submodel_elements
            .iter()
            .map(|e| self.apply_element(e))
            .collect();
        out
    }

    fn shape(&self, element: &SubmodelElement, depth: Option<usize>) -> SubmodelElement {
        match element {
            SubmodelElement::Blob(b) if self.extent == Extent::WithoutBlobValue => {
                let mut b = b.clone();
                b.value = None;
                SubmodelElement::Blob(b)
            }
            SubmodelElement::Collection(c) => {
                let mut c = c.clone();
                c.value = match depth {
                    Some(0) => Vec::new(),
                    _ => c
                        .value
                        .iter()
                        .map(|child| self.shape(child, depth.map(|d| d - 1)))
                        .collect(),
                };
                SubmodelElement::Collection(c)
            }
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{DataValue, ValueType};

    fn nested() -> SubmodelElement {
        SubmodelElement::collection(
            "Outer",
            vec![
                SubmodelElement::blob("Doc", "text/plain", Some("aGk=".into())),
                SubmodelElement::collection(
                    "Inner",
                    vec![SubmodelElement::property("P", ValueType::Integer, Some(DataValue::Integer(1)))],
                ),
            ],
        )
    }

    #[test]
    fn default_strips_blob_values_everywhere() {
        let shaped = QueryModifier::default().apply_element(&nested());
        let children = shaped.children().unwrap();
        match &children[0] {
            SubmodelElement::Blob(b) => assert!(b.value.is_none()),
            other => panic!("expected blob, got {other:?}"),
        }
        assert_eq!(children[1].children().unwrap().len(), 1);
    }

    #[test]
    fn maximal_keeps_everything() {
        assert_eq!(QueryModifier::MAXIMAL.apply_element(&nested()), nested());
    }

    #[test]
    fn core_level_empties_grandchildren() {
        let core = QueryModifier::new(Extent::WithBlobValue, Level::Core);
        let shaped = core.apply_element(&nested());
        let children = shaped.children().unwrap();
        assert_eq!(children.len(), 2);
        assert!(children[1].children().unwrap().is_empty());
    }

    #[test]
    fn submodel_applies_per_top_level_element() {
        let sm = Submodel::new("urn:sm", "Sm").with_elements(vec![nested()]);
        let core = QueryModifier::new(Extent::WithoutBlobValue, Level::Core);
        let shaped = core.apply_submodel(&sm);
        let outer = &shaped.submodel_elements[0];
        assert_eq!(outer.children().unwrap().len(), 2);
        assert!(outer.children().unwrap()[1].children().unwrap().is_empty());
        assert_eq!(shaped.id, sm.id);
    }
}
