//! The model tree.
//!
//! ```text
//! Environment
//! ├── AssetAdministrationShell*   (id, asset_information, submodel refs)
//! └── Submodel*                   (id)
//!     └── SubmodelElement*        (id_short)
//!         ├── Property
//!         ├── Blob
//!         ├── Operation
//!         └── SubmodelElementCollection
//!             └── SubmodelElement*
//! ```
//!
//! Shells and submodels are addressed by [`Identifier`], elements by an
//! [`IdShortPath`] below their submodel.

use crate::operation::OperationVariable;
use crate::value::{DataValue, ElementValue, ValueParseError, ValueType};
use serde::{Deserialize, Serialize};
use twin_types::{IdShortPath, Identifier, KeyType, Reference};

/// Root of the model tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Environment {
    pub asset_administration_shells: Vec<AssetAdministrationShell>,
    pub submodels: Vec<Submodel>,
}

impl Environment {
    #[must_use]
    pub fn shell(&self, id: &Identifier) -> Option<&AssetAdministrationShell> {
        self.asset_administration_shells.iter().find(|s| &s.id == id)
    }

    pub fn shell_mut(&mut self, id: &Identifier) -> Option<&mut AssetAdministrationShell> {
        self.asset_administration_shells.iter_mut().find(|s| &s.id == id)
    }

    #[must_use]
    pub fn submodel(&self, id: &Identifier) -> Option<&Submodel> {
        self.submodels.iter().find(|s| &s.id == id)
    }

    pub fn submodel_mut(&mut self, id: &Identifier) -> Option<&mut Submodel> {
        self.submodels.iter_mut().find(|s| &s.id == id)
    }

    /// Resolves an element reference (`Submodel` key followed by
    /// `SubmodelElement` keys).
    #[must_use]
    pub fn element(&self, reference: &Reference) -> Option<&SubmodelElement> {
        let submodel = self.submodel(&reference.submodel_id()?)?;
        submodel.element(&reference.id_short_path()?)
    }

    pub fn element_mut(&mut self, reference: &Reference) -> Option<&mut SubmodelElement> {
        let path = reference.id_short_path()?;
        let submodel = self.submodel_mut(&reference.submodel_id()?)?;
        submodel.element_mut(&path)
    }
}

/// Kind of asset a shell represents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetKind {
    Type,
    #[default]
    Instance,
    NotApplicable,
}

/// Asset-related metadata of a shell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetInformation {
    pub asset_kind: AssetKind,
    pub global_asset_id: Option<String>,
    pub asset_type: Option<String>,
}

/// Digital representation of one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetAdministrationShell {
    pub id: Identifier,
    pub id_short: String,
    #[serde(default)]
    pub asset_information: AssetInformation,
    /// References to the submodels attached to this shell.
    #[serde(default)]
    pub submodels: Vec<Reference>,
}

impl AssetAdministrationShell {
    #[must_use]
    pub fn new(id: impl Into<Identifier>, id_short: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            id_short: id_short.into(),
            asset_information: AssetInformation::default(),
            submodels: Vec::new(),
        }
    }

    #[must_use]
    pub fn reference(&self) -> Reference {
        Reference::shell(&self.id)
    }
}

/// A named aspect of an asset holding a tree of elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submodel {
    pub id: Identifier,
    pub id_short: String,
    #[serde(default)]
    pub semantic_id: Option<String>,
    #[serde(default)]
    pub submodel_elements: Vec<SubmodelElement>,
}

impl Submodel {
    #[must_use]
    pub fn new(id: impl Into<Identifier>, id_short: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            id_short: id_short.into(),
            semantic_id: None,
            submodel_elements: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_elements(mut self, elements: Vec<SubmodelElement>) -> Self {
        self.submodel_elements = elements;
        self
    }

    #[must_use]
    pub fn reference(&self) -> Reference {
        Reference::submodel(&self.id)
    }

    #[must_use]
    pub fn element(&self, path: &IdShortPath) -> Option<&SubmodelElement> {
        let (first, rest) = path.segments().split_first()?;
        let mut current = find(&self.submodel_elements, first)?;
        for segment in rest {
            current = find(current.children()?, segment)?;
        }
        Some(current)
    }

    pub fn element_mut(&mut self, path: &IdShortPath) -> Option<&mut SubmodelElement> {
        let (first, rest) = path.segments().split_first()?;
        let mut current = find_mut(&mut self.submodel_elements, first)?;
        for segment in rest {
            current = find_mut(current.children_mut()?, segment)?;
        }
        Some(current)
    }

    /// Children of `parent`, or the top-level elements for `None`.
    /// Returns `None` if `parent` does not exist or cannot hold children.
    pub fn children_mut(&mut self, parent: Option<&IdShortPath>) -> Option<&mut Vec<SubmodelElement>> {
        match parent {
            None => Some(&mut self.submodel_elements),
            Some(path) => self.element_mut(path)?.children_mut(),
        }
    }
}

fn find<'a>(elements: &'a [SubmodelElement], id_short: &str) -> Option<&'a SubmodelElement> {
    elements.iter().find(|e| e.id_short() == id_short)
}

fn find_mut<'a>(elements: &'a mut [SubmodelElement], id_short: &str) -> Option<&'a mut SubmodelElement> {
    elements.iter_mut().find(|e| e.id_short() == id_short)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id_short: String,
    pub value_type: ValueType,
    #[serde(default)]
    pub value: Option<DataValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub id_short: String,
    pub content_type: String,
    /// Base64 content; stripped when queried without blob values.
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmodelElementCollection {
    pub id_short: String,
    #[serde(default)]
    pub value: Vec<SubmodelElement>,
}

impl SubmodelElementCollection {
    #[must_use]
    pub fn child(&self, id_short: &str) -> Option<&SubmodelElement> {
        find(&self.value, id_short)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id_short: String,
    #[serde(default)]
    pub input_variables: Vec<OperationVariable>,
    #[serde(default)]
    pub output_variables: Vec<OperationVariable>,
    #[serde(default)]
    pub inoutput_variables: Vec<OperationVariable>,
}

/// A node of a submodel's element tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modelType")]
pub enum SubmodelElement {
    Property(Property),
    Blob(Blob),
    #[serde(rename = "SubmodelElementCollection")]
    Collection(SubmodelElementCollection),
    Operation(Operation),
}

impl SubmodelElement {
    #[must_use]
    pub fn property(id_short: impl Into<String>, value_type: ValueType, value: Option<DataValue>) -> Self {
        Self::Property(Property {
            id_short: id_short.into(),
            value_type,
            value,
        })
    }

    #[must_use]
    pub fn blob(id_short: impl Into<String>, content_type: impl Into<String>, value: Option<String>) -> Self {
        Self::Blob(Blob {
            id_short: id_short.into(),
            content_type: content_type.into(),
            value,
        })
    }

    #[must_use]
    pub fn collection(id_short: impl Into<String>, value: Vec<SubmodelElement>) -> Self {
        Self::Collection(SubmodelElementCollection {
            id_short: id_short.into(),
            value,
        })
    }

    #[must_use]
    pub fn operation(
        id_short: impl Into<String>,
        input_variables: Vec<OperationVariable>,
        output_variables: Vec<OperationVariable>,
        inoutput_variables: Vec<OperationVariable>,
    ) -> Self {
        Self::Operation(Operation {
            id_short: id_short.into(),
            input_variables,
            output_variables,
            inoutput_variables,
        })
    }

    #[must_use]
    pub fn id_short(&self) -> &str {
        match self {
            Self::Property(p) => &p.id_short,
            Self::Blob(b) => &b.id_short,
            Self::Collection(c) => &c.id_short,
            Self::Operation(o) => &o.id_short,
        }
    }

    /// Short type name, used in diagnostics.
    #[must_use]
    pub fn model_type(&self) -> &'static str {
        match self {
            Self::Property(_) => "Property",
            Self::Blob(_) => "Blob",
            Self::Collection(_) => "SubmodelElementCollection",
            Self::Operation(_) => "Operation",
        }
    }

    #[must_use]
    pub fn children(&self) -> Option<&[SubmodelElement]> {
        match self {
            Self::Collection(c) => Some(&c.value),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<SubmodelElement>> {
        match self {
            Self::Collection(c) => Some(&mut c.value),
            _ => None,
        }
    }

    /// Value-only view of this element.
    #[must_use]
    pub fn value(&self) -> ElementValue {
        match self {
            Self::Property(p) => ElementValue::Property(p.value.clone()),
            Self::Blob(b) => ElementValue::Blob {
                content_type: b.content_type.clone(),
                value: b.value.clone(),
            },
            Self::Collection(c) => ElementValue::Collection(
                c.value
                    .iter()
                    .map(|e| (e.id_short().to_string(), e.value()))
                    .collect(),
            ),
            Self::Operation(_) => ElementValue::Operation,
        }
    }

    /// Replaces the value of this element.
    ///
    /// The shape of `value` must match the element; a property value must
    /// have the declared [`ValueType`]. On error the element is unchanged.
    ///
    /// # Errors
    ///
    /// [`ValueParseError::ShapeMismatch`], [`ValueParseError::InvalidLiteral`],
    /// [`ValueParseError::UnknownChild`] or [`ValueParseError::NotSettable`].
    pub fn set_value(&mut self, value: ElementValue) -> Result<(), ValueParseError> {
        self.check_value(&value)?;
        self.assign(value);
        Ok(())
    }

    fn check_value(&self, value: &ElementValue) -> Result<(), ValueParseError> {
        let mismatch = |expected: &'static str| ValueParseError::ShapeMismatch {
            id_short: self.id_short().to_string(),
            expected,
        };
        match (self, value) {
            (Self::Property(p), ElementValue::Property(v)) => match v {
                Some(d) if d.value_type() != p.value_type => Err(ValueParseError::InvalidLiteral {
                    raw: d.to_string(),
                    value_type: p.value_type,
                }),
                _ => Ok(()),
            },
            (Self::Blob(_), ElementValue::Blob { .. }) => Ok(()),
            (Self::Collection(c), ElementValue::Collection(values)) => {
                for (id_short, v) in values {
                    let child = c.child(id_short).ok_or_else(|| ValueParseError::UnknownChild {
                        id_short: id_short.clone(),
                    })?;
                    child.check_value(v)?;
                }
                Ok(())
            }
            (Self::Operation(o), _) => Err(ValueParseError::NotSettable {
                id_short: o.id_short.clone(),
            }),
            (Self::Property(_), _) => Err(mismatch("property")),
            (Self::Blob(_), _) => Err(mismatch("blob")),
            (Self::Collection(_), _) => Err(mismatch("collection")),
        }
    }

    fn assign(&mut self, value: ElementValue) {
        match (self, value) {
            (Self::Property(p), ElementValue::Property(v)) => p.value = v,
            (Self::Blob(b), ElementValue::Blob { content_type, value }) => {
                b.content_type = content_type;
                b.value = value;
            }
            (Self::Collection(c), ElementValue::Collection(values)) => {
                for (id_short, v) in values {
                    if let Some(child) = find_mut(&mut c.value, &id_short) {
                        child.assign(v);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Returns `true` if `reference` addresses a submodel element.
#[must_use]
pub fn is_element_reference(reference: &Reference) -> bool {
    matches!(reference.last(), Some(k) if k.key_type == KeyType::SubmodelElement)
        && reference.id_short_path().is_some()
}
