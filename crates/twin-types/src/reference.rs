//! Model references.
//!
//! A [`Reference`] is an ordered, immutable list of typed [`Key`]s that
//! addresses a shell, a submodel or a (possibly nested) submodel element.
//! References compare and hash structurally, which makes them usable as
//! lookup keys for asset bindings and event filters.
//!
//! # Example
//!
//! ```
//! use twin_types::{IdShortPath, Identifier, Reference};
//!
//! let path = IdShortPath::parse("Motor1/Temperature").unwrap();
//! let temp = Reference::element(&Identifier::new("urn:sm:motor"), &path);
//!
//! assert_eq!(temp.keys().len(), 3);
//! assert_eq!(temp.id_short_path(), Some(path));
//!
//! let motor = temp.parent().unwrap();
//! assert!(motor.is_prefix_of(&temp));
//! ```

use crate::error::ErrorCode;
use crate::id::Identifier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of model element a [`Key`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyType {
    AssetAdministrationShell,
    Submodel,
    SubmodelElement,
}

impl KeyType {
    /// Returns `true` for keys whose value is a global [`Identifier`].
    #[must_use]
    pub fn is_identifiable(self) -> bool {
        matches!(self, Self::AssetAdministrationShell | Self::Submodel)
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::AssetAdministrationShell => "AssetAdministrationShell",
            Self::Submodel => "Submodel",
            Self::SubmodelElement => "SubmodelElement",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One typed step of a [`Reference`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    pub key_type: KeyType,
    pub value: String,
}

impl Key {
    #[must_use]
    pub fn new(key_type: KeyType, value: impl Into<String>) -> Self {
        Self {
            key_type,
            value: value.into(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]{}", self.key_type, self.value)
    }
}

/// Ordered sequence of keys addressing one model element.
///
/// Element references always start with a `Submodel` key followed by one
/// `SubmodelElement` key per nesting level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    keys: Vec<Key>,
}

impl Reference {
    /// Creates a reference from raw keys.
    #[must_use]
    pub fn new(keys: Vec<Key>) -> Self {
        Self { keys }
    }

    /// Reference to an asset administration shell.
    #[must_use]
    pub fn shell(id: &Identifier) -> Self {
        Self::new(vec![Key::new(KeyType::AssetAdministrationShell, id.as_str())])
    }

    /// Reference to a submodel.
    #[must_use]
    pub fn submodel(id: &Identifier) -> Self {
        Self::new(vec![Key::new(KeyType::Submodel, id.as_str())])
    }

    /// Reference to a submodel element addressed by its id_short path.
    #[must_use]
    pub fn element(submodel_id: &Identifier, path: &IdShortPath) -> Self {
        let mut keys = Vec::with_capacity(path.len() + 1);
        keys.push(Key::new(KeyType::Submodel, submodel_id.as_str()));
        keys.extend(
            path.segments()
                .iter()
                .map(|s| Key::new(KeyType::SubmodelElement, s.as_str())),
        );
        Self::new(keys)
    }

    /// Returns a new reference with one `SubmodelElement` key appended.
    #[must_use]
    pub fn child(&self, id_short: impl Into<String>) -> Self {
        let mut keys = self.keys.clone();
        keys.push(Key::new(KeyType::SubmodelElement, id_short));
        Self::new(keys)
    }

    /// Returns the reference with the last key removed, or `None` for a
    /// single-key reference.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.keys.len() <= 1 {
            return None;
        }
        Some(Self::new(self.keys[..self.keys.len() - 1].to_vec()))
    }

    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    #[must_use]
    pub fn last(&self) -> Option<&Key> {
        self.keys.last()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns `true` if `self` equals `other` or addresses one of its
    /// ancestors.
    #[must_use]
    pub fn is_prefix_of(&self, other: &Reference) -> bool {
        other.keys.len() >= self.keys.len() && other.keys[..self.keys.len()] == self.keys[..]
    }

    /// Identifier of the submodel this reference starts at, if any.
    #[must_use]
    pub fn submodel_id(&self) -> Option<Identifier> {
        match self.keys.first() {
            Some(k) if k.key_type == KeyType::Submodel => Some(Identifier::new(k.value.as_str())),
            _ => None,
        }
    }

    /// Element path below the submodel, if this is an element reference.
    #[must_use]
    pub fn id_short_path(&self) -> Option<IdShortPath> {
        self.submodel_id()?;
        let segments: Vec<String> = self.keys[1..]
            .iter()
            .take_while(|k| k.key_type == KeyType::SubmodelElement)
            .map(|k| k.value.clone())
            .collect();
        if segments.is_empty() || segments.len() != self.keys.len() - 1 {
            return None;
        }
        Some(IdShortPath { segments })
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

/// Failure to parse an [`IdShortPath`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdShortPathError {
    #[error("id_short path is empty")]
    Empty,

    #[error("id_short path '{path}' contains an empty segment")]
    EmptySegment { path: String },
}

impl ErrorCode for IdShortPathError {
    fn code(&self) -> &'static str {
        match self {
            Self::Empty => "REFERENCE_EMPTY_PATH",
            Self::EmptySegment { .. } => "REFERENCE_EMPTY_SEGMENT",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Non-empty path of id_shorts from a submodel down to a nested element.
///
/// Both `/` and `.` separate segments: `"Motor1/Temperature"` and
/// `"Motor1.Temperature"` parse to the same path. `Display` uses `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdShortPath {
    segments: Vec<String>,
}

impl IdShortPath {
    /// Parses a separator-delimited path.
    ///
    /// # Errors
    ///
    /// [`IdShortPathError::Empty`] for an empty string,
    /// [`IdShortPathError::EmptySegment`] for `"a//b"`, `"a."` and similar.
    pub fn parse(path: &str) -> Result<Self, IdShortPathError> {
        if path.is_empty() {
            return Err(IdShortPathError::Empty);
        }
        let segments: Vec<String> = path.split(['/', '.']).map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(IdShortPathError::EmptySegment {
                path: path.to_string(),
            });
        }
        Ok(Self { segments })
    }

    /// Single-segment path.
    ///
    /// # Errors
    ///
    /// Returns [`IdShortPathError::Empty`] if `id_short` is empty.
    pub fn single(id_short: impl Into<String>) -> Result<Self, IdShortPathError> {
        let id_short = id_short.into();
        if id_short.is_empty() {
            return Err(IdShortPathError::Empty);
        }
        Ok(Self {
            segments: vec![id_short],
        })
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The last id_short of the path.
    #[must_use]
    pub fn last(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Path without the last segment, `None` for a top-level element.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Returns a new path with `id_short` appended.
    #[must_use]
    pub fn join(&self, id_short: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(id_short.into());
        Self { segments }
    }
}

impl fmt::Display for IdShortPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl FromStr for IdShortPath {
    type Err = IdShortPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for IdShortPath {
    type Error = IdShortPathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<IdShortPath> for String {
    fn from(value: IdShortPath) -> Self {
        value.to_string()
    }
}
