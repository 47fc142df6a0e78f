//! Event kinds for subscription filtering.
//!
//! | Kind | Emitted by | Payload |
//! |------|-----------|---------|
//! | `ElementCreate` | `Post*` requests | created element |
//! | `ElementUpdate` | `Put*` requests | updated element |
//! | `ElementDelete` | `Delete*` requests | removed element |
//! | `ValueChange` | value writes, asset pushes | old and new value |
//! | `OperationInvoke` | operation invocation | input / in-out arguments |
//! | `OperationFinish` | operation completion | output / in-out arguments |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fieldless tag of an [`EventMessage`](crate::EventMessage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    ElementCreate,
    ElementUpdate,
    ElementDelete,
    ValueChange,
    OperationInvoke,
    OperationFinish,
}

impl EventKind {
    /// All kinds, in declaration order.
    pub const ALL: [EventKind; 6] = [
        Self::ElementCreate,
        Self::ElementUpdate,
        Self::ElementDelete,
        Self::ValueChange,
        Self::OperationInvoke,
        Self::OperationFinish,
    ];

    /// Returns `true` for create/update/delete events.
    #[must_use]
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            Self::ElementCreate | Self::ElementUpdate | Self::ElementDelete
        )
    }

    /// Returns `true` for operation lifecycle events.
    #[must_use]
    pub fn is_operation(self) -> bool {
        matches!(self, Self::OperationInvoke | Self::OperationFinish)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
