//! Persistence contract.
//!
//! Persistence is the single source of truth for the model tree and for
//! operation results. Every call is synchronous and may come from any
//! thread: request handlers, asset subscription callbacks and operation
//! completion callbacks all write through the same instance.
//!
//! # Locking
//!
//! ```text
//! ┌──────────────────────────────┐   ┌──────────────────────────────────┐
//! │ RwLock<Environment>          │   │ RwLock<HashMap<HandleId, Entry>> │
//! │  shells, submodels, elements │   │   Entry = Arc<Mutex<Result>>     │
//! └──────────────────────────────┘   └──────────────────────────────────┘
//! ```
//!
//! [`Persistence::update_operation_result`] runs its closure under the
//! per-handle lock, which makes load-check-store of one operation result
//! atomic without blocking other handles.
//!
//! Updates of the tree never insert. `replace_*` and
//! [`Persistence::update_shell`] check for the target and change it under
//! the same write lock, so an update racing a delete either lands before
//! the delete or fails with `NotFound`.

mod error;
mod memory;

pub use error::PersistenceError;
pub use memory::InMemoryPersistence;

use crate::operation::{OperationHandle, OperationResult};
use twin_model::{
    AssetAdministrationShell, ElementValue, Environment, QueryModifier, Submodel, SubmodelElement,
};
use twin_types::{HandleId, IdShortPath, Identifier, Reference, RequestId};

/// Storage for the model tree and operation results.
///
/// Getters return owned copies shaped by the [`QueryModifier`]; callers
/// never alias stored state.
pub trait Persistence: Send + Sync {
    /// Replaces the whole model tree.
    fn set_environment(&self, environment: Environment);

    /// Snapshot of the whole model tree, unmodified.
    fn environment(&self) -> Environment;

    // --- shells ---

    fn get_all_shells(&self, modifier: &QueryModifier) -> Vec<AssetAdministrationShell>;

    fn get_shell(&self, id: &Identifier, modifier: &QueryModifier)
        -> Result<AssetAdministrationShell, PersistenceError>;

    /// Adds a shell; fails if its id is taken.
    fn create_shell(&self, shell: AssetAdministrationShell) -> Result<(), PersistenceError>;

    /// Replaces an existing shell; fails with `NotFound` if it is absent.
    fn replace_shell(&self, shell: AssetAdministrationShell) -> Result<(), PersistenceError>;

    /// Applies `update` to a stored shell under the tree's write lock and
    /// returns the shell as it is afterwards.
    fn update_shell(
        &self,
        id: &Identifier,
        update: &mut dyn FnMut(&mut AssetAdministrationShell),
    ) -> Result<AssetAdministrationShell, PersistenceError>;

    /// Removes and returns a shell.
    fn remove_shell(&self, id: &Identifier) -> Result<AssetAdministrationShell, PersistenceError>;

    // --- submodels ---

    fn get_all_submodels(&self, modifier: &QueryModifier) -> Vec<Submodel>;

    fn get_submodel(&self, id: &Identifier, modifier: &QueryModifier) -> Result<Submodel, PersistenceError>;

    /// Adds a submodel; fails if its id is taken.
    fn create_submodel(&self, submodel: Submodel) -> Result<(), PersistenceError>;

    /// Replaces an existing submodel; fails with `NotFound` if it is absent.
    fn replace_submodel(&self, submodel: Submodel) -> Result<(), PersistenceError>;

    /// Removes and returns a submodel.
    fn remove_submodel(&self, id: &Identifier) -> Result<Submodel, PersistenceError>;

    // --- submodel elements ---

    /// Children of `parent` (top-level elements for `None`).
    fn get_elements(
        &self,
        submodel_id: &Identifier,
        parent: Option<&IdShortPath>,
        modifier: &QueryModifier,
    ) -> Result<Vec<SubmodelElement>, PersistenceError>;

    fn get_element(&self, reference: &Reference, modifier: &QueryModifier)
        -> Result<SubmodelElement, PersistenceError>;

    /// Adds `element` below `parent` (a submodel or collection reference)
    /// and returns the new element's reference.
    fn create_element(&self, parent: &Reference, element: SubmodelElement)
        -> Result<Reference, PersistenceError>;

    /// Replaces the element at `reference`; fails with `NotFound` if it is
    /// absent.
    fn replace_element(&self, reference: &Reference, element: SubmodelElement) -> Result<(), PersistenceError>;

    /// Removes and returns an element.
    fn remove_element(&self, reference: &Reference) -> Result<SubmodelElement, PersistenceError>;

    /// Replaces an element's value and returns the previous value, in one
    /// step under the tree lock.
    fn set_element_value(&self, reference: &Reference, value: ElementValue)
        -> Result<ElementValue, PersistenceError>;

    // --- operation results ---

    /// Stores an operation result. With `handle = None` a new handle is
    /// minted; otherwise the existing record is overwritten.
    fn put_operation_context(
        &self,
        handle: Option<HandleId>,
        request_id: RequestId,
        result: OperationResult,
    ) -> Result<OperationHandle, PersistenceError>;

    fn get_operation_result(&self, handle: &HandleId) -> Result<OperationResult, PersistenceError>;

    /// Applies `update` to the stored result under its per-handle lock and
    /// returns the record as it is afterwards.
    fn update_operation_result(
        &self,
        handle: &HandleId,
        update: &mut dyn FnMut(&mut OperationResult),
    ) -> Result<OperationResult, PersistenceError>;
}
