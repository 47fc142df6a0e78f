//! In-memory persistence.

use super::{Persistence, PersistenceError};
use crate::operation::{OperationHandle, OperationResult};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use twin_model::{
    AssetAdministrationShell, ElementValue, Environment, QueryModifier, Submodel, SubmodelElement,
};
use twin_types::{HandleId, IdShortPath, Identifier, Reference, RequestId};

type OperationEntry = Arc<Mutex<OperationResult>>;

/// [`Persistence`] backed by process memory.
///
/// Values are cloned in and out; nothing handed to a caller aliases the
/// stored tree.
///
/// # Example
///
/// ```
/// use twin_model::{QueryModifier, Submodel};
/// use twin_runtime::persistence::{InMemoryPersistence, Persistence};
/// use twin_types::Identifier;
///
/// let store = InMemoryPersistence::new();
/// store.create_submodel(Submodel::new("urn:sm:1", "Sm1")).unwrap();
///
/// let sm = store.get_submodel(&Identifier::new("urn:sm:1"), &QueryModifier::default()).unwrap();
/// assert_eq!(sm.id_short, "Sm1");
/// assert!(store.create_submodel(Submodel::new("urn:sm:1", "Again")).is_err());
/// ```
#[derive(Default)]
pub struct InMemoryPersistence {
    environment: RwLock<Environment>,
    operations: RwLock<HashMap<HandleId, OperationEntry>>,
}

impl InMemoryPersistence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `environment`.
    #[must_use]
    pub fn with_environment(environment: Environment) -> Self {
        Self {
            environment: RwLock::new(environment),
            operations: RwLock::default(),
        }
    }

    fn entry(&self, handle: &HandleId) -> Result<OperationEntry, PersistenceError> {
        self.operations
            .read()
            .get(handle)
            .cloned()
            .ok_or(PersistenceError::OperationNotFound(*handle))
    }

    /// Drops every operation record `keep` rejects and returns how many
    /// were dropped.
    ///
    /// Records are never evicted on their own, terminal or not. A
    /// long-running service prunes them with this, typically keeping
    /// `Running` records and recently polled ones.
    pub fn retain_operation_results(&self, mut keep: impl FnMut(&HandleId, &OperationResult) -> bool) -> usize {
        let mut operations = self.operations.write();
        let before = operations.len();
        operations.retain(|id, entry| keep(id, &entry.lock()));
        let dropped = before - operations.len();
        if dropped > 0 {
            debug!(dropped, remaining = operations.len(), "operation results pruned");
        }
        dropped
    }
}

fn split_element_ref(reference: &Reference) -> Result<(Identifier, IdShortPath), PersistenceError> {
    match (reference.submodel_id(), reference.id_short_path()) {
        (Some(submodel_id), Some(path)) => Ok((submodel_id, path)),
        _ => Err(PersistenceError::InvalidReference(reference.clone())),
    }
}

fn submodel_mut<'a>(env: &'a mut Environment, id: &Identifier) -> Result<&'a mut Submodel, PersistenceError> {
    env.submodel_mut(id)
        .ok_or_else(|| PersistenceError::NotFound(format!("submodel '{id}'")))
}

/// Children list below `parent`, distinguishing a missing parent from one
/// that cannot hold children.
fn children_mut<'a>(
    submodel: &'a mut Submodel,
    parent: Option<&IdShortPath>,
    parent_ref: &Reference,
) -> Result<&'a mut Vec<SubmodelElement>, PersistenceError> {
    let Some(path) = parent else {
        return Ok(&mut submodel.submodel_elements);
    };
    let element = submodel
        .element_mut(path)
        .ok_or_else(|| PersistenceError::NotFound(parent_ref.to_string()))?;
    element
        .children_mut()
        .ok_or_else(|| PersistenceError::InvalidParent(parent_ref.clone()))
}

impl Persistence for InMemoryPersistence {
    fn set_environment(&self, environment: Environment) {
        debug!(
            shells = environment.asset_administration_shells.len(),
            submodels = environment.submodels.len(),
            "environment replaced"
        );
        *self.environment.write() = environment;
    }

    fn environment(&self) -> Environment {
        self.environment.read().clone()
    }

    fn get_all_shells(&self, _modifier: &QueryModifier) -> Vec<AssetAdministrationShell> {
        self.environment.read().asset_administration_shells.clone()
    }

    fn get_shell(
        &self,
        id: &Identifier,
        _modifier: &QueryModifier,
    ) -> Result<AssetAdministrationShell, PersistenceError> {
        self.environment
            .read()
            .shell(id)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound(format!("shell '{id}'")))
    }

    fn create_shell(&self, shell: AssetAdministrationShell) -> Result<(), PersistenceError> {
        let mut env = self.environment.write();
        if env.shell(&shell.id).is_some() {
            return Err(PersistenceError::AlreadyExists(format!("shell '{}'", shell.id)));
        }
        env.asset_administration_shells.push(shell);
        Ok(())
    }

    fn replace_shell(&self, shell: AssetAdministrationShell) -> Result<(), PersistenceError> {
        let mut env = self.environment.write();
        let existing = env
            .shell_mut(&shell.id)
            .ok_or_else(|| PersistenceError::NotFound(format!("shell '{}'", shell.id)))?;
        *existing = shell;
        Ok(())
    }

    fn update_shell(
        &self,
        id: &Identifier,
        update: &mut dyn FnMut(&mut AssetAdministrationShell),
    ) -> Result<AssetAdministrationShell, PersistenceError> {
        let mut env = self.environment.write();
        let shell = env
            .shell_mut(id)
            .ok_or_else(|| PersistenceError::NotFound(format!("shell '{id}'")))?;
        update(shell);
        Ok(shell.clone())
    }

    fn remove_shell(&self, id: &Identifier) -> Result<AssetAdministrationShell, PersistenceError> {
        let mut env = self.environment.write();
        let index = env
            .asset_administration_shells
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| PersistenceError::NotFound(format!("shell '{id}'")))?;
        Ok(env.asset_administration_shells.remove(index))
    }

    fn get_all_submodels(&self, modifier: &QueryModifier) -> Vec<Submodel> {
        self.environment
            .read()
            .submodels
            .iter()
            .map(|s| modifier.apply_submodel(s))
            .collect()
    }

    fn get_submodel(&self, id: &Identifier, modifier: &QueryModifier) -> Result<Submodel, PersistenceError> {
        self.environment
            .read()
            .submodel(id)
            .map(|s| modifier.apply_submodel(s))
            .ok_or_else(|| PersistenceError::NotFound(format!("submodel '{id}'")))
    }

    fn create_submodel(&self, submodel: Submodel) -> Result<(), PersistenceError> {
        let mut env = self.environment.write();
        if env.submodel(&submodel.id).is_some() {
            return Err(PersistenceError::AlreadyExists(format!("submodel '{}'", submodel.id)));
        }
        env.submodels.push(submodel);
        Ok(())
    }

    fn replace_submodel(&self, submodel: Submodel) -> Result<(), PersistenceError> {
        let mut env = self.environment.write();
        let existing = submodel_mut(&mut env, &submodel.id)?;
        *existing = submodel;
        Ok(())
    }

    fn remove_submodel(&self, id: &Identifier) -> Result<Submodel, PersistenceError> {
        let mut env = self.environment.write();
        let index = env
            .submodels
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| PersistenceError::NotFound(format!("submodel '{id}'")))?;
        Ok(env.submodels.remove(index))
    }

    fn get_elements(
        &self,
        submodel_id: &Identifier,
        parent: Option<&IdShortPath>,
        modifier: &QueryModifier,
    ) -> Result<Vec<SubmodelElement>, PersistenceError> {
        let env = self.environment.read();
        let submodel = env
            .submodel(submodel_id)
            .ok_or_else(|| PersistenceError::NotFound(format!("submodel '{submodel_id}'")))?;
        let children = match parent {
            None => submodel.submodel_elements.as_slice(),
            Some(path) => {
                let parent_ref = Reference::element(submodel_id, path);
                submodel
                    .element(path)
                    .ok_or_else(|| PersistenceError::NotFound(parent_ref.to_string()))?
                    .children()
                    .ok_or(PersistenceError::InvalidParent(parent_ref))?
            }
        };
        Ok(children.iter().map(|e| modifier.apply_element(e)).collect())
    }

    fn get_element(
        &self,
        reference: &Reference,
        modifier: &QueryModifier,
    ) -> Result<SubmodelElement, PersistenceError> {
        split_element_ref(reference)?;
        self.environment
            .read()
            .element(reference)
            .map(|e| modifier.apply_element(e))
            .ok_or_else(|| PersistenceError::NotFound(reference.to_string()))
    }

    fn create_element(
        &self,
        parent: &Reference,
        element: SubmodelElement,
    ) -> Result<Reference, PersistenceError> {
        let submodel_id = parent
            .submodel_id()
            .ok_or_else(|| PersistenceError::InvalidReference(parent.clone()))?;
        let parent_path = if parent.keys().len() == 1 {
            None
        } else {
            Some(
                parent
                    .id_short_path()
                    .ok_or_else(|| PersistenceError::InvalidReference(parent.clone()))?,
            )
        };
        let created = parent.child(element.id_short());

        let mut env = self.environment.write();
        let submodel = submodel_mut(&mut env, &submodel_id)?;
        let children = children_mut(submodel, parent_path.as_ref(), parent)?;
        if children.iter().any(|e| e.id_short() == element.id_short()) {
            return Err(PersistenceError::AlreadyExists(created.to_string()));
        }
        children.push(element);
        debug!(reference = %created, "element created");
        Ok(created)
    }

    fn replace_element(&self, reference: &Reference, element: SubmodelElement) -> Result<(), PersistenceError> {
        let (_, path) = split_element_ref(reference)?;
        if element.id_short() != path.last() {
            return Err(PersistenceError::InvalidReference(reference.clone()));
        }
        let mut env = self.environment.write();
        let existing = env
            .element_mut(reference)
            .ok_or_else(|| PersistenceError::NotFound(reference.to_string()))?;
        *existing = element;
        Ok(())
    }

    fn remove_element(&self, reference: &Reference) -> Result<SubmodelElement, PersistenceError> {
        let (submodel_id, path) = split_element_ref(reference)?;
        let parent_path = path.parent();
        let parent_ref = reference.parent().unwrap_or_else(|| Reference::submodel(&submodel_id));

        let mut env = self.environment.write();
        let submodel = submodel_mut(&mut env, &submodel_id)?;
        let not_found = || PersistenceError::NotFound(reference.to_string());
        let children = children_mut(submodel, parent_path.as_ref(), &parent_ref).map_err(|e| match e {
            PersistenceError::InvalidParent(_) => not_found(),
            other => other,
        })?;
        let index = children
            .iter()
            .position(|e| e.id_short() == path.last())
            .ok_or_else(not_found)?;
        Ok(children.remove(index))
    }

    fn set_element_value(
        &self,
        reference: &Reference,
        value: ElementValue,
    ) -> Result<ElementValue, PersistenceError> {
        split_element_ref(reference)?;
        let mut env = self.environment.write();
        let element = env
            .element_mut(reference)
            .ok_or_else(|| PersistenceError::NotFound(reference.to_string()))?;
        let old = element.value();
        element.set_value(value)?;
        Ok(old)
    }

    fn put_operation_context(
        &self,
        handle: Option<HandleId>,
        request_id: RequestId,
        result: OperationResult,
    ) -> Result<OperationHandle, PersistenceError> {
        let handle_id = match handle {
            Some(id) => {
                let existing = self.operations.read().get(&id).cloned();
                match existing {
                    Some(entry) => *entry.lock() = result,
                    None => {
                        self.operations.write().insert(id, Arc::new(Mutex::new(result)));
                    }
                }
                id
            }
            None => {
                let id = HandleId::new();
                self.operations.write().insert(id, Arc::new(Mutex::new(result)));
                debug!(handle_id = %id, request_id = %request_id, "operation context created");
                id
            }
        };
        Ok(OperationHandle {
            handle_id,
            request_id,
        })
    }

    fn get_operation_result(&self, handle: &HandleId) -> Result<OperationResult, PersistenceError> {
        let entry = self.entry(handle)?;
        let result = entry.lock().clone();
        Ok(result)
    }

    fn update_operation_result(
        &self,
        handle: &HandleId,
        update: &mut dyn FnMut(&mut OperationResult),
    ) -> Result<OperationResult, PersistenceError> {
        let entry = self.entry(handle)?;
        let mut guard = entry.lock();
        update(&mut guard);
        Ok(guard.clone())
    }
}
