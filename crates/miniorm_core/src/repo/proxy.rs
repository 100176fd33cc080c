//! Call-routing object behind every factory-produced repository.
//!
//! # Responsibility
//! - Forward typed CRUD calls to the shared `GenericRepository`.
//! - Route calls by operation name for callers that only know the name.
//!
//! # Invariants
//! - Arguments pass through unchanged; identifiers are converted to field
//!   values only at the dispatcher boundary.
//! - Unknown call names fail with `UnsupportedOperation` naming the call.

use crate::model::declaration::Entity;
use crate::model::value::FieldType;
use crate::repo::contract::{CrudRepository, Operation};
use crate::repo::generic_repo::{GenericRepository, RepoError, RepoResult};
use log::debug;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;

/// One argument of a by-name call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallArg<T, ID> {
    Entity(T),
    Id(ID),
}

/// Result of a by-name call, one variant per operation shape.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome<T> {
    Saved(T),
    Found(Option<T>),
    All(Vec<T>),
    Deleted,
    Count(u64),
}

/// Repository object bound to one entity's dispatcher.
pub struct RepositoryProxy<T, ID> {
    contract: String,
    dispatcher: Arc<GenericRepository<T>>,
    _id: PhantomData<fn(ID)>,
}

impl<T: Entity, ID: FieldType> RepositoryProxy<T, ID> {
    pub fn new(contract: impl Into<String>, dispatcher: GenericRepository<T>) -> Self {
        Self {
            contract: contract.into(),
            dispatcher: Arc::new(dispatcher),
            _id: PhantomData,
        }
    }

    /// Name of the contract this proxy was produced for.
    pub fn contract_name(&self) -> &str {
        &self.contract
    }

    pub fn dispatcher(&self) -> &GenericRepository<T> {
        &self.dispatcher
    }

    /// Routes one call by operation name.
    ///
    /// # Errors
    /// - `UnsupportedOperation` when `operation` is not one of the five
    ///   canonical names (`save`, `findById`, `findAll`, `deleteById`,
    ///   `count`).
    /// - `InvalidArguments` when `args` do not match the operation's shape.
    /// - Whatever the routed operation itself returns.
    pub fn invoke(
        &self,
        operation: &str,
        args: Vec<CallArg<T, ID>>,
    ) -> RepoResult<CallOutcome<T>> {
        let Some(op) = Operation::from_call_name(operation) else {
            return Err(RepoError::UnsupportedOperation(operation.to_string()));
        };
        debug!(
            "event=repo_invoke module=repo contract={} op={}",
            self.contract,
            op.as_str()
        );

        let mut args = args.into_iter();
        let first = args.next();
        let extra = args.next();
        match (op, first, extra) {
            (Operation::Save, Some(CallArg::Entity(entity)), None) => {
                self.save(entity).map(CallOutcome::Saved)
            }
            (Operation::FindById, Some(CallArg::Id(id)), None) => {
                self.find_by_id(id).map(CallOutcome::Found)
            }
            (Operation::FindAll, None, None) => self.find_all().map(CallOutcome::All),
            (Operation::DeleteById, Some(CallArg::Id(id)), None) => {
                self.delete_by_id(id).map(|()| CallOutcome::Deleted)
            }
            (Operation::Count, None, None) => self.count().map(CallOutcome::Count),
            (op, _, _) => Err(RepoError::InvalidArguments {
                operation: op.as_str().to_string(),
                expected: expected_arguments(op),
            }),
        }
    }
}

impl<T: Entity, ID: FieldType> CrudRepository<T, ID> for RepositoryProxy<T, ID> {
    fn save(&self, entity: T) -> RepoResult<T> {
        self.dispatcher.save(entity)
    }

    fn find_by_id(&self, id: ID) -> RepoResult<Option<T>> {
        self.dispatcher.find_by_id(&id.to_field_value())
    }

    fn find_all(&self) -> RepoResult<Vec<T>> {
        self.dispatcher.find_all()
    }

    fn delete_by_id(&self, id: ID) -> RepoResult<()> {
        self.dispatcher.delete_by_id(&id.to_field_value())
    }

    fn count(&self) -> RepoResult<u64> {
        self.dispatcher.count()
    }
}

impl<T, ID> Clone for RepositoryProxy<T, ID> {
    fn clone(&self) -> Self {
        Self {
            contract: self.contract.clone(),
            dispatcher: Arc::clone(&self.dispatcher),
            _id: PhantomData,
        }
    }
}

impl<T, ID> Debug for RepositoryProxy<T, ID> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryProxy")
            .field("contract", &self.contract)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

fn expected_arguments(op: Operation) -> &'static str {
    match op {
        Operation::Save => "exactly one entity argument",
        Operation::FindById | Operation::DeleteById => "exactly one identifier argument",
        Operation::FindAll | Operation::Count => "no arguments",
    }
}
