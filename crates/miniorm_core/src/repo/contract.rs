//! Repository contracts: the CRUD capability set and caller-declared
//! contract types.
//!
//! # Responsibility
//! - Name the five recognized repository operations.
//! - Define the typed CRUD contract every produced repository satisfies.
//! - Let callers declare their own contract types without writing CRUD code.
//!
//! # Invariants
//! - Routed calls match canonical camelCase names only.
//! - Contract declarations may also list the snake_case spelling of the
//!   trait methods.
//! - Every `RepositoryContract` type is a `CrudRepository` through the
//!   blanket implementation; contract types never implement CRUD by hand.

use crate::model::declaration::Entity;
use crate::model::value::FieldType;
use crate::repo::generic_repo::RepoResult;
use crate::repo::proxy::RepositoryProxy;
use std::collections::BTreeSet;

/// Canonical name of the save operation.
pub const OPERATION_SAVE: &str = "save";
/// Canonical name of the find-by-id operation.
pub const OPERATION_FIND_BY_ID: &str = "findById";
/// Canonical name of the find-all operation.
pub const OPERATION_FIND_ALL: &str = "findAll";
/// Canonical name of the delete-by-id operation.
pub const OPERATION_DELETE_BY_ID: &str = "deleteById";
/// Canonical name of the count operation.
pub const OPERATION_COUNT: &str = "count";

/// One of the five recognized repository operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    Save,
    FindById,
    FindAll,
    DeleteById,
    Count,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Self::Save,
        Self::FindById,
        Self::FindAll,
        Self::DeleteById,
        Self::Count,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Save => OPERATION_SAVE,
            Self::FindById => OPERATION_FIND_BY_ID,
            Self::FindAll => OPERATION_FIND_ALL,
            Self::DeleteById => OPERATION_DELETE_BY_ID,
            Self::Count => OPERATION_COUNT,
        }
    }

    /// Matches a routed call name; only the five canonical names match.
    pub fn from_call_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == name)
    }

    /// Parses a declared operation name, canonical or snake_case.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            OPERATION_SAVE => Some(Self::Save),
            OPERATION_FIND_BY_ID | "find_by_id" => Some(Self::FindById),
            OPERATION_FIND_ALL | "find_all" => Some(Self::FindAll),
            OPERATION_DELETE_BY_ID | "delete_by_id" => Some(Self::DeleteById),
            OPERATION_COUNT => Some(Self::Count),
            _ => None,
        }
    }
}

/// Typed CRUD contract over entity `T` with identifier `ID`.
pub trait CrudRepository<T, ID> {
    fn save(&self, entity: T) -> RepoResult<T>;
    fn find_by_id(&self, id: ID) -> RepoResult<Option<T>>;
    fn find_all(&self) -> RepoResult<Vec<T>>;
    fn delete_by_id(&self, id: ID) -> RepoResult<()>;
    fn count(&self) -> RepoResult<u64>;
}

/// Whether a contract type is a pure capability declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractKind {
    /// Declares operations only; the factory supplies the behavior.
    Capability,
    /// Carries its own implementation; not a valid factory target.
    Concrete,
}

/// Shape of a caller-declared repository contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDeclaration {
    pub name: String,
    pub kind: ContractKind,
    pub operations: Vec<String>,
}

impl ContractDeclaration {
    /// Starts a capability declaration with no operations.
    pub fn capability(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ContractKind::Capability,
            operations: Vec::new(),
        }
    }

    /// Starts a concrete declaration; the factory rejects these.
    pub fn concrete(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ContractKind::Concrete,
            operations: Vec::new(),
        }
    }

    /// Adds the five CRUD operations.
    pub fn extends_crud(mut self) -> Self {
        self.operations
            .extend(Operation::ALL.iter().map(|op| op.as_str().to_string()));
        self
    }

    /// Adds one declared operation.
    pub fn operation(mut self, name: impl Into<String>) -> Self {
        self.operations.push(name.into());
        self
    }

    /// CRUD operations this declaration does not cover.
    pub fn missing_operations(&self) -> Vec<Operation> {
        let declared: BTreeSet<Operation> = self
            .operations
            .iter()
            .filter_map(|name| Operation::parse(name))
            .collect();
        Operation::ALL
            .into_iter()
            .filter(|op| !declared.contains(op))
            .collect()
    }
}

/// A caller-declared repository type the factory can produce.
///
/// The associated types carry the contract's entity and identifier type
/// parameters. `bind` receives the routing object built by the factory;
/// `proxy` hands it back for the blanket `CrudRepository` implementation.
pub trait RepositoryContract: Sized {
    type Entity: Entity;
    type Id: FieldType;

    fn declaration() -> ContractDeclaration;

    fn bind(proxy: RepositoryProxy<Self::Entity, Self::Id>) -> Self;

    fn proxy(&self) -> &RepositoryProxy<Self::Entity, Self::Id>;
}

impl<R: RepositoryContract> CrudRepository<R::Entity, R::Id> for R {
    fn save(&self, entity: R::Entity) -> RepoResult<R::Entity> {
        self.proxy().save(entity)
    }

    fn find_by_id(&self, id: R::Id) -> RepoResult<Option<R::Entity>> {
        self.proxy().find_by_id(id)
    }

    fn find_all(&self) -> RepoResult<Vec<R::Entity>> {
        self.proxy().find_all()
    }

    fn delete_by_id(&self, id: R::Id) -> RepoResult<()> {
        self.proxy().delete_by_id(id)
    }

    fn count(&self) -> RepoResult<u64> {
        self.proxy().count()
    }
}
