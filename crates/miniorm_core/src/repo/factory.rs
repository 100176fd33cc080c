//! Repository factory.
//!
//! # Responsibility
//! - Validate caller-declared contract types.
//! - Resolve entity metadata once per produced repository and bind it to a
//!   routing proxy over the shared connection provider.
//!
//! # Invariants
//! - Contract shape is checked before any metadata is resolved.
//! - The contract's identifier type must match the entity's identifier
//!   field kind.
//! - Producing a repository performs no storage I/O.

use crate::config::DataSourceConfig;
use crate::db::{ConnectionProvider, SqliteConnectionProvider};
use crate::metadata::{resolve, EntityMetadata};
use crate::model::declaration::Entity;
use crate::model::value::FieldType;
use crate::repo::contract::{ContractDeclaration, ContractKind, RepositoryContract};
use crate::repo::generic_repo::{GenericRepository, RepoError, RepoResult};
use crate::repo::proxy::RepositoryProxy;
use log::{error, info};
use std::sync::Arc;

/// Produces repositories that share one connection provider.
#[derive(Clone)]
pub struct RepositoryFactory {
    provider: Arc<dyn ConnectionProvider>,
}

impl std::fmt::Debug for RepositoryFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryFactory").finish_non_exhaustive()
    }
}

impl RepositoryFactory {
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self { provider }
    }

    /// Builds a factory over a SQLite provider for `config`.
    pub fn from_config(config: &DataSourceConfig) -> RepoResult<Self> {
        config
            .validate()
            .map_err(|err| RepoError::Configuration(err.to_string()))?;
        let provider = SqliteConnectionProvider::open(config)?;
        Ok(Self::new(Arc::new(provider)))
    }

    pub fn provider(&self) -> &Arc<dyn ConnectionProvider> {
        &self.provider
    }

    /// Produces an instance of contract type `R`.
    ///
    /// # Errors
    /// - `Configuration` when `R` is concrete, does not cover all five CRUD
    ///   operations, or names an identifier type that does not match the
    ///   entity's identifier field.
    /// - `Metadata` when `R::Entity`'s mapping declaration is malformed.
    pub fn create_repository<R: RepositoryContract>(&self) -> RepoResult<R> {
        let declaration = R::declaration();
        let proxy = validate_contract(&declaration)
            .and_then(|()| self.build_proxy::<R::Entity, R::Id>(&declaration.name))
            .inspect_err(|err| {
                error!(
                    "event=repository_create module=repo status=error contract={} error={}",
                    declaration.name, err
                );
            })?;
        Ok(R::bind(proxy))
    }

    /// Produces a bare routing proxy for entity `T` with identifier `ID`.
    pub fn repository_for<T: Entity, ID: FieldType>(
        &self,
    ) -> RepoResult<RepositoryProxy<T, ID>> {
        let name = format!("CrudRepository<{}>", std::any::type_name::<T>());
        self.build_proxy(&name)
    }

    fn build_proxy<T: Entity, ID: FieldType>(
        &self,
        contract: &str,
    ) -> RepoResult<RepositoryProxy<T, ID>> {
        let metadata = resolve::<T>()?;
        ensure_id_type::<T, ID>(contract, &metadata)?;
        info!(
            "event=repository_create module=repo status=ok contract={} entity={} table={} target={}",
            contract,
            metadata.type_name(),
            metadata.table_name(),
            self.provider.target()
        );
        let dispatcher = GenericRepository::new(metadata, Arc::clone(&self.provider));
        Ok(RepositoryProxy::new(contract, dispatcher))
    }
}

fn validate_contract(declaration: &ContractDeclaration) -> RepoResult<()> {
    if declaration.kind == ContractKind::Concrete {
        return Err(RepoError::Configuration(format!(
            "`{}` is a concrete type, not a repository capability declaration",
            declaration.name
        )));
    }

    let missing = declaration.missing_operations();
    if !missing.is_empty() {
        let names = missing
            .iter()
            .map(|op| op.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(RepoError::Configuration(format!(
            "`{}` does not declare the CRUD operations: {names}",
            declaration.name
        )));
    }
    Ok(())
}

fn ensure_id_type<T, ID: FieldType>(
    contract: &str,
    metadata: &EntityMetadata<T>,
) -> RepoResult<()> {
    let declared = metadata.id_field().value_type();
    if ID::VALUE_TYPE == declared {
        return Ok(());
    }
    Err(RepoError::Configuration(format!(
        "`{contract}` uses identifier type `{}` but `{}.{}` is `{declared}`",
        ID::VALUE_TYPE,
        metadata.type_name(),
        metadata.id_field().field_name()
    )))
}
