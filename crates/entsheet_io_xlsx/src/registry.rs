//! Immutable entity/data-access registry built once by the host at startup.

use std::any::TypeId;
use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::error::{RegistryError, ResolveError};
use crate::schema::{DataAccessDescriptor, Entity, EntityDescriptor, EntityRepository};
use crate::util::is_within_scope;

/// Mutable accumulator for entity and repository registrations.
#[derive(Debug, Default)]
pub struct EntityRegistryBuilder {
    l_entities: Vec<EntityDescriptor>,
    l_data_access: Vec<DataAccessDescriptor>,
}

impl EntityRegistryBuilder {
    /// Register entity type `E` under namespace `scope`.
    pub fn register_entity<E: Entity>(mut self, scope: impl Into<String>) -> Self {
        self.l_entities.push(EntityDescriptor::of::<E>(scope));
        self
    }

    /// Register `repository` under namespace `scope`.
    ///
    /// Its target entity is the repository's associated `Entity` type.
    pub fn register_repository<R: EntityRepository>(
        mut self,
        scope: impl Into<String>,
        repository: R,
    ) -> Self {
        self.l_data_access
            .push(DataAccessDescriptor::of(scope, repository));
        self
    }

    /// Finalize builder into an immutable registry.
    pub fn build(self) -> Result<EntityRegistry, RegistryError> {
        let mut dict_entity_scopes: BTreeMap<TypeId, (&str, &str)> = BTreeMap::new();
        for entity in &self.l_entities {
            let c_entry = (entity.simple_name.as_str(), entity.scope.as_str());
            if let Some((c_name, c_scope_first)) = dict_entity_scopes.insert(entity.type_id(), c_entry)
            {
                return Err(RegistryError::DuplicateEntity {
                    entity: c_name.to_string(),
                    scope_first: c_scope_first.to_string(),
                    scope_second: entity.scope.clone(),
                });
            }
        }

        let mut set_dao_names: BTreeSet<(&str, &str)> = BTreeSet::new();
        for dao in &self.l_data_access {
            if !set_dao_names.insert((dao.scope.as_str(), dao.name.as_str())) {
                return Err(RegistryError::DuplicateDataAccess {
                    name: dao.name.clone(),
                    scope: dao.scope.clone(),
                });
            }
        }

        let mut l_entities = self.l_entities;
        l_entities.sort_by(|a, b| {
            a.simple_name
                .cmp(&b.simple_name)
                .then_with(|| a.scope.cmp(&b.scope))
        });

        debug!(
            n_entities = l_entities.len(),
            n_data_access = self.l_data_access.len(),
            "entity registry built"
        );

        Ok(EntityRegistry {
            l_entities,
            l_data_access: self.l_data_access,
        })
    }
}

/// Registered entities and data-access objects.
///
/// Immutable after [`EntityRegistryBuilder::build`]; share it by reference.
#[derive(Debug)]
pub struct EntityRegistry {
    l_entities: Vec<EntityDescriptor>,
    l_data_access: Vec<DataAccessDescriptor>,
}

impl EntityRegistry {
    /// Start a new registry.
    pub fn builder() -> EntityRegistryBuilder {
        EntityRegistryBuilder::default()
    }

    /// Entities inside `entity_scope`, sorted by simple name.
    pub fn resolve_entity_descriptors(&self, entity_scope: &str) -> Vec<&EntityDescriptor> {
        self.l_entities
            .iter()
            .filter(|entity| is_within_scope(entity_scope, &entity.scope))
            .collect()
    }

    /// The single data-access object inside `dao_scope` that targets `entity`.
    pub fn resolve_data_access_descriptor(
        &self,
        entity: &EntityDescriptor,
        dao_scope: &str,
    ) -> Result<&DataAccessDescriptor, ResolveError> {
        let l_candidates: Vec<&DataAccessDescriptor> = self
            .l_data_access
            .iter()
            .filter(|dao| is_within_scope(dao_scope, &dao.scope) && dao.targets(entity))
            .collect();

        match l_candidates.as_slice() {
            [dao] => Ok(*dao),
            [] => Err(ResolveError::DataAccessNotFound {
                entity: entity.simple_name.clone(),
                dao_scope: dao_scope.to_string(),
            }),
            _ => Err(ResolveError::DataAccessAmbiguous {
                entity: entity.simple_name.clone(),
                dao_scope: dao_scope.to_string(),
                candidates: l_candidates
                    .iter()
                    .map(|dao| format!("{}.{}", dao.scope, dao.name))
                    .collect(),
            }),
        }
    }

    /// Number of registered entities.
    pub fn entity_count(&self) -> usize {
        self.l_entities.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{
        AuditLog, AuditLogRepository, Customer, CustomerRepository, Invoice, Product,
        ProductArchiveRepository, ProductRepository,
    };

    fn build_registry() -> EntityRegistry {
        EntityRegistry::builder()
            .register_entity::<Product>("shop.entity")
            .register_entity::<Customer>("shop.entity")
            .register_entity::<AuditLog>("shop.entity.audit")
            .register_entity::<Invoice>("billing.entity")
            .register_repository("shop.repository", ProductRepository::sample())
            .register_repository("shop.repository", CustomerRepository::default())
            .register_repository("shop.repository.audit", AuditLogRepository::default())
            .register_repository("legacy.repository", ProductArchiveRepository::default())
            .build()
            .expect("registry")
    }

    #[test]
    fn resolve_entity_descriptors_sorts_by_name_within_scope() {
        let registry = build_registry();

        let l_names: Vec<&str> = registry
            .resolve_entity_descriptors("shop.entity")
            .iter()
            .map(|entity| entity.simple_name.as_str())
            .collect();
        assert_eq!(l_names, vec!["AuditLog", "Customer", "Product"]);

        assert_eq!(registry.resolve_entity_descriptors("").len(), 4);
        assert_eq!(registry.entity_count(), 4);
        assert!(registry.resolve_entity_descriptors("shop.ent").is_empty());
    }

    #[test]
    fn resolve_entity_descriptors_is_stable_across_scopes_and_calls() {
        let registry = build_registry();

        let first = registry.resolve_entity_descriptors("billing.entity");
        let _ = registry.resolve_entity_descriptors("shop.entity");
        let second = registry.resolve_entity_descriptors("billing.entity");
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].simple_name, second[0].simple_name);
    }

    #[test]
    fn resolve_data_access_descriptor_finds_the_matching_repository() {
        let registry = build_registry();
        let l_entities = registry.resolve_entity_descriptors("shop.entity");
        let product = l_entities
            .iter()
            .find(|entity| entity.simple_name == "Product")
            .expect("product");

        let dao = registry
            .resolve_data_access_descriptor(product, "shop.repository")
            .expect("resolve");
        assert_eq!(dao.name, "ProductRepository");
    }

    #[test]
    fn resolve_data_access_descriptor_reports_not_found() {
        let registry = build_registry();
        let l_entities = registry.resolve_entity_descriptors("billing.entity");

        let err = registry
            .resolve_data_access_descriptor(l_entities[0], "shop.repository")
            .expect_err("no invoice repository");
        assert!(matches!(
            err,
            ResolveError::DataAccessNotFound { ref entity, .. } if entity == "Invoice"
        ));
    }

    #[test]
    fn resolve_data_access_descriptor_rejects_ambiguous_matches() {
        let registry = build_registry();
        let l_entities = registry.resolve_entity_descriptors("shop.entity");
        let product = l_entities
            .iter()
            .find(|entity| entity.simple_name == "Product")
            .expect("product");

        let err = registry
            .resolve_data_access_descriptor(product, "")
            .expect_err("two product repositories");
        let ResolveError::DataAccessAmbiguous { candidates, .. } = err else {
            panic!("expected ambiguity, got {err:?}");
        };
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn build_rejects_duplicate_entity_registration() {
        let err = EntityRegistry::builder()
            .register_entity::<Product>("shop.entity")
            .register_entity::<Product>("other.entity")
            .build()
            .expect_err("duplicate entity");
        assert!(matches!(err, RegistryError::DuplicateEntity { .. }));
    }

    #[test]
    fn build_rejects_duplicate_repository_names_in_one_scope() {
        let err = EntityRegistry::builder()
            .register_repository("shop.repository", CustomerRepository::default())
            .register_repository("shop.repository", CustomerRepository::default())
            .build()
            .expect_err("duplicate repository");
        assert!(matches!(err, RegistryError::DuplicateDataAccess { .. }));
    }
}
