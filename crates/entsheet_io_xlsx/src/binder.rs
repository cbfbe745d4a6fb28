//! Field name -> accessor binding for one entity.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::ExportError;
use crate::schema::{DynFieldAccessor, EntityDescriptor, FieldDescriptor};

/// Accessors bound for one entity, keyed by declared field name.
#[derive(Clone, Default)]
pub struct SpecAccessorMap {
    c_entity_name: String,
    dict_accessors: BTreeMap<String, DynFieldAccessor>,
}

impl SpecAccessorMap {
    /// Accessor for `field_name`, failing when the field was left unbound.
    pub fn require(&self, field_name: &str) -> Result<&DynFieldAccessor, ExportError> {
        self.dict_accessors
            .get(field_name)
            .ok_or_else(|| ExportError::AccessorMissing {
                entity: self.c_entity_name.clone(),
                field: field_name.to_string(),
            })
    }

    /// Simple name of the bound entity.
    pub fn entity_name(&self) -> &str {
        &self.c_entity_name
    }

    /// Whether `field_name` has a bound accessor.
    pub fn contains(&self, field_name: &str) -> bool {
        self.dict_accessors.contains_key(field_name)
    }

    /// Number of bound accessors.
    pub fn len(&self) -> usize {
        self.dict_accessors.len()
    }

    /// Whether no accessor is bound.
    pub fn is_empty(&self) -> bool {
        self.dict_accessors.is_empty()
    }
}

impl std::fmt::Debug for SpecAccessorMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecAccessorMap")
            .field("entity", &self.c_entity_name)
            .field("fields", &self.dict_accessors.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Bind the read accessor of every field in `fields` that has one.
///
/// Fields without an accessor are left out of the map; [`SpecAccessorMap::require`]
/// reports them when a row writer asks for them.
pub fn bind_accessors(fields: &[FieldDescriptor], entity: &EntityDescriptor) -> SpecAccessorMap {
    let mut dict_accessors = BTreeMap::new();
    for field in fields {
        match field.accessor() {
            Some(accessor) => {
                dict_accessors.insert(field.name.clone(), accessor.clone());
            }
            None => debug!(
                entity = %entity.simple_name,
                field = %field.name,
                "field has no accessor; omitted from binding"
            ),
        }
    }

    SpecAccessorMap {
        c_entity_name: entity.simple_name.clone(),
        dict_accessors,
    }
}
