//! Entity schema, field values and the repository seam implemented by hosts.
//!
//! Hosts describe each exported type once through [`Entity`] and expose its
//! records through [`EntityRepository`]. The registry erases both into
//! [`EntityDescriptor`] / [`DataAccessDescriptor`] so one export loop can walk
//! heterogeneous entity types.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{AccessorError, RepositoryError};
use crate::util::derive_simple_type_name;

////////////////////////////////////////////////////////////////////////////////
// #region FieldValue

/// Typed result of reading one field from one record.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumFieldValue {
    /// Absent value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Integer(i64),
    /// Floating point value.
    Decimal(f64),
    /// Text value.
    Text(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Timestamp without zone.
    DateTime(NaiveDateTime),
}

impl EnumFieldValue {
    /// Whether the value is [`EnumFieldValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for EnumFieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(val) => write!(f, "{val}"),
            Self::Integer(val) => write!(f, "{val}"),
            Self::Decimal(val) => write!(f, "{val}"),
            Self::Text(val) => f.write_str(val),
            Self::Date(val) => write!(f, "{}", val.format("%Y-%m-%d")),
            Self::DateTime(val) => write!(f, "{}", val.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

impl From<bool> for EnumFieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for EnumFieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<i64> for EnumFieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for EnumFieldValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for EnumFieldValue {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl From<&str> for EnumFieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for EnumFieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDate> for EnumFieldValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveDateTime> for EnumFieldValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl<T: Into<EnumFieldValue>> From<Option<T>> for EnumFieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region EntitySchema

type FieldAccessor<E> = Box<dyn Fn(&E) -> Result<EnumFieldValue, AccessorError> + Send + Sync>;

/// Type-erased read accessor bound to one field.
pub type DynFieldAccessor =
    Arc<dyn Fn(&dyn Any) -> Result<EnumFieldValue, AccessorError> + Send + Sync>;

/// Type-erased record returned by a repository query.
pub type DynRecord = Box<dyn Any + Send>;

/// One declared field of entity `E`.
pub struct SpecField<E> {
    name: String,
    accessor: Option<FieldAccessor<E>>,
}

impl<E> SpecField<E> {
    /// Field read by an infallible accessor.
    pub fn new<F, V>(name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&E) -> V + Send + Sync + 'static,
        V: Into<EnumFieldValue>,
    {
        Self {
            name: name.into(),
            accessor: Some(Box::new(move |record: &E| Ok(accessor(record).into()))),
        }
    }

    /// Field read by an accessor that may fail (lazy relations, decoding, ...).
    pub fn fallible<F>(name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&E) -> Result<EnumFieldValue, AccessorError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            accessor: Some(Box::new(accessor)),
        }
    }

    /// Declared field without a readable accessor.
    ///
    /// The binder omits it; exporting a record of this entity then fails.
    pub fn opaque(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            accessor: None,
        }
    }

    /// Declared field name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<E> fmt::Debug for SpecField<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecField")
            .field("name", &self.name)
            .field("has_accessor", &self.accessor.is_some())
            .finish()
    }
}

/// A persistent record type that can be exported as one sheet.
pub trait Entity: Send + Sync + 'static {
    /// Simple type name; the sheet name is its normalized form.
    fn entity_name() -> &'static str
    where
        Self: Sized,
    {
        derive_simple_type_name(type_name::<Self>())
    }

    /// Declared fields in column order.
    fn entity_fields() -> Vec<SpecField<Self>>
    where
        Self: Sized;
}

/// Registered field: name plus optional erased accessor.
#[derive(Clone)]
pub struct FieldDescriptor {
    /// Declared field name (identifier form).
    pub name: String,
    accessor: Option<DynFieldAccessor>,
}

impl FieldDescriptor {
    fn from_spec<E: Entity>(field: SpecField<E>) -> Self {
        let SpecField { name, accessor } = field;
        let accessor = accessor.map(|accessor| -> DynFieldAccessor {
            Arc::new(move |record: &dyn Any| {
                let record = record
                    .downcast_ref::<E>()
                    .ok_or(AccessorError::TypeMismatch {
                        expected: type_name::<E>(),
                    })?;
                accessor(record)
            })
        });
        Self { name, accessor }
    }

    /// Bound accessor, if the field has one.
    pub fn accessor(&self) -> Option<&DynFieldAccessor> {
        self.accessor.as_ref()
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("has_accessor", &self.accessor.is_some())
            .finish()
    }
}

/// Registered entity type.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    /// Simple type name.
    pub simple_name: String,
    /// Namespace scope the entity was registered under.
    pub scope: String,
    /// Declared fields in column order.
    pub fields: Vec<FieldDescriptor>,
    type_id: TypeId,
}

impl EntityDescriptor {
    /// Describe entity `E` registered under `scope`.
    pub fn of<E: Entity>(scope: impl Into<String>) -> Self {
        Self {
            simple_name: E::entity_name().to_string(),
            scope: scope.into(),
            fields: E::entity_fields()
                .into_iter()
                .map(FieldDescriptor::from_spec)
                .collect(),
            type_id: TypeId::of::<E>(),
        }
    }

    /// Runtime identity of the entity type.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Declared field names in column order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DataAccess

/// Typed query surface of one entity's repository.
pub trait EntityRepository: Send + Sync + 'static {
    /// Entity type this repository serves.
    type Entity: Entity;

    /// Every record, in repository order.
    fn find_all(&self) -> Result<Vec<Self::Entity>, RepositoryError>;

    /// Records whose creation timestamp lies between `from` and `until`.
    fn find_created_between(
        &self,
        from: NaiveDateTime,
        until: NaiveDateTime,
    ) -> Result<Vec<Self::Entity>, RepositoryError>;
}

/// Query issued against a resolved repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumRecordQuery {
    /// `find_all`.
    All,
    /// `find_created_between`.
    CreatedBetween {
        /// Lower bound.
        from: NaiveDateTime,
        /// Upper bound.
        until: NaiveDateTime,
    },
}

impl EnumRecordQuery {
    /// Repository method name, used in errors and logs.
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::All => "find_all",
            Self::CreatedBetween { .. } => "find_created_between",
        }
    }
}

trait DynRepository: Send + Sync {
    fn query(&self, query: &EnumRecordQuery) -> Result<Vec<DynRecord>, RepositoryError>;
}

struct RepositoryAdapter<R>(R);

impl<R: EntityRepository> DynRepository for RepositoryAdapter<R> {
    fn query(&self, query: &EnumRecordQuery) -> Result<Vec<DynRecord>, RepositoryError> {
        let l_records = match query {
            EnumRecordQuery::All => self.0.find_all()?,
            EnumRecordQuery::CreatedBetween { from, until } => {
                self.0.find_created_between(*from, *until)?
            }
        };
        Ok(l_records
            .into_iter()
            .map(|record| Box::new(record) as DynRecord)
            .collect())
    }
}

/// Registered data-access object bound to one entity type.
#[derive(Clone)]
pub struct DataAccessDescriptor {
    /// Data-access object name (simple type name of the repository).
    pub name: String,
    /// Namespace scope the repository was registered under.
    pub scope: String,
    /// Simple name of the target entity.
    pub target_name: String,
    target: TypeId,
    repository: Arc<dyn DynRepository>,
}

impl DataAccessDescriptor {
    /// Describe `repository` registered under `scope`.
    pub fn of<R: EntityRepository>(scope: impl Into<String>, repository: R) -> Self {
        Self {
            name: derive_simple_type_name(type_name::<R>()).to_string(),
            scope: scope.into(),
            target_name: R::Entity::entity_name().to_string(),
            target: TypeId::of::<R::Entity>(),
            repository: Arc::new(RepositoryAdapter(repository)),
        }
    }

    /// Whether this data-access object serves `entity`.
    pub fn targets(&self, entity: &EntityDescriptor) -> bool {
        self.target == entity.type_id()
    }

    /// Run `query` against the live repository.
    pub fn query(&self, query: &EnumRecordQuery) -> Result<Vec<DynRecord>, RepositoryError> {
        self.repository.query(query)
    }
}

impl fmt::Debug for DataAccessDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataAccessDescriptor")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .field("target_name", &self.target_name)
            .finish()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
