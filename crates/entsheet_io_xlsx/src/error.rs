//! Error types for registry construction, resolution and export.

use chrono::NaiveDateTime;
use rust_xlsxwriter::XlsxError;
use thiserror::Error;

/// Boxed error returned by host repositories.
pub type RepositoryError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Registry construction failures.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The same entity type was registered twice.
    #[error("entity {entity} registered more than once (scopes {scope_first:?} and {scope_second:?})")]
    DuplicateEntity {
        entity: String,
        scope_first: String,
        scope_second: String,
    },

    /// Two data-access objects share one name inside one scope.
    #[error("data-access object {name} registered more than once in scope {scope:?}")]
    DuplicateDataAccess { name: String, scope: String },
}

/// Data-access resolution failures.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No data-access object in scope targets the entity.
    #[error("no data-access object in scope {dao_scope:?} targets entity {entity}")]
    DataAccessNotFound { entity: String, dao_scope: String },

    /// More than one data-access object in scope targets the entity.
    #[error("data-access objects {candidates:?} in scope {dao_scope:?} all target entity {entity}")]
    DataAccessAmbiguous {
        entity: String,
        dao_scope: String,
        candidates: Vec<String>,
    },
}

/// Field accessor failures.
#[derive(Debug, Error)]
pub enum AccessorError {
    /// The record handed to the accessor is not an instance of the entity type.
    #[error("record is not an instance of {expected}")]
    TypeMismatch { expected: &'static str },

    /// The accessor itself reported a failure.
    #[error("{0}")]
    Failed(String),
}

/// Export failures. Every variant aborts the whole workbook.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Data-access resolution failed for one entity.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A declared field has no bound accessor.
    #[error("entity {entity} has no accessor for field {field:?}")]
    AccessorMissing { entity: String, field: String },

    /// A field accessor failed on a record.
    #[error("failed to read field {field:?} of entity {entity}: {source}")]
    Accessor {
        entity: String,
        field: String,
        #[source]
        source: AccessorError,
    },

    /// A repository query failed.
    #[error("failed to invoke `{query}` of {data_access}: {source}")]
    Query {
        data_access: String,
        query: &'static str,
        #[source]
        source: RepositoryError,
    },

    /// The sheet would exceed Excel's row limit.
    #[error("sheet {sheet:?} needs {rows} rows; Excel allows at most {max}")]
    RowLimitExceeded {
        sheet: String,
        rows: usize,
        max: usize,
    },

    /// The sheet would exceed Excel's column limit.
    #[error("sheet {sheet:?} needs {cols} columns; Excel allows at most {max}")]
    ColumnLimitExceeded {
        sheet: String,
        cols: usize,
        max: usize,
    },

    /// Validation range lower bound is after the upper bound.
    #[error("invalid date range: from {from} is after until {until}")]
    InvalidDateRange {
        from: NaiveDateTime,
        until: NaiveDateTime,
    },

    /// Export options failed validation.
    #[error("invalid export options: {0}")]
    InvalidOptions(String),

    /// A row/column index does not fit the worksheet index type.
    #[error("{axis} index overflow: {value}")]
    IndexOverflow { axis: &'static str, value: usize },

    /// The workbook sink rejected a write or failed to serialize.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] XlsxError),
}
