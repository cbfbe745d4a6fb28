//! `entsheet_io_xlsx` v1:
//! Entity-to-XLSX export kernel.
//!
//! Hosts register entity types and their repositories once, then export every
//! entity inside a namespace scope as one worksheet, optionally with per-row
//! missing-value validation.
//!
//! Modules:
//! - `conf`     : constants and default presets
//! - `spec`     : specs/models/options
//! - `error`    : error types
//! - `util`     : pure helper functions (name normalization, scopes, casts)
//! - `schema`   : entity schema, field values, repository seam
//! - `registry` : immutable entity/data-access registry
//! - `binder`   : field accessor binding
//! - `validate` : missing-value planning
//! - `writer`   : pure-Rust writer kernel
//! - `export`   : export entry points
pub mod binder;
pub mod conf;
pub mod error;
pub mod export;
pub mod registry;
pub mod schema;
pub mod spec;
pub mod util;
pub mod validate;
pub mod writer;

#[cfg(test)]
mod testkit;

pub use binder::{SpecAccessorMap, bind_accessors};
pub use conf::{
    C_HEADER_MISSING_COUNT, C_HEADER_MISSING_NAMES, C_HEADER_NON_MISSING_PCT,
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
    TUP_REPORT_HEADERS,
};
pub use error::{AccessorError, ExportError, RegistryError, RepositoryError, ResolveError};
pub use export::EntityExporter;
pub use registry::{EntityRegistry, EntityRegistryBuilder};
pub use schema::{
    DataAccessDescriptor, Entity, EntityDescriptor, EntityRepository, EnumFieldValue,
    EnumRecordQuery, FieldDescriptor, SpecField,
};
pub use spec::{
    EnumAutofitColumnsRule, EnumExportMode, EnumReportColumnsPosition, SpecAutofitCellsPolicy,
    SpecCellFormat, SpecExportOptions, SpecExportOutput, SpecExportReport, SpecExportRequest,
    SpecSheetReport,
};
pub use util::{is_within_scope, normalize_name, sanitize_sheet_name};
pub use validate::{calculate_non_missing_percentage, is_missing_value, plan_row_validation};
pub use writer::XlsxEntityWriter;
