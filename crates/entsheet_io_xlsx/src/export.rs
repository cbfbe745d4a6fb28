//! Export entry points: resolve, query and write every entity in scope.

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::binder::bind_accessors;
use crate::error::ExportError;
use crate::registry::EntityRegistry;
use crate::schema::{DataAccessDescriptor, EntityDescriptor, EnumRecordQuery};
use crate::spec::{EnumExportMode, SpecExportOptions, SpecExportOutput, SpecExportRequest};
use crate::writer::XlsxEntityWriter;

/// Workbook exporter over one registry.
///
/// Each call builds an independent in-memory workbook; concurrent calls share
/// only the immutable registry.
#[derive(Debug, Clone)]
pub struct EntityExporter<'a> {
    registry: &'a EntityRegistry,
    export_options: SpecExportOptions,
}

impl<'a> EntityExporter<'a> {
    /// Exporter with default options.
    pub fn new(registry: &'a EntityRegistry) -> Self {
        Self {
            registry,
            export_options: SpecExportOptions::default(),
        }
    }

    /// Replace export options.
    pub fn with_options(mut self, export_options: SpecExportOptions) -> Self {
        self.export_options = export_options;
        self
    }

    /// Export every record of every entity in `entity_scope`, one plain sheet per entity.
    pub fn export_all(&self, entity_scope: &str, dao_scope: &str) -> Result<Vec<u8>, ExportError> {
        let output = self.run(&SpecExportRequest::all(entity_scope, dao_scope))?;
        Ok(output.bytes)
    }

    /// Export records created in `[from, until]` with missing cells styled and
    /// per-row report columns.
    pub fn export_with_validation(
        &self,
        entity_scope: &str,
        dao_scope: &str,
        from: NaiveDateTime,
        until: NaiveDateTime,
    ) -> Result<Vec<u8>, ExportError> {
        let output = self.run(&SpecExportRequest::validation(
            entity_scope,
            dao_scope,
            from,
            until,
        ))?;
        Ok(output.bytes)
    }

    /// Run one export request and return workbook bytes plus report.
    ///
    /// Every entity's data-access object is resolved before any sheet is written,
    /// so resolution failures never produce a partial workbook.
    pub fn run(&self, request: &SpecExportRequest) -> Result<SpecExportOutput, ExportError> {
        self.export_options.validate()?;
        let query = derive_record_query(&request.mode)?;

        let l_plan = self.plan_export(&request.entity_scope, &request.dao_scope)?;
        info!(
            entity_scope = %request.entity_scope,
            dao_scope = %request.dao_scope,
            query = query.method_name(),
            n_entities = l_plan.len(),
            n_entities_registered = self.registry.entity_count(),
            "export started"
        );

        let mut writer = XlsxEntityWriter::new(self.export_options.clone())?;
        for (entity, dao) in l_plan {
            let accessors = bind_accessors(&entity.fields, entity);
            let l_records = dao
                .query(&query)
                .map_err(|source| ExportError::Query {
                    data_access: dao.name.clone(),
                    query: query.method_name(),
                    source,
                })?;
            debug!(
                entity = %entity.simple_name,
                data_access = %dao.name,
                n_records = l_records.len(),
                "records fetched"
            );
            writer.write_entity_sheet(entity, &accessors, &l_records, request.mode.is_validation())?;
        }

        let output = writer.save_to_buffer()?;
        info!(
            n_sheets = output.report.sheets.len(),
            n_rows = output.report.n_rows_total(),
            n_warnings = output.report.warnings.len(),
            n_bytes = output.bytes.len(),
            "export finished"
        );
        Ok(output)
    }

    fn plan_export(
        &self,
        entity_scope: &str,
        dao_scope: &str,
    ) -> Result<Vec<(&'a EntityDescriptor, &'a DataAccessDescriptor)>, ExportError> {
        let registry: &'a EntityRegistry = self.registry;
        registry
            .resolve_entity_descriptors(entity_scope)
            .into_iter()
            .map(|entity| {
                let dao = registry.resolve_data_access_descriptor(entity, dao_scope)?;
                Ok((entity, dao))
            })
            .collect()
    }
}

/// Map an export mode onto its repository query, checking the date range.
pub fn derive_record_query(mode: &EnumExportMode) -> Result<EnumRecordQuery, ExportError> {
    match *mode {
        EnumExportMode::All => Ok(EnumRecordQuery::All),
        EnumExportMode::Validation { from, until } => {
            if from > until {
                return Err(ExportError::InvalidDateRange { from, until });
            }
            Ok(EnumRecordQuery::CreatedBetween { from, until })
        }
    }
}
