//! Shared export specification models: formats, options, requests, reports.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::conf::{C_SEP_MISSING_NAMES, derive_default_export_formats};
use crate::error::ExportError;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification, converted to `rust_xlsxwriter::Format` at write time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Text wrap.
    pub text_wrap: Option<bool>,

    /// Top border override.
    pub top: Option<i64>,
    /// Bottom border override.
    pub bottom: Option<i64>,
    /// Left border override.
    pub left: Option<i64>,
    /// Right border override.
    pub right: Option<i64>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color (`#RRGGBB`).
    pub bg_color: Option<String>,
    /// Font color (`#RRGGBB`).
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
            top: other.top.or(self.top),
            bottom: other.bottom.or(self.bottom),
            left: other.left.or(self.left),
            right: other.right.or(self.right),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }
}

/// Normalized cell value handed to the worksheet.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
    /// Boolean value.
    Boolean(bool),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExportOptions

/// Placement of the three validation report columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumReportColumnsPosition {
    /// Report columns occupy columns 0..3, entity fields follow (default).
    #[default]
    Leading,
    /// Report columns follow the last entity field column.
    Trailing,
}

/// Autofit rule for report column width inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumAutofitColumnsRule {
    /// Disable autofit.
    None,
    /// Infer width from header cells only.
    Header,
    /// Infer width from body cells only.
    Body,
    /// Infer width from both header and body cells (default).
    #[default]
    All,
}

/// Autofit policy applied to the validation report columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecAutofitCellsPolicy {
    /// Autofit width inference rule.
    pub rule_columns: EnumAutofitColumnsRule,
    /// Max body rows inspected when body-based inference is active.
    pub height_body_inferred_max: Option<usize>,
    /// Minimum final width.
    pub width_cell_min: usize,
    /// Maximum final width.
    pub width_cell_max: usize,
    /// Width padding added after inference.
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            rule_columns: EnumAutofitColumnsRule::All,
            height_body_inferred_max: Some(20_000),
            width_cell_min: 8,
            width_cell_max: 80,
            width_cell_padding: 2,
        }
    }
}

/// Export-wide options: formats, report layout and value rendering.
///
/// Loadable from any serde format; absent keys fall back to [`Default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecExportOptions {
    /// Header row format.
    pub fmt_header: SpecCellFormat,
    /// Body cell format.
    pub fmt_text: SpecCellFormat,
    /// Format marking missing values in validation sheets.
    pub fmt_missing: SpecCellFormat,
    /// Format of the non-missing percentage column.
    pub fmt_percentage: SpecCellFormat,
    /// Placement of validation report columns.
    pub rule_report_columns: EnumReportColumnsPosition,
    /// Width policy for validation report columns.
    pub policy_autofit: SpecAutofitCellsPolicy,
    /// Freeze the pane below the header row.
    pub if_freeze_header: bool,
    /// Write integers/decimals/booleans as typed cells instead of text.
    pub if_write_typed_values: bool,
    /// Separator between missing column names.
    pub missing_names_separator: String,
}

impl Default for SpecExportOptions {
    fn default() -> Self {
        let (fmt_header, fmt_text, fmt_missing, fmt_percentage) = derive_default_export_formats();
        Self {
            fmt_header,
            fmt_text,
            fmt_missing,
            fmt_percentage,
            rule_report_columns: EnumReportColumnsPosition::Leading,
            policy_autofit: SpecAutofitCellsPolicy::default(),
            if_freeze_header: true,
            if_write_typed_values: false,
            missing_names_separator: C_SEP_MISSING_NAMES.to_string(),
        }
    }
}

impl SpecExportOptions {
    /// Check option bounds before any workbook work starts.
    pub fn validate(&self) -> Result<(), ExportError> {
        let policy = &self.policy_autofit;
        if policy.width_cell_min == 0 {
            return Err(ExportError::InvalidOptions(
                "policy_autofit.width_cell_min must be >= 1.".to_string(),
            ));
        }
        if policy.width_cell_max < policy.width_cell_min {
            return Err(ExportError::InvalidOptions(
                "policy_autofit.width_cell_max must be >= policy_autofit.width_cell_min."
                    .to_string(),
            ));
        }
        if policy.width_cell_max > 255 {
            return Err(ExportError::InvalidOptions(
                "policy_autofit.width_cell_max must be <= 255.".to_string(),
            ));
        }
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExportRequest

/// Which records are queried and whether report columns are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumExportMode {
    /// Every record, plain sheets.
    All,
    /// Records created within `[from, until]` (bounds per repository), with report columns.
    Validation {
        /// Lower creation timestamp bound.
        from: NaiveDateTime,
        /// Upper creation timestamp bound.
        until: NaiveDateTime,
    },
}

impl EnumExportMode {
    /// Whether this mode writes validation report columns.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// One export call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExportRequest {
    /// Namespace scope of exported entities.
    pub entity_scope: String,
    /// Namespace scope searched for data-access objects.
    pub dao_scope: String,
    /// Query/report mode.
    pub mode: EnumExportMode,
}

impl SpecExportRequest {
    /// Request for every record of every entity in scope.
    pub fn all(entity_scope: impl Into<String>, dao_scope: impl Into<String>) -> Self {
        Self {
            entity_scope: entity_scope.into(),
            dao_scope: dao_scope.into(),
            mode: EnumExportMode::All,
        }
    }

    /// Request for records created in a date range, with validation columns.
    pub fn validation(
        entity_scope: impl Into<String>,
        dao_scope: impl Into<String>,
        from: NaiveDateTime,
        until: NaiveDateTime,
    ) -> Self {
        Self {
            entity_scope: entity_scope.into(),
            dao_scope: dao_scope.into(),
            mode: EnumExportMode::Validation { from, until },
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Summary of one written entity sheet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecSheetReport {
    /// Actual unique sheet name in workbook.
    pub sheet_name: String,
    /// Simple name of the exported entity.
    pub entity_name: String,
    /// Content rows written (header excluded).
    pub n_rows: usize,
    /// Declared field count.
    pub n_fields: usize,
    /// Missing cells found (validation mode only).
    pub n_cells_missing: usize,
    /// Rows with at least one missing cell (validation mode only).
    pub n_rows_incomplete: usize,
}

/// Per-export report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecExportReport {
    /// Sheets in workbook order.
    pub sheets: Vec<SpecSheetReport>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecExportReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }

    /// Total content rows across sheets.
    pub fn n_rows_total(&self) -> usize {
        self.sheets.iter().map(|sheet| sheet.n_rows).sum()
    }
}

/// Workbook bytes plus the report describing them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExportOutput {
    /// Serialized XLSX workbook.
    pub bytes: Vec<u8>,
    /// Sheet summaries and warnings.
    pub report: SpecExportReport,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
