//! XLSX writer kernel: one sheet per entity, plain or with validation columns.

use std::collections::BTreeSet;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use tracing::{debug, warn};

use crate::binder::SpecAccessorMap;
use crate::conf::{N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_REPORT_HEADERS};
use crate::error::ExportError;
use crate::schema::{DynRecord, EntityDescriptor, EnumFieldValue};
use crate::spec::{
    EnumAutofitColumnsRule, EnumCellValue, SpecAutofitCellsPolicy, SpecCellFormat,
    SpecExportOptions, SpecExportOutput, SpecExportReport, SpecSheetReport,
};
use crate::util::{
    cast_col_num, cast_row_num, create_sheet_identifier, estimate_unicode_string_width,
    normalize_name, sanitize_sheet_name,
};
use crate::validate::{SpecRowValidation, plan_row_validation, plan_sheet_layout};

/// Body formats and value rendering switches shared by the row writers.
pub struct SpecSheetFormats<'a> {
    /// Body cell format.
    pub fmt_text: &'a Format,
    /// Missing cell format.
    pub fmt_missing: &'a Format,
    /// Percentage report cell format.
    pub fmt_percentage: &'a Format,
    /// Write numbers/booleans as typed cells.
    pub if_write_typed_values: bool,
    /// Separator between missing column names.
    pub missing_names_separator: &'a str,
}

/// Counters gathered while writing validated rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpecValidatedRowsSummary {
    /// Rows written.
    pub n_rows: usize,
    /// Missing cells across rows.
    pub n_cells_missing: usize,
    /// Rows with at least one missing cell.
    pub n_rows_incomplete: usize,
}

/// Stateful workbook writer.
///
/// The workbook is buffered in memory until [`Self::save_to_buffer`] is called.
pub struct XlsxEntityWriter {
    workbook: Workbook,
    fmt_header: Format,
    fmt_text: Format,
    fmt_missing: Format,
    fmt_percentage: Format,
    export_options: SpecExportOptions,
    set_sheet_names_existing: BTreeSet<String>,
    report: SpecExportReport,
}

impl XlsxEntityWriter {
    /// Create writer with validated format/options presets.
    pub fn new(export_options: SpecExportOptions) -> Result<Self, ExportError> {
        export_options.validate()?;
        Ok(Self {
            workbook: Workbook::new(),
            fmt_header: derive_rust_xlsx_format(&export_options.fmt_header),
            fmt_text: derive_rust_xlsx_format(&export_options.fmt_text),
            fmt_missing: derive_rust_xlsx_format(&export_options.fmt_missing),
            fmt_percentage: derive_rust_xlsx_format(&export_options.fmt_percentage),
            export_options,
            set_sheet_names_existing: BTreeSet::new(),
            report: SpecExportReport::default(),
        })
    }

    /// Return the report accumulated so far.
    pub fn report(&self) -> &SpecExportReport {
        &self.report
    }

    /// Serialize the workbook and hand back bytes plus report.
    pub fn save_to_buffer(mut self) -> Result<SpecExportOutput, ExportError> {
        let bytes = self.workbook.save_to_buffer()?;
        Ok(SpecExportOutput {
            bytes,
            report: self.report,
        })
    }

    /// Write one entity sheet: header row plus one row per record.
    ///
    /// With `if_validate`, missing cells are styled and the three report
    /// columns are written next to the entity columns.
    pub fn write_entity_sheet(
        &mut self,
        entity: &EntityDescriptor,
        accessors: &SpecAccessorMap,
        records: &[DynRecord],
        if_validate: bool,
    ) -> Result<(), ExportError> {
        let l_field_names = entity.field_names();
        let c_sheet_name_base = sanitize_sheet_name(&normalize_name(&entity.simple_name), "_");

        let n_rows_total = records.len() + 1;
        if n_rows_total > N_NROWS_EXCEL_MAX {
            return Err(ExportError::RowLimitExceeded {
                sheet: c_sheet_name_base,
                rows: n_rows_total,
                max: N_NROWS_EXCEL_MAX,
            });
        }
        let layout = plan_sheet_layout(
            l_field_names.len(),
            self.export_options.rule_report_columns,
        );
        let n_cols_total = if if_validate {
            layout.width_total
        } else {
            l_field_names.len()
        };
        if n_cols_total > N_NCOLS_EXCEL_MAX {
            return Err(ExportError::ColumnLimitExceeded {
                sheet: c_sheet_name_base,
                cols: n_cols_total,
                max: N_NCOLS_EXCEL_MAX,
            });
        }

        let sheet_name_unique = self.derive_unique_sheet_name(&c_sheet_name_base);
        if sheet_name_unique != c_sheet_name_base {
            warn!(
                entity = %entity.simple_name,
                sheet = %sheet_name_unique,
                "sheet name already taken; renamed"
            );
            self.report.warn(format!(
                "Sheet name {c_sheet_name_base:?} already used; entity {} written to {sheet_name_unique:?}.",
                entity.simple_name
            ));
        }

        let formats = SpecSheetFormats {
            fmt_text: &self.fmt_text,
            fmt_missing: &self.fmt_missing,
            fmt_percentage: &self.fmt_percentage,
            if_write_typed_values: self.export_options.if_write_typed_values,
            missing_names_separator: &self.export_options.missing_names_separator,
        };

        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&sheet_name_unique)?;

        let mut sheet_report = SpecSheetReport {
            sheet_name: sheet_name_unique,
            entity_name: entity.simple_name.clone(),
            n_fields: l_field_names.len(),
            ..Default::default()
        };

        if if_validate {
            write_header(
                worksheet,
                &l_field_names,
                layout.col_fields_start,
                &self.fmt_header,
            )?;
            write_report_header(worksheet, layout.col_report_start, &self.fmt_header)?;
            let summary = write_validated_rows(
                worksheet,
                &l_field_names,
                accessors,
                records,
                layout.col_fields_start,
                layout.col_report_start,
                &formats,
                &self.export_options.policy_autofit,
            )?;
            sheet_report.n_rows = summary.n_rows;
            sheet_report.n_cells_missing = summary.n_cells_missing;
            sheet_report.n_rows_incomplete = summary.n_rows_incomplete;
        } else {
            write_header(worksheet, &l_field_names, 0, &self.fmt_header)?;
            sheet_report.n_rows =
                write_rows(worksheet, &l_field_names, accessors, records, 0, &formats)?;
        }

        if self.export_options.if_freeze_header {
            worksheet.set_freeze_panes(1, 0)?;
        }

        debug!(
            entity = %entity.simple_name,
            sheet = %sheet_report.sheet_name,
            n_rows = sheet_report.n_rows,
            n_cells_missing = sheet_report.n_cells_missing,
            "entity sheet written"
        );
        self.report.sheets.push(sheet_report);
        Ok(())
    }

    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        let c_key = name.to_lowercase();
        if !self.set_sheet_names_existing.contains(&c_key) {
            self.set_sheet_names_existing.insert(c_key);
            return name.to_string();
        }

        let mut n_idx = 2usize;
        loop {
            let candidate = create_sheet_identifier(name, n_idx);
            debug_assert!(candidate.chars().count() <= N_LEN_EXCEL_SHEET_NAME_MAX);
            let c_key = candidate.to_lowercase();
            if !self.set_sheet_names_existing.contains(&c_key) {
                self.set_sheet_names_existing.insert(c_key);
                return candidate;
            }
            n_idx += 1;
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// #region SheetWriter

/// Write normalized `field_names` into row 0 starting at `col_start`.
///
/// Header cells outside `col_start..col_start + field_names.len()` are left untouched.
pub fn write_header(
    worksheet: &mut Worksheet,
    field_names: &[&str],
    col_start: usize,
    fmt_header: &Format,
) -> Result<(), ExportError> {
    for (n_idx, c_name) in field_names.iter().enumerate() {
        worksheet.write_string_with_format(
            0,
            cast_col_num(col_start + n_idx)?,
            normalize_name(c_name),
            fmt_header,
        )?;
    }
    Ok(())
}

/// Write one row per record (rows 1..=N); `Null` values leave the cell unset.
///
/// Returns the number of rows written.
pub fn write_rows(
    worksheet: &mut Worksheet,
    field_names: &[&str],
    accessors: &SpecAccessorMap,
    records: &[DynRecord],
    col_start: usize,
    formats: &SpecSheetFormats<'_>,
) -> Result<usize, ExportError> {
    for (n_idx_record, record) in records.iter().enumerate() {
        let n_row = cast_row_num(n_idx_record + 1)?;
        let l_values = read_record_values(field_names, accessors, record)?;
        for (n_idx_col, value) in l_values.iter().enumerate() {
            if value.is_null() {
                continue;
            }
            write_cell_with_format(
                worksheet,
                n_row,
                cast_col_num(col_start + n_idx_col)?,
                &convert_field_value(value, formats.if_write_typed_values),
                formats.fmt_text,
            )?;
        }
    }
    Ok(records.len())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ValidationWriter

/// Write the three report column labels into row 0 starting at `col_start`.
pub fn write_report_header(
    worksheet: &mut Worksheet,
    col_start: usize,
    fmt_header: &Format,
) -> Result<(), ExportError> {
    for (n_idx, c_label) in TUP_REPORT_HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(
            0,
            cast_col_num(col_start + n_idx)?,
            *c_label,
            fmt_header,
        )?;
    }
    Ok(())
}

/// Write one validated row per record plus its report cells, then size the report columns.
#[allow(clippy::too_many_arguments)]
pub fn write_validated_rows(
    worksheet: &mut Worksheet,
    field_names: &[&str],
    accessors: &SpecAccessorMap,
    records: &[DynRecord],
    col_fields_start: usize,
    col_report_start: usize,
    formats: &SpecSheetFormats<'_>,
    policy_autofit: &SpecAutofitCellsPolicy,
) -> Result<SpecValidatedRowsSummary, ExportError> {
    let rule = policy_autofit.rule_columns;
    let mut l_width_by_col = [0usize; TUP_REPORT_HEADERS.len()];
    if matches!(rule, EnumAutofitColumnsRule::Header | EnumAutofitColumnsRule::All) {
        for (n_idx, c_label) in TUP_REPORT_HEADERS.iter().enumerate() {
            l_width_by_col[n_idx] = estimate_unicode_string_width(c_label);
        }
    }
    let n_rows_body_inferred_max = policy_autofit
        .height_body_inferred_max
        .unwrap_or(usize::MAX);

    let mut summary = SpecValidatedRowsSummary::default();
    for (n_idx_record, record) in records.iter().enumerate() {
        let n_row = cast_row_num(n_idx_record + 1)?;
        let l_values = read_record_values(field_names, accessors, record)?;
        let row_validation = plan_row_validation(field_names, l_values);

        for (n_idx_col, cell) in row_validation.cells.iter().enumerate() {
            let n_col = cast_col_num(col_fields_start + n_idx_col)?;
            if cell.if_missing {
                worksheet.write_blank(n_row, n_col, formats.fmt_missing)?;
            } else {
                write_cell_with_format(
                    worksheet,
                    n_row,
                    n_col,
                    &convert_field_value(&cell.value, formats.if_write_typed_values),
                    formats.fmt_text,
                )?;
            }
        }

        let l_report_texts =
            write_report_cells(worksheet, n_row, col_report_start, &row_validation, formats)?;

        if matches!(rule, EnumAutofitColumnsRule::Body | EnumAutofitColumnsRule::All)
            && n_idx_record < n_rows_body_inferred_max
        {
            for (n_idx, c_text) in l_report_texts.iter().enumerate() {
                l_width_by_col[n_idx] =
                    usize::max(l_width_by_col[n_idx], estimate_unicode_string_width(c_text));
            }
        }

        summary.n_rows += 1;
        summary.n_cells_missing += row_validation.n_missing;
        if row_validation.n_missing > 0 {
            summary.n_rows_incomplete += 1;
        }
    }

    if !matches!(rule, EnumAutofitColumnsRule::None) {
        let n_min = usize::max(1, policy_autofit.width_cell_min);
        let n_max = usize::min(255, usize::max(n_min, policy_autofit.width_cell_max));
        for (n_idx, n_width_recorded) in l_width_by_col.iter().enumerate() {
            let n_width_final = usize::min(
                n_max,
                usize::max(n_min, n_width_recorded + policy_autofit.width_cell_padding),
            );
            worksheet.set_column_width(cast_col_num(col_report_start + n_idx)?, n_width_final as f64)?;
        }
    }

    Ok(summary)
}

/// Write missing count, percentage and missing names; return their display texts.
fn write_report_cells(
    worksheet: &mut Worksheet,
    n_row: u32,
    col_start: usize,
    row_validation: &SpecRowValidation,
    formats: &SpecSheetFormats<'_>,
) -> Result<[String; 3], ExportError> {
    let c_missing_names = row_validation.missing_names_joined(formats.missing_names_separator);

    worksheet.write_number_with_format(
        n_row,
        cast_col_num(col_start)?,
        row_validation.n_missing as f64,
        formats.fmt_text,
    )?;
    worksheet.write_number_with_format(
        n_row,
        cast_col_num(col_start + 1)?,
        row_validation.pct_non_missing,
        formats.fmt_percentage,
    )?;
    if c_missing_names.is_empty() {
        worksheet.write_blank(n_row, cast_col_num(col_start + 2)?, formats.fmt_text)?;
    } else {
        worksheet.write_string_with_format(
            n_row,
            cast_col_num(col_start + 2)?,
            &c_missing_names,
            formats.fmt_text,
        )?;
    }

    Ok([
        row_validation.n_missing.to_string(),
        format!("{:.2}", row_validation.pct_non_missing),
        c_missing_names,
    ])
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellConversion

/// Read every declared field of `record` through its bound accessor.
pub fn read_record_values(
    field_names: &[&str],
    accessors: &SpecAccessorMap,
    record: &DynRecord,
) -> Result<Vec<EnumFieldValue>, ExportError> {
    let mut l_values = Vec::with_capacity(field_names.len());
    for c_name in field_names {
        let accessor = accessors.require(c_name)?;
        let value = accessor(&**record).map_err(|source| ExportError::Accessor {
            entity: accessors.entity_name().to_string(),
            field: c_name.to_string(),
            source,
        })?;
        l_values.push(value);
    }
    Ok(l_values)
}

/// Render a field value as a worksheet cell value.
///
/// Text mode stringifies everything; typed mode keeps finite numbers and booleans native.
pub fn convert_field_value(value: &EnumFieldValue, if_write_typed_values: bool) -> EnumCellValue {
    if value.is_null() {
        return EnumCellValue::None;
    }
    if !if_write_typed_values {
        return EnumCellValue::String(value.to_string());
    }
    match value {
        EnumFieldValue::Bool(val) => EnumCellValue::Boolean(*val),
        EnumFieldValue::Integer(val) => EnumCellValue::Number(*val as f64),
        EnumFieldValue::Decimal(val) if val.is_finite() => EnumCellValue::Number(*val),
        _ => EnumCellValue::String(value.to_string()),
    }
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    n_row: u32,
    n_col: u16,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), ExportError> {
    match value {
        EnumCellValue::None => {
            worksheet.write_blank(n_row, n_col, format)?;
        }
        EnumCellValue::String(val) => {
            worksheet.write_string_with_format(n_row, n_col, val, format)?;
        }
        EnumCellValue::Number(val) => {
            worksheet.write_number_with_format(n_row, n_col, *val, format)?;
        }
        EnumCellValue::Boolean(val) => {
            worksheet.write_boolean_with_format(n_row, n_col, *val, format)?;
        }
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FormatConversion

/// Convert a [`SpecCellFormat`] into a `rust_xlsxwriter` format.
pub fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }

    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if let Some(val) = spec.top {
        format = format.set_border_top(derive_format_border(val));
    }
    if let Some(val) = spec.bottom {
        format = format.set_border_bottom(derive_format_border(val));
    }
    if let Some(val) = spec.left {
        format = format.set_border_left(derive_format_border(val));
    }
    if let Some(val) = spec.right {
        format = format.set_border_right(derive_format_border(val));
    }

    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "justify" => Some(FormatAlign::Justify),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
