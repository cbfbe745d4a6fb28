//! Missing-value detection and per-row completeness figures.

use crate::conf::{N_DECIMALS_PCT, N_REPORT_COLS};
use crate::schema::EnumFieldValue;
use crate::spec::EnumReportColumnsPosition;
use crate::util::{normalize_name, round_to_decimals};

/// One body cell with its missing flag.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecCellPlan {
    /// Accessor result.
    pub value: EnumFieldValue,
    /// Whether the cell is styled as missing.
    pub if_missing: bool,
}

/// Validation outcome of one record.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecRowValidation {
    /// Body cells in field declaration order.
    pub cells: Vec<SpecCellPlan>,
    /// Number of missing fields.
    pub n_missing: usize,
    /// Percentage of non-missing fields, in `[0, 100]`.
    pub pct_non_missing: f64,
    /// Normalized names of missing fields in declaration order.
    pub missing_names: Vec<String>,
}

impl SpecRowValidation {
    /// Missing names joined for the report cell.
    pub fn missing_names_joined(&self, sep: &str) -> String {
        self.missing_names.join(sep)
    }
}

/// Column offsets of one validation sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecSheetLayout {
    /// First report column.
    pub col_report_start: usize,
    /// First entity field column.
    pub col_fields_start: usize,
    /// Total columns used.
    pub width_total: usize,
}

/// `Null`, or text that is empty/whitespace once stringified.
pub fn is_missing_value(value: &EnumFieldValue) -> bool {
    match value {
        EnumFieldValue::Null => true,
        EnumFieldValue::Text(val) => val.trim().is_empty(),
        _ => value.to_string().trim().is_empty(),
    }
}

/// `(n_total - n_missing) * 100 / n_total`, rounded to two decimals.
///
/// An entity without fields counts as fully populated.
pub fn calculate_non_missing_percentage(n_total: usize, n_missing: usize) -> f64 {
    if n_total == 0 {
        return 100.0;
    }
    let n_filled = n_total.saturating_sub(n_missing);
    round_to_decimals(n_filled as f64 * 100.0 / n_total as f64, N_DECIMALS_PCT)
}

/// Classify the values of one record against its declared field names.
///
/// `field_names` and `values` are parallel, in declaration order.
pub fn plan_row_validation(field_names: &[&str], values: Vec<EnumFieldValue>) -> SpecRowValidation {
    debug_assert_eq!(field_names.len(), values.len());

    let mut missing_names = Vec::new();
    let cells: Vec<SpecCellPlan> = values
        .into_iter()
        .zip(field_names)
        .map(|(value, c_name)| {
            let if_missing = is_missing_value(&value);
            if if_missing {
                missing_names.push(normalize_name(c_name));
            }
            SpecCellPlan { value, if_missing }
        })
        .collect();

    let n_missing = missing_names.len();
    SpecRowValidation {
        pct_non_missing: calculate_non_missing_percentage(cells.len(), n_missing),
        cells,
        n_missing,
        missing_names,
    }
}

/// Place report columns before or after `n_fields` entity columns.
pub fn plan_sheet_layout(n_fields: usize, rule: EnumReportColumnsPosition) -> SpecSheetLayout {
    let (col_report_start, col_fields_start) = match rule {
        EnumReportColumnsPosition::Leading => (0, N_REPORT_COLS),
        EnumReportColumnsPosition::Trailing => (n_fields, 0),
    };
    SpecSheetLayout {
        col_report_start,
        col_fields_start,
        width_total: n_fields + N_REPORT_COLS,
    }
}
