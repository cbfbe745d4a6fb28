//! Export constants and default preset factories.

use crate::spec::SpecCellFormat;

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Number of validation report columns added per sheet.
pub const N_REPORT_COLS: usize = 3;
/// Header label of the missing-count report column.
pub const C_HEADER_MISSING_COUNT: &str = "Total Missing Values";
/// Header label of the non-missing percentage report column.
pub const C_HEADER_NON_MISSING_PCT: &str = "Percentage of non-missing values";
/// Header label of the missing column names report column.
pub const C_HEADER_MISSING_NAMES: &str = "Validation Report";
/// Report column labels in write order.
pub const TUP_REPORT_HEADERS: [&str; N_REPORT_COLS] = [
    C_HEADER_MISSING_COUNT,
    C_HEADER_NON_MISSING_PCT,
    C_HEADER_MISSING_NAMES,
];

/// Decimal places kept in the non-missing percentage.
pub const N_DECIMALS_PCT: i32 = 2;
/// Separator between missing column names.
pub const C_SEP_MISSING_NAMES: &str = ", ";

/// Build the default cell format presets.
///
/// Returns `(header, text, missing, percentage)`.
pub fn derive_default_export_formats() -> (
    SpecCellFormat,
    SpecCellFormat,
    SpecCellFormat,
    SpecCellFormat,
) {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_name: Some("Calibri".to_string()),
        font_size: Some(11),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };

    let fmt_header = cfg_base_fmt_spec.with_(SpecCellFormat {
        bold: Some(true),
        align: Some("center".to_string()),
        bottom: Some(1),
        ..Default::default()
    });
    let fmt_text = cfg_base_fmt_spec.with_(SpecCellFormat {
        align: Some("left".to_string()),
        ..Default::default()
    });
    let fmt_missing = fmt_text.with_(SpecCellFormat {
        bg_color: Some("#FF0000".to_string()),
        ..Default::default()
    });
    let fmt_percentage = cfg_base_fmt_spec.with_(SpecCellFormat {
        num_format: Some("0.00".to_string()),
        ..Default::default()
    });

    (fmt_header, fmt_text, fmt_missing, fmt_percentage)
}
