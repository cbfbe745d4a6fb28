//! Stateless helper utilities shared by the registry and the writers.

use std::sync::LazyLock;

use regex::Regex;

use crate::conf::{N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL};
use crate::error::ExportError;

////////////////////////////////////////////////////////////////////////////////
// #region NameNormalization

// `HTMLPage` -> `HTML_Page`
static RE_UPPER_RUN_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("valid regex"));
// `userId` -> `user_Id`, `line2Text` -> `line2_Text`
static RE_LOWER_UPPER_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid regex"));

/// Convert a mixed-case identifier to underscore-separated lowercase.
///
/// `UserId` -> `user_id`, `HTMLPage` -> `html_page`, `id` -> `id`.
/// Already-normalized names are returned unchanged.
pub fn normalize_name(name: &str) -> String {
    let c_name = RE_UPPER_RUN_BOUNDARY.replace_all(name, "${1}_${2}");
    let c_name = RE_LOWER_UPPER_BOUNDARY.replace_all(&c_name, "${1}_${2}");
    c_name.to_lowercase()
}

/// Last path segment of a Rust type name (`shop::model::Product` -> `Product`).
pub fn derive_simple_type_name(type_name: &'static str) -> &'static str {
    let c_path = type_name.split('<').next().unwrap_or(type_name);
    c_path.rsplit("::").next().unwrap_or(c_path)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ScopeMatching

/// Whether `scope_item` lies in `scope` (equal, or nested below it by `.`).
///
/// An empty `scope` contains everything.
pub fn is_within_scope(scope: &str, scope_item: &str) -> bool {
    let scope = scope.trim_end_matches('.');
    if scope.is_empty() || scope_item == scope {
        return true;
    }
    scope_item
        .strip_prefix(scope)
        .is_some_and(|rest| rest.starts_with('.'))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().trim_matches('\'').to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Create suffixed sheet name (`base__2`, `base__3`, ...), respecting length cap.
pub fn create_sheet_identifier(base_name: &str, n_idx: usize) -> String {
    let c_sheet_name_suffix = format!("__{n_idx}");
    let n_len_base_name_max = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_sheet_name_suffix.len());

    let c_sheet_name_base: String = base_name
        .chars()
        .take(usize::max(1, n_len_base_name_max))
        .collect();

    format!("{c_sheet_name_base}{c_sheet_name_suffix}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region NumericHelpers

/// Round `x` half away from zero to `n_decimals` places.
pub fn round_to_decimals(x: f64, n_decimals: i32) -> f64 {
    let n_scale = 10f64.powi(n_decimals);
    (x * n_scale).round() / n_scale
}

/// Estimate displayed width units of `s` (non-ASCII counts wider).
pub fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

pub fn cast_row_num(value: usize) -> Result<u32, ExportError> {
    u32::try_from(value).map_err(|_| ExportError::IndexOverflow { axis: "row", value })
}

pub fn cast_col_num(value: usize) -> Result<u16, ExportError> {
    u16::try_from(value).map_err(|_| ExportError::IndexOverflow {
        axis: "column",
        value,
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_name_handles_documented_cases() {
        assert_eq!(normalize_name("UserId"), "user_id");
        assert_eq!(normalize_name("id"), "id");
        assert_eq!(normalize_name("HTMLPage"), "html_page");
        assert_eq!(normalize_name("productName"), "product_name");
        assert_eq!(normalize_name("Product"), "product");
        assert_eq!(normalize_name("userIDNumber"), "user_id_number");
        assert_eq!(normalize_name("address2Line"), "address2_line");
    }

    #[test]
    fn normalize_name_is_idempotent() {
        for name in ["UserId", "HTMLPage", "dateCreated", "already_snake", "URL", "x"] {
            let once = normalize_name(name);
            assert_eq!(normalize_name(&once), once, "{name}");
        }
    }

    #[test]
    fn derive_simple_type_name_strips_path_and_generics() {
        assert_eq!(derive_simple_type_name("shop::model::Product"), "Product");
        assert_eq!(derive_simple_type_name("Product"), "Product");
        assert_eq!(derive_simple_type_name("shop::Repo<shop::Product>"), "Repo");
    }

    #[test]
    fn is_within_scope_matches_nested_segments_only() {
        assert!(is_within_scope("shop.entity", "shop.entity"));
        assert!(is_within_scope("shop.entity", "shop.entity.audit"));
        assert!(is_within_scope("shop.entity.", "shop.entity.audit"));
        assert!(!is_within_scope("shop.entity", "shop.entitys"));
        assert!(!is_within_scope("shop.entity", "shop"));
        assert!(is_within_scope("", "anything.at.all"));
    }

    #[test]
    fn sanitize_sheet_name_replaces_illegal_chars_and_truncates() {
        assert_eq!(sanitize_sheet_name("a/b:c", "_"), "a_b_c");
        assert_eq!(sanitize_sheet_name("   ", "_"), "Sheet");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40), "_").len(), 31);
    }

    #[test]
    fn create_sheet_identifier_keeps_suffix_within_cap() {
        assert_eq!(create_sheet_identifier("product", 2), "product__2");
        let c_long = create_sheet_identifier(&"y".repeat(31), 12);
        assert_eq!(c_long.len(), 31);
        assert!(c_long.ends_with("__12"));
    }

    #[test]
    fn round_to_decimals_rounds_two_thirds() {
        assert_eq!(round_to_decimals(200.0 / 3.0, 2), 66.67);
        assert_eq!(round_to_decimals(100.0, 2), 100.0);
    }
}
