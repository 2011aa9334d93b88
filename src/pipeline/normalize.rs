/// Field normalization for survey and calibration cells
///
/// All functions are total: malformed input becomes an empty value that later
/// fails to match anything, it never raises an error.
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

use crate::workbook::CellValue;

static ALLOTMENT_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*allotment\s*$").expect("valid regex"));
static PASTURE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*pasture\s*$").expect("valid regex"));

/// Area and sub-area names split out of an `Ancestry` path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
    pub allotment: String,
    pub pasture: String,
}

/// Canonical `YYYY-MM-DD` form of a date cell
///
/// Date cells are formatted zero-padded. Text is passed through unchanged,
/// without checking that it looks like a date. Anything else (blank, plain
/// numbers, booleans, error cells) becomes `""`.
///
/// # Examples
///
/// ```
/// use forage_production_service::pipeline::normalize_date;
/// use forage_production_service::workbook::CellValue;
///
/// assert_eq!(normalize_date(&CellValue::from("2024-06-03")), "2024-06-03");
/// assert_eq!(normalize_date(&CellValue::Empty), "");
/// ```
pub fn normalize_date(value: &CellValue) -> String {
    match value {
        CellValue::DateTime(dt) => dt.format("%Y-%m-%d").to_string(),
        CellValue::DateTimeIso(s) => parse_iso_date(s)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| s.clone()),
        CellValue::String(s) => s.clone(),
        _ => String::new(),
    }
}

fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let date_part = value.get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Split `"<X> Allotment > <Y> Pasture"` into its two names
///
/// # Examples
///
/// ```
/// use forage_production_service::pipeline::parse_hierarchy;
///
/// let h = parse_hierarchy("Turkey Creek Allotment > Turkey Creek Pasture");
/// assert_eq!(h.allotment, "Turkey Creek");
/// assert_eq!(h.pasture, "Turkey Creek");
/// ```
pub fn parse_hierarchy(path: &str) -> Hierarchy {
    let mut segments = path.split('>').map(str::trim);
    let allotment = segments.next().unwrap_or_default();
    let pasture = segments.next().unwrap_or_default();

    Hierarchy {
        allotment: ALLOTMENT_SUFFIX.replace(allotment, "").trim().to_string(),
        pasture: PASTURE_SUFFIX.replace(pasture, "").trim().to_string(),
    }
}

/// Unit code (KA) at the end of a composite site identifier
///
/// Everything from the first ASCII letter onwards, or `""` when the
/// identifier has no letter at all.
///
/// # Examples
///
/// ```
/// use forage_production_service::pipeline::extract_unit_code;
///
/// assert_eq!(extract_unit_code("03-01-01-00112-001-C3"), "C3");
/// assert_eq!(extract_unit_code("00112-001"), "");
/// ```
pub fn extract_unit_code(identifier: &str) -> String {
    let identifier = identifier.trim();
    identifier
        .find(|c: char| c.is_ascii_alphabetic())
        .map(|start| identifier[start..].to_string())
        .unwrap_or_default()
}

/// Round half away from zero to `digits` decimals
///
/// `None` stands in for the empty export cell when the value is not finite.
pub fn to_rounded_number(value: f64, digits: u32) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let scale = 10f64.powi(digits as i32);
    let rounded = (value * scale).round() / scale;
    rounded.is_finite().then_some(rounded)
}
