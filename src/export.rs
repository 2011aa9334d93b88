/// Spreadsheet export of derived row collections
use tracing::info;

use crate::pipeline::{ProductionRow, SlopeRow, TemplateRow};
use crate::workbook::{write_workbook, CellValue, CodecError, Record, Sheet};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Nothing to export: no {0} rows")]
    NothingToExport(&'static str),

    #[error("No {0} data loaded")]
    NoData(&'static str),

    #[error("No production rows computed, check that yield and calibration keys match")]
    NoRowsComputed { missing_calibration: Vec<String> },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// A finished download
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub file_name: &'static str,
    pub row_count: usize,
    pub bytes: Vec<u8>,
}

/// A row type that can be written as a single-sheet workbook
pub trait ExportTable {
    const SHEET_NAME: &'static str;
    const FILE_NAME: &'static str;
    /// Used in "nothing to export" messages
    const LABEL: &'static str;

    fn headers() -> &'static [&'static str];

    /// One value per header, in header order
    fn cells(&self) -> Vec<CellValue>;
}

/// Serialize rows to an xlsx file
///
/// An empty collection is an error: no zero-row file is ever produced.
pub fn export_rows<T: ExportTable>(rows: &[T]) -> Result<ExportedFile, ExportError> {
    if rows.is_empty() {
        return Err(ExportError::NothingToExport(T::LABEL));
    }

    let headers = T::headers();
    let mut sheet = Sheet::new(T::SHEET_NAME, headers);
    sheet.records = rows
        .iter()
        .map(|row| {
            headers
                .iter()
                .map(|h| h.to_string())
                .zip(row.cells())
                .collect::<Record>()
        })
        .collect();

    let bytes = write_workbook(&[sheet])?;
    info!(
        "Exported {} {} rows to {} ({} bytes)",
        rows.len(),
        T::LABEL,
        T::FILE_NAME,
        bytes.len()
    );

    Ok(ExportedFile {
        file_name: T::FILE_NAME,
        row_count: rows.len(),
        bytes,
    })
}

impl ExportTable for TemplateRow {
    const SHEET_NAME: &'static str = "Template";
    const FILE_NAME: &'static str = "biomass_sampling_template.xlsx";
    const LABEL: &'static str = "template";

    fn headers() -> &'static [&'static str] {
        &[
            "DATE",
            "ALLOTMENT",
            "PASTURE",
            "KA",
            "BAG #",
            "GW (g)",
            "Dry WT. (g)",
            "(-BAG)",
            "NET WT.",
        ]
    }

    fn cells(&self) -> Vec<CellValue> {
        vec![
            self.date.clone().into(),
            self.allotment.clone().into(),
            self.pasture.clone().into(),
            self.ka.clone().into(),
            CellValue::Int(self.bag_number.into()),
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Empty,
        ]
    }
}

impl ExportTable for ProductionRow {
    const SHEET_NAME: &'static str = "Production";
    const FILE_NAME: &'static str = "forage_production.xlsx";
    const LABEL: &'static str = "production";

    fn headers() -> &'static [&'static str] {
        &[
            "DATE",
            "ALLOTMENT",
            "PASTURE",
            "KA",
            "avg nValue",
            "slope_g_per_bag",
            "Production (lbs/acre)",
        ]
    }

    fn cells(&self) -> Vec<CellValue> {
        vec![
            self.date.clone().into(),
            self.allotment.clone().into(),
            self.pasture.clone().into(),
            self.ka.clone().into(),
            self.avg_yield_value.into(),
            self.slope.into(),
            self.production_lbs_per_acre.into(),
        ]
    }
}

impl ExportTable for SlopeRow {
    const SHEET_NAME: &'static str = "Slopes";
    const FILE_NAME: &'static str = "ka_slopes.xlsx";
    const LABEL: &'static str = "slope";

    fn headers() -> &'static [&'static str] {
        &["KA", "slope_g_per_bag"]
    }

    fn cells(&self) -> Vec<CellValue> {
        vec![self.ka.clone().into(), self.slope.into()]
    }
}
