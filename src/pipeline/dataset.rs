/// Accumulated yield and calibration rows for one session
///
/// Ingestion is purely additive: a workbook uploaded twice contributes its
/// rows twice, and the counters reported back are cumulative.
use tracing::{debug, info, warn};

use super::models::{CalibrationRow, YieldRow};
use super::normalize::{extract_unit_code, normalize_date, parse_hierarchy};
use super::{calibration_columns, yield_columns, YIELD_SHEET_NAME};
use crate::workbook::{Sheet, Workbook};

const EXPECTED_YIELD_COLUMNS: [&str; 3] = [
    yield_columns::DATE,
    yield_columns::ANCESTRY,
    yield_columns::SITE_ID,
];

const EXPECTED_CALIBRATION_COLUMNS: [&str; 4] = [
    calibration_columns::KA,
    calibration_columns::DATE,
    calibration_columns::BAG_NUMBER,
    calibration_columns::NET_WEIGHT,
];

/// Result of ingesting one workbook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Appended {
        sheet: String,
        added: usize,
        total: usize,
        /// Expected columns absent from the header row; their rows still load
        missing_columns: Vec<&'static str>,
    },
    /// The workbook had no usable sheet and was skipped
    SheetMissing { sheet: String },
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub yield_rows: Vec<YieldRow>,
    pub calibration_rows: Vec<CalibrationRow>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every row of the workbook's "Comparative Yield" sheet
    pub fn ingest_yield_workbook(&mut self, workbook: &Workbook) -> IngestOutcome {
        let Some(sheet) = workbook.sheet(YIELD_SHEET_NAME) else {
            warn!(
                "Workbook {} has no '{}' sheet (found: {:?}), skipping",
                workbook.source,
                YIELD_SHEET_NAME,
                workbook.sheet_names()
            );
            return IngestOutcome::SheetMissing {
                sheet: YIELD_SHEET_NAME.to_string(),
            };
        };

        let missing_columns = warn_missing_columns(workbook, sheet, &EXPECTED_YIELD_COLUMNS);

        let rows = sheet.records.iter().map(|record| {
            let hierarchy = parse_hierarchy(&record.value(yield_columns::ANCESTRY).to_text());
            YieldRow {
                date: normalize_date(record.value(yield_columns::DATE)),
                allotment: hierarchy.allotment,
                pasture: hierarchy.pasture,
                ka: extract_unit_code(&record.value(yield_columns::SITE_ID).to_text()),
                fields: record.clone(),
            }
        });

        let before = self.yield_rows.len();
        self.yield_rows.extend(rows);
        let added = self.yield_rows.len() - before;

        let inert = self.yield_rows[before..]
            .iter()
            .filter(|row| row.group_key().is_none())
            .count();
        if inert > 0 {
            debug!(
                "{} of {} rows from {} lack a date or KA and will not be used",
                inert, added, workbook.source
            );
        }

        info!(
            "Loaded {} yield rows from {} (total {})",
            added,
            workbook.source,
            self.yield_rows.len()
        );

        IngestOutcome::Appended {
            sheet: sheet.name.clone(),
            added,
            total: self.yield_rows.len(),
            missing_columns,
        }
    }

    /// Append every row of the workbook's first sheet as calibration data
    pub fn ingest_calibration_workbook(&mut self, workbook: &Workbook) -> IngestOutcome {
        let Some(sheet) = workbook.first_sheet() else {
            warn!("Workbook {} contains no sheets, skipping", workbook.source);
            return IngestOutcome::SheetMissing {
                sheet: "first sheet".to_string(),
            };
        };

        let missing_columns =
            warn_missing_columns(workbook, sheet, &EXPECTED_CALIBRATION_COLUMNS);

        let rows = sheet.records.iter().map(|record| CalibrationRow {
            ka: record.value(calibration_columns::KA).to_text(),
            date: normalize_date(record.value(calibration_columns::DATE)),
            bag_number: record.value(calibration_columns::BAG_NUMBER).as_number(),
            net_weight: record.value(calibration_columns::NET_WEIGHT).as_number(),
            fields: record.clone(),
        });

        let before = self.calibration_rows.len();
        self.calibration_rows.extend(rows);
        let added = self.calibration_rows.len() - before;

        info!(
            "Loaded {} calibration rows from {} sheet '{}' (total {})",
            added,
            workbook.source,
            sheet.name,
            self.calibration_rows.len()
        );

        IngestOutcome::Appended {
            sheet: sheet.name.clone(),
            added,
            total: self.calibration_rows.len(),
            missing_columns,
        }
    }
}

fn warn_missing_columns(
    workbook: &Workbook,
    sheet: &Sheet,
    expected: &[&'static str],
) -> Vec<&'static str> {
    let missing = sheet.missing_columns(expected);
    if !missing.is_empty() {
        warn!(
            "Sheet '{}' in {} is missing expected columns {:?}",
            sheet.name, workbook.source, missing
        );
    }
    missing
}
