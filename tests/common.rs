#![allow(dead_code)]
//! Shared fixtures: real xlsx files built in memory

use chrono::NaiveDate;
use forage_production_service::workbook::{write_workbook, CellValue, Record, Sheet};

pub const SURVEY_HEADERS: [&str; 5] = ["Date", "Ancestry", "SiteID", "nValue", "Observer"];
pub const CALIBRATION_HEADERS: [&str; 4] = ["DATE", "KA", "BAG #", "NET WT."];

/// One line of a Comparative Yield export
pub struct SurveyRow {
    pub date: (i32, u32, u32),
    pub ancestry: &'static str,
    pub site_id: &'static str,
    pub n_value: Option<f64>,
}

pub fn survey(date: (i32, u32, u32), ancestry: &'static str, site_id: &'static str, n: f64) -> SurveyRow {
    SurveyRow {
        date,
        ancestry,
        site_id,
        n_value: Some(n),
    }
}

pub fn date_cell((y, m, d): (i32, u32, u32)) -> CellValue {
    CellValue::DateTime(
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
    )
}

/// Survey export with a "Comparative Yield" sheet after an unrelated first sheet
pub fn survey_workbook(rows: &[SurveyRow]) -> Vec<u8> {
    let mut summary = Sheet::new("Summary", &["Note"]);
    summary
        .records
        .push(Record::new().with("Note", "exported from field app"));

    let mut sheet = Sheet::new("Comparative Yield", &SURVEY_HEADERS);
    sheet.records = rows
        .iter()
        .map(|row| {
            Record::new()
                .with("Date", date_cell(row.date))
                .with("Ancestry", row.ancestry)
                .with("SiteID", row.site_id)
                .with("nValue", row.n_value)
                .with("Observer", "JD")
        })
        .collect();

    write_workbook(&[summary, sheet]).expect("Failed to build survey workbook")
}

/// Filled calibration sheet: (date, ka, bag, net weight)
pub fn calibration_workbook(rows: &[(&str, &str, f64, f64)]) -> Vec<u8> {
    let mut sheet = Sheet::new("Template", &CALIBRATION_HEADERS);
    sheet.records = rows
        .iter()
        .map(|&(date, ka, bag, net)| {
            Record::new()
                .with("DATE", date)
                .with("KA", ka)
                .with("BAG #", bag)
                .with("NET WT.", net)
        })
        .collect();

    write_workbook(&[sheet]).expect("Failed to build calibration workbook")
}

/// Exact linear calibration (net = slope x bag) for bags 1, 3 and 5
pub fn linear_calibration(date: &'static str, ka: &'static str, slope: f64) -> Vec<(&'static str, &'static str, f64, f64)> {
    [1.0, 3.0, 5.0]
        .into_iter()
        .map(|bag| (date, ka, bag, bag * slope))
        .collect()
}

pub fn workbook_without_survey_sheet() -> Vec<u8> {
    let mut sheet = Sheet::new("Sheet1", &["Date", "SiteID"]);
    sheet
        .records
        .push(Record::new().with("Date", "2024-06-03").with("SiteID", "1-C3"));
    write_workbook(&[sheet]).expect("Failed to build workbook")
}

pub fn standard_survey() -> Vec<u8> {
    survey_workbook(&[
        survey((2024, 6, 3), "Turkey Creek Allotment > Turkey Creek Pasture", "03-01-01-00112-001-C3", 1.0),
        survey((2024, 6, 3), "Turkey Creek Allotment > Turkey Creek Pasture", "03-01-01-00112-002-C3", 3.0),
        survey((2024, 6, 3), "Turkey Creek Allotment > Turkey Creek Pasture", "03-01-01-00113-001-D1", 2.0),
        survey((2024, 6, 4), "Bear Flat Allotment > North Pasture", "00112-001", 5.0),
    ])
}
