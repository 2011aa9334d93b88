// End-to-end pipeline tests over real xlsx bytes:
// upload -> decode -> normalize -> accumulate -> template / production -> export

mod common;

use common::*;
use forage_production_service::export::ExportError;
use forage_production_service::services::{
    export_production, export_template, ingest_batch, DatasetKind, UploadedFile,
};
use forage_production_service::session::Session;
use forage_production_service::workbook::{read_workbook, write_workbook, CellValue};

fn upload(name: &str, bytes: Vec<u8>) -> UploadedFile {
    UploadedFile::new(name, bytes)
}

#[test]
fn test_survey_upload_normalizes_rows() {
    let mut session = Session::new();
    let report = ingest_batch(
        &mut session,
        DatasetKind::Yield,
        vec![upload("survey.xlsx", standard_survey())],
    );

    assert_eq!(report.files_loaded, 1);
    assert_eq!(report.rows_added, 4);
    assert!(report.warnings.is_empty());

    let rows = &session.dataset.yield_rows;
    assert_eq!(rows[0].date, "2024-06-03");
    assert_eq!(rows[0].allotment, "Turkey Creek");
    assert_eq!(rows[0].pasture, "Turkey Creek");
    assert_eq!(rows[0].ka, "C3");
    assert_eq!(rows[0].fields.value("Observer"), &CellValue::from("JD"));
    assert_eq!(rows[3].allotment, "Bear Flat");
    assert_eq!(rows[3].pasture, "North");
    // retained even though it can never be used
    assert_eq!(rows[3].ka, "");
}

#[test]
fn test_template_from_survey() {
    let mut session = Session::new();
    ingest_batch(
        &mut session,
        DatasetKind::Yield,
        vec![upload("survey.xlsx", standard_survey())],
    );

    let file = export_template(&mut session).unwrap();
    assert_eq!(file.row_count, 6);

    let workbook = read_workbook(file.file_name, file.bytes).unwrap();
    let sheet = workbook.sheet("Template").unwrap();
    let keys: Vec<(String, f64)> = sheet
        .records
        .iter()
        .map(|r| {
            (
                r.value("KA").to_text(),
                r.value("BAG #").as_number().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        keys,
        vec![
            ("C3".to_string(), 1.0),
            ("C3".to_string(), 3.0),
            ("C3".to_string(), 5.0),
            ("D1".to_string(), 1.0),
            ("D1".to_string(), 3.0),
            ("D1".to_string(), 5.0),
        ]
    );
    assert!(sheet
        .records
        .iter()
        .all(|r| r.value("ALLOTMENT") == &CellValue::from("Turkey Creek")));
}

#[test]
fn test_duplicate_upload_does_not_change_template() {
    let mut once = Session::new();
    ingest_batch(
        &mut once,
        DatasetKind::Yield,
        vec![upload("survey.xlsx", standard_survey())],
    );

    let mut twice = Session::new();
    ingest_batch(
        &mut twice,
        DatasetKind::Yield,
        vec![
            upload("survey.xlsx", standard_survey()),
            upload("survey.xlsx", standard_survey()),
        ],
    );

    // row counts are cumulative, the template is not
    assert_eq!(twice.dataset.yield_rows.len(), 8);
    assert_eq!(
        forage_production_service::pipeline::build_template(&once.dataset.yield_rows),
        forage_production_service::pipeline::build_template(&twice.dataset.yield_rows)
    );
}

#[test]
fn test_file_without_survey_sheet_is_skipped() {
    let mut session = Session::new();
    let report = ingest_batch(
        &mut session,
        DatasetKind::Yield,
        vec![
            upload("notes.xlsx", workbook_without_survey_sheet()),
            upload("survey.xlsx", standard_survey()),
        ],
    );

    assert!(!report.is_aborted());
    assert_eq!(report.files_loaded, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].file, "notes.xlsx");
    assert_eq!(report.total_rows, 4);
    assert!(session.status().contains("Skipped: notes.xlsx"));
}

#[test]
fn test_unreadable_file_aborts_but_keeps_earlier_rows() {
    let mut session = Session::new();
    let report = ingest_batch(
        &mut session,
        DatasetKind::Yield,
        vec![
            upload("survey.xlsx", standard_survey()),
            upload("corrupt.xlsx", b"PK\x03\x04 truncated".to_vec()),
            upload("later.xlsx", standard_survey()),
        ],
    );

    assert!(report.is_aborted());
    assert_eq!(report.files_loaded, 1);
    assert_eq!(session.dataset.yield_rows.len(), 4);
    assert!(session.status().starts_with("Error reading corrupt.xlsx"));
}

#[test]
fn test_production_flow() {
    let mut session = Session::new();
    ingest_batch(
        &mut session,
        DatasetKind::Yield,
        vec![upload("survey.xlsx", standard_survey())],
    );
    ingest_batch(
        &mut session,
        DatasetKind::Calibration,
        vec![upload(
            "filled.xlsx",
            calibration_workbook(&linear_calibration("2024-06-03", "C3", 10.0)),
        )],
    );

    let export = export_production(&mut session, "nValue").unwrap();

    assert_eq!(export.missing_calibration, vec!["D1"]);
    assert_eq!(export.file.row_count, 1);

    let workbook = read_workbook(export.file.file_name, export.file.bytes).unwrap();
    let sheet = workbook.sheet("Production").unwrap();
    let row = &sheet.records[0];
    assert_eq!(row.value("DATE"), &CellValue::from("2024-06-03"));
    assert_eq!(row.value("ALLOTMENT"), &CellValue::from("Turkey Creek"));
    assert_eq!(row.value("KA"), &CellValue::from("C3"));
    assert_eq!(row.value("avg nValue").as_number(), Some(2.0));
    assert_eq!(row.value("slope_g_per_bag").as_number(), Some(10.0));
    assert_eq!(row.value("Production (lbs/acre)").as_number(), Some(1115.22));
    assert!(session.status().contains("Missing calibration for KA: D1"));
}

#[test]
fn test_production_without_overlap_is_distinct_from_missing_calibration() {
    let mut session = Session::new();
    ingest_batch(
        &mut session,
        DatasetKind::Yield,
        vec![upload(
            "survey.xlsx",
            survey_workbook(&[SurveyRow {
                date: (2024, 6, 3),
                ancestry: "A Allotment > B Pasture",
                site_id: "1-C3",
                n_value: None,
            }]),
        )],
    );
    ingest_batch(
        &mut session,
        DatasetKind::Calibration,
        vec![upload(
            "filled.xlsx",
            calibration_workbook(&linear_calibration("2024-06-03", "C3", 10.0)),
        )],
    );

    match export_production(&mut session, "nValue") {
        Err(ExportError::NoRowsComputed {
            missing_calibration,
        }) => assert!(missing_calibration.is_empty()),
        other => panic!("Expected NoRowsComputed, got {other:?}"),
    }
}

#[test]
fn test_filled_template_round_trip() {
    // Export the template, fill in net weights as a field crew would, re-upload
    let mut session = Session::new();
    ingest_batch(
        &mut session,
        DatasetKind::Yield,
        vec![upload("survey.xlsx", standard_survey())],
    );
    let template = export_template(&mut session).unwrap();

    let mut filled = read_workbook(template.file_name, template.bytes).unwrap();
    let sheet = &mut filled.sheets[0];
    for record in &mut sheet.records {
        let bag = record.value("BAG #").as_number().unwrap();
        let slope = if record.value("KA").to_text() == "C3" { 12.0 } else { 8.0 };
        *record = record
            .iter()
            .map(|(name, value)| {
                let value = if name == "NET WT." {
                    CellValue::Float(bag * slope)
                } else {
                    value.clone()
                };
                (name.to_string(), value)
            })
            .collect();
    }
    let filled_bytes = write_workbook(&filled.sheets).unwrap();

    let report = ingest_batch(
        &mut session,
        DatasetKind::Calibration,
        vec![upload("filled.xlsx", filled_bytes)],
    );
    assert_eq!(report.rows_added, 6);
    assert!(report.warnings.is_empty());

    let export = export_production(&mut session, "nValue").unwrap();
    assert!(export.missing_calibration.is_empty());
    assert_eq!(export.file.row_count, 2);

    let workbook = read_workbook(export.file.file_name, export.file.bytes).unwrap();
    let slopes: Vec<f64> = workbook.sheets[0]
        .records
        .iter()
        .map(|r| r.value("slope_g_per_bag").as_number().unwrap())
        .collect();
    assert_eq!(slopes, vec![12.0, 8.0]);
}

#[test]
fn test_workbook_read_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("survey.xlsx");
    std::fs::write(&path, standard_survey()).unwrap();

    let workbook = forage_production_service::workbook::read_workbook_file(&path).unwrap();

    assert_eq!(workbook.source, "survey.xlsx");
    assert_eq!(workbook.sheet_names(), vec!["Summary", "Comparative Yield"]);
    assert_eq!(workbook.sheet("Comparative Yield").unwrap().records.len(), 4);
}
