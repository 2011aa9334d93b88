/// Export orchestration
///
/// Each export recomputes its rows from the full session dataset, writes the
/// workbook and records the outcome in the session status.
use tracing::{debug, instrument, warn};

use crate::export::{export_rows, ExportError, ExportedFile};
use crate::pipeline::{
    build_template, compute_production, fit_slopes, to_rounded_number, ProductionReport, SlopeRow,
};
use crate::session::Session;

#[derive(Debug, Clone)]
pub struct ProductionExport {
    pub file: ExportedFile,
    pub missing_calibration: Vec<String>,
}

#[instrument(skip_all)]
pub fn export_template(session: &mut Session) -> Result<ExportedFile, ExportError> {
    let rows = build_template(&session.dataset.yield_rows);
    let result = export_rows(&rows);

    match &result {
        Ok(file) => session.set_status(format!(
            "Exported {} template rows to {}.",
            file.row_count, file.file_name
        )),
        Err(e) => record_failure(session, e),
    }
    result
}

/// Production rows, missing calibration and slopes for the current dataset
pub fn production_report(session: &Session, yield_value_column: &str) -> ProductionReport {
    compute_production(
        &session.dataset.yield_rows,
        &session.dataset.calibration_rows,
        yield_value_column,
    )
}

#[instrument(skip(session))]
pub fn export_production(
    session: &mut Session,
    yield_value_column: &str,
) -> Result<ProductionExport, ExportError> {
    let result = build_production_export(session, yield_value_column);

    match &result {
        Ok(export) => {
            let mut message = format!(
                "Exported {} production rows to {}.",
                export.file.row_count, export.file.file_name
            );
            if !export.missing_calibration.is_empty() {
                message.push_str(&missing_calibration_note(&export.missing_calibration));
            }
            session.set_status(message);
        }
        Err(e) => record_failure(session, e),
    }
    result
}

fn build_production_export(
    session: &Session,
    yield_value_column: &str,
) -> Result<ProductionExport, ExportError> {
    if session.dataset.yield_rows.is_empty() {
        return Err(ExportError::NoData("yield"));
    }
    if session.dataset.calibration_rows.is_empty() {
        return Err(ExportError::NoData("calibration"));
    }

    let report = production_report(session, yield_value_column);
    let missing_calibration: Vec<String> = report.missing_calibration.into_iter().collect();

    if report.rows.is_empty() {
        return Err(ExportError::NoRowsComputed {
            missing_calibration,
        });
    }

    let file = export_rows(&report.rows)?;
    Ok(ProductionExport {
        file,
        missing_calibration,
    })
}

/// Diagnostics export of the fitted slope table
#[instrument(skip_all)]
pub fn export_slopes(session: &mut Session) -> Result<ExportedFile, ExportError> {
    let result = if session.dataset.calibration_rows.is_empty() {
        Err(ExportError::NoData("calibration"))
    } else {
        let slopes: Vec<SlopeRow> = fit_slopes(&session.dataset.calibration_rows)
            .into_iter()
            .map(|(ka, slope)| SlopeRow {
                ka,
                slope: to_rounded_number(slope, 4),
            })
            .collect();
        export_rows(&slopes)
    };

    match &result {
        Ok(file) => session.set_status(format!(
            "Exported {} slopes to {}.",
            file.row_count, file.file_name
        )),
        Err(e) => record_failure(session, e),
    }
    result
}

fn missing_calibration_note(missing: &[String]) -> String {
    format!(" Missing calibration for KA: {}.", missing.join(", "))
}

fn record_failure(session: &mut Session, error: &ExportError) {
    let mut message = error.to_string();
    if let ExportError::NoRowsComputed {
        missing_calibration,
    } = error
    {
        message.push('.');
        if !missing_calibration.is_empty() {
            message.push_str(&missing_calibration_note(missing_calibration));
        }
    }
    warn!("Export failed: {}", message);
    session.set_status(message);
    debug!(
        yield_rows = session.dataset.yield_rows.len(),
        calibration_rows = session.dataset.calibration_rows.len(),
        "Dataset state at failed export"
    );
}
