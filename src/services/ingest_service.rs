/// Batch ingestion boundary
///
/// Files in a batch are decoded and appended one after another, in the order
/// given. A workbook without the expected sheet is skipped with a warning; a
/// file the codec cannot decode aborts the rest of the batch. Rows appended
/// before the failure stay in the session. Every outcome ends up in the
/// session status string; nothing here returns an error.
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;

use crate::pipeline::IngestOutcome;
use crate::session::Session;
use crate::workbook::read_workbook;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Yield,
    Calibration,
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetKind::Yield => write!(f, "yield"),
            DatasetKind::Calibration => write!(f, "calibration"),
        }
    }
}

/// Raw bytes of one uploaded spreadsheet
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SkippedFile {
    pub file: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BatchReport {
    pub kind: DatasetKind,
    pub files_loaded: usize,
    pub rows_added: usize,
    /// Cumulative row count for this dataset after the batch
    pub total_rows: usize,
    pub skipped: Vec<SkippedFile>,
    pub warnings: Vec<String>,
    /// Set when a file could not be decoded and the batch was aborted
    pub error: Option<String>,
    pub status: String,
}

impl BatchReport {
    fn new(kind: DatasetKind) -> Self {
        Self {
            kind,
            files_loaded: 0,
            rows_added: 0,
            total_rows: 0,
            skipped: Vec::new(),
            warnings: Vec::new(),
            error: None,
            status: String::new(),
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.error.is_some()
    }

    fn status_message(&self) -> String {
        let mut message = match &self.error {
            Some(error) => format!(
                "{error}. Loaded {} {} rows before the failure (total {}).",
                self.rows_added, self.kind, self.total_rows
            ),
            None => format!(
                "Loaded {} {} rows from {} file(s) (total {}).",
                self.rows_added, self.kind, self.files_loaded, self.total_rows
            ),
        };

        if !self.skipped.is_empty() {
            let skipped = self
                .skipped
                .iter()
                .map(|s| format!("{} ({})", s.file, s.reason))
                .collect::<Vec<_>>()
                .join(", ");
            message.push_str(&format!(" Skipped: {skipped}."));
        }
        if !self.warnings.is_empty() {
            message.push_str(&format!(" Warnings: {}.", self.warnings.join("; ")));
        }
        message
    }
}

pub fn ingest_batch(
    session: &mut Session,
    kind: DatasetKind,
    files: impl IntoIterator<Item = UploadedFile>,
) -> BatchReport {
    ingest_batch_with_progress(session, kind, files, |_| {})
}

/// Same as `ingest_batch`, calling `on_file` with each file name before it is decoded
#[instrument(skip_all, fields(kind = %kind))]
pub fn ingest_batch_with_progress<F>(
    session: &mut Session,
    kind: DatasetKind,
    files: impl IntoIterator<Item = UploadedFile>,
    mut on_file: F,
) -> BatchReport
where
    F: FnMut(&str),
{
    let mut report = BatchReport::new(kind);

    for file in files {
        on_file(&file.name);

        let workbook = match read_workbook(file.name.clone(), file.bytes) {
            Ok(workbook) => workbook,
            Err(e) => {
                error!("Failed to read {}: {}, aborting batch", file.name, e);
                report.error = Some(format!("Error reading {}: {}", file.name, e));
                break;
            }
        };

        let outcome = match kind {
            DatasetKind::Yield => session.dataset.ingest_yield_workbook(&workbook),
            DatasetKind::Calibration => session.dataset.ingest_calibration_workbook(&workbook),
        };

        match outcome {
            IngestOutcome::Appended {
                added,
                missing_columns,
                ..
            } => {
                report.files_loaded += 1;
                report.rows_added += added;
                if !missing_columns.is_empty() {
                    report.warnings.push(format!(
                        "{} is missing columns {}",
                        file.name,
                        missing_columns.join(", ")
                    ));
                }
            }
            IngestOutcome::SheetMissing { sheet } => {
                warn!("Skipping {}: no '{}' sheet", file.name, sheet);
                report.skipped.push(SkippedFile {
                    file: file.name,
                    reason: format!("no '{sheet}' sheet"),
                });
            }
        }
    }

    report.total_rows = match kind {
        DatasetKind::Yield => session.dataset.yield_rows.len(),
        DatasetKind::Calibration => session.dataset.calibration_rows.len(),
    };
    report.status = report.status_message();
    session.set_status(report.status.clone());

    info!(
        files_loaded = report.files_loaded,
        rows_added = report.rows_added,
        total_rows = report.total_rows,
        skipped = report.skipped.len(),
        aborted = report.is_aborted(),
        "Finished {} batch",
        kind
    );
    report
}
