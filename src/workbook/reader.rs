/// Workbook reader
///
/// Decodes a complete workbook (every sheet) from in-memory bytes using
/// calamine's format auto-detection. The first row of each sheet's used range
/// is the header row; every following non-blank row becomes a `Record`.
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

use super::error::CodecError;
use super::models::{CellValue, Record, Sheet, Workbook};

/// Decode an uploaded file
///
/// `source` is only used for logging and reporting (usually the file name).
pub fn read_workbook(source: impl Into<String>, bytes: Vec<u8>) -> Result<Workbook, CodecError> {
    let source = source.into();
    debug!("Decoding workbook {} ({} bytes)", source, bytes.len());

    let mut reader = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| CodecError::Open(e.to_string()))?;

    let sheet_names = reader.sheet_names().to_owned();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for name in sheet_names {
        let range = reader
            .worksheet_range(&name)
            .map_err(|e| CodecError::Sheet {
                sheet: name.clone(),
                msg: e.to_string(),
            })?;
        let sheet = sheet_from_range(&name, &range);
        debug!(
            "Sheet '{}': {} columns, {} records",
            name,
            sheet.headers.len(),
            sheet.records.len()
        );
        sheets.push(sheet);
    }

    info!("Decoded workbook {} with {} sheets", source, sheets.len());
    Ok(Workbook { source, sheets })
}

/// Read and decode a workbook from disk
pub fn read_workbook_file(path: impl AsRef<Path>) -> Result<Workbook, CodecError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    read_workbook(source, bytes)
}

/// Convert a calamine range into a header row plus records
pub fn sheet_from_range(name: &str, range: &Range<Data>) -> Sheet {
    let mut rows = range.rows();

    let Some(header_row) = rows.next() else {
        return Sheet {
            name: name.to_string(),
            ..Sheet::default()
        };
    };
    let headers = header_names(header_row);

    let records = rows
        .filter(|row| !row.iter().all(|cell| matches!(cell, Data::Empty)))
        .map(|row| {
            headers
                .iter()
                .enumerate()
                .map(|(col, header)| {
                    let value = row.get(col).map(CellValue::from).unwrap_or(CellValue::Empty);
                    (header.clone(), value)
                })
                .collect::<Record>()
        })
        .collect();

    Sheet {
        name: name.to_string(),
        headers,
        records,
    }
}

/// Header names with blanks and duplicates disambiguated
///
/// Blank header cells become `__EMPTY`, `__EMPTY_1`, ...; a repeated header
/// gets `_1`, `_2`, ... appended so every column stays addressable.
fn header_names(row: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    row.iter()
        .map(|cell| {
            let base = match CellValue::from(cell).to_text() {
                text if text.is_empty() => "__EMPTY".to_string(),
                text => text,
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{base}_{count}")
            };
            *count += 1;
            name
        })
        .collect()
}

impl From<&Data> for CellValue {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::String(s.clone()),
            Data::Float(f) => CellValue::Float(*f),
            Data::Int(i) => CellValue::Int(*i),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(datetime) => CellValue::DateTime(datetime),
                None => CellValue::Error(format!("invalid date serial {}", dt.as_f64())),
            },
            Data::DateTimeIso(s) => CellValue::DateTimeIso(s.clone()),
            Data::DurationIso(s) => CellValue::String(s.clone()),
            Data::Error(e) => CellValue::Error(e.to_string()),
        }
    }
}
