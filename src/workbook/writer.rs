/// Workbook writer
///
/// Serializes `Sheet`s to an in-memory xlsx file. Cells are written in header
/// order; a record that lacks a column (or holds a blank) leaves the cell empty.
use chrono::{Datelike, NaiveDateTime, Timelike};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet, XlsxError};
use tracing::debug;

use super::error::CodecError;
use super::models::{CellValue, Sheet};

pub fn write_workbook(sheets: &[Sheet]) -> Result<Vec<u8>, CodecError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        for (col, header) in sheet.headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
        }

        for (row_idx, record) in sheet.records.iter().enumerate() {
            let row = (row_idx + 1) as u32;
            for (col, header) in sheet.headers.iter().enumerate() {
                let col = col as u16;
                match record.value(header) {
                    CellValue::Empty => {}
                    CellValue::String(s) | CellValue::DateTimeIso(s) | CellValue::Error(s) => {
                        worksheet.write_string(row, col, s)?;
                    }
                    CellValue::Float(f) => {
                        worksheet.write_number(row, col, *f)?;
                    }
                    CellValue::Int(i) => {
                        worksheet.write_number(row, col, *i as f64)?;
                    }
                    CellValue::Bool(b) => {
                        worksheet.write_boolean(row, col, *b)?;
                    }
                    CellValue::DateTime(dt) => {
                        write_datetime(worksheet, row, col, dt, &date_format, &datetime_format)?;
                    }
                }
            }
        }

        debug!(
            "Wrote sheet '{}' with {} rows",
            sheet.name,
            sheet.records.len()
        );
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_datetime(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    dt: &NaiveDateTime,
    date_format: &Format,
    datetime_format: &Format,
) -> Result<(), XlsxError> {
    let date = ExcelDateTime::from_ymd(dt.year() as u16, dt.month() as u8, dt.day() as u8)?;

    if dt.time().num_seconds_from_midnight() == 0 {
        worksheet.write_datetime_with_format(row, col, &date, date_format)?;
    } else {
        let datetime = date.and_hms(dt.hour() as u16, dt.minute() as u8, dt.second() as f64)?;
        worksheet.write_datetime_with_format(row, col, &datetime, datetime_format)?;
    }
    Ok(())
}
