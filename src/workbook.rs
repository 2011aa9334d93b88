// Spreadsheet codec
//
// Reading goes through calamine (xlsx, xls, ods); writing goes through
// rust_xlsxwriter. Both sides speak the codec-independent model in `models`
// so the pipeline never touches a codec type directly.

pub mod error;
pub mod models;
pub mod reader;
pub mod writer;

pub use error::CodecError;
pub use models::*;
pub use reader::{read_workbook, read_workbook_file};
pub use writer::write_workbook;
