#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Failed to open workbook: {0}")]
    Open(String),

    #[error("Failed to read sheet '{sheet}': {msg}")]
    Sheet { sheet: String, msg: String },

    #[error("Failed to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
