use thiserror::Error;

/// Errors that can occur during sheet operations
#[derive(Error, Debug)]
pub enum SheetError {
    #[error(
        "In spreadsheet \"{spreadsheet}\" in sheet \"{sheet}\" no required headers: {}",
        .missing.join(", ")
    )]
    MissingRequiredHeaders {
        missing: Vec<String>,
        sheet: String,
        spreadsheet: String,
    },

    #[error("Key column '{key}' not found in sheet \"{sheet}\"")]
    MissingKeyColumn { key: String, sheet: String },

    #[error("Sheet \"{sheet}\" contains no data")]
    EmptySheet { sheet: String },

    #[error("Sheets are not the same. Reason: {field} differs")]
    IncompatibleMerge { field: &'static str },

    #[error("Invalid sheet document: {0}")]
    SerializationFormat(String),

    #[error("Row not found: {id}")]
    RowNotFound { id: u64 },

    #[error("Column index out of bounds: {index} (sheet has {count} columns)")]
    ColumnIndexOutOfBounds { index: usize, count: usize },

    #[error("Column not found: {name}")]
    ColumnNotFound { name: String },

    #[error("Invalid sheet uri: {0}")]
    InvalidSheetUri(String),

    #[error("Spreadsheet not found: {id}")]
    SpreadsheetNotFound { id: String },

    #[error("Sheet not found: {name}")]
    SheetNotFound { name: String },

    #[error("Sheet already exists: {name}")]
    SheetAlreadyExists { name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SheetError>;
