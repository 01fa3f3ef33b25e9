use thiserror::Error;

#[derive(Error, Debug)]
pub enum HaushaltError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("No header row found in {0}")]
    HeaderNotFound(String),

    #[error("Required column '{column}' not found in {file}")]
    MissingColumn { file: String, column: &'static str },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, HaushaltError>;
