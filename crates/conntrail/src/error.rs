use thiserror::Error;

use crate::classify::ColumnRole;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("CSV content is empty")]
    EmptyInput,

    #[error(
        "unable to auto-detect required columns: {missing:?} across {columns} column(s); \
         data is too ambiguous, please provide proper headers"
    )]
    Classification {
        missing: Vec<ColumnRole>,
        columns: usize,
    },

    #[error("missing required columns: {missing:?}; available headers: {headers:?}")]
    MissingColumns {
        missing: Vec<ColumnRole>,
        headers: Vec<String>,
    },

    #[error(
        "CSV structure error: header row has {header_cols} columns but data row {row} \
         has {row_cols} columns"
    )]
    Structure {
        header_cols: usize,
        row: usize,
        row_cols: usize,
    },
}

// Convenience type alias
pub type ConvertResult<T> = Result<T, ConvertError>;
