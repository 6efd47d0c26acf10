// Error kinds for table access and chart rendering

use thiserror::Error;

/// A data-quality precondition the sales table failed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidDataError {
    #[error("DataFrame is empty, lacks sales data, or sales data is not numeric.")]
    EmptyOrNonNumeric,
    #[error("DataFrame contains duplicate entries in the category column.")]
    DuplicateCategories,
}

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Column '{name}' not found")]
    ColumnNotFound { name: String },
    #[error("Malformed table: {0}")]
    Malformed(String),
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors returned by [`crate::report::Renderer::render`].
#[derive(Error, Debug)]
pub enum ChartError {
    #[error(transparent)]
    InvalidData(#[from] InvalidDataError),
    #[error("Column '{name}' not found")]
    ColumnNotFound { name: String },
    #[error(transparent)]
    Table(TableError),
    #[error("Failed to display chart: {0:#}")]
    Display(#[source] anyhow::Error),
}

impl From<TableError> for ChartError {
    fn from(err: TableError) -> Self {
        match err {
            TableError::ColumnNotFound { name } => ChartError::ColumnNotFound { name },
            other => ChartError::Table(other),
        }
    }
}

impl ChartError {
    pub fn is_invalid_data(&self) -> bool {
        matches!(self, ChartError::InvalidData(_))
    }

    pub fn is_column_not_found(&self) -> bool {
        matches!(self, ChartError::ColumnNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_data_messages() {
        assert_eq!(
            InvalidDataError::EmptyOrNonNumeric.to_string(),
            "DataFrame is empty, lacks sales data, or sales data is not numeric."
        );
        assert_eq!(
            InvalidDataError::DuplicateCategories.to_string(),
            "DataFrame contains duplicate entries in the category column."
        );
    }

    #[test]
    fn test_column_not_found_converts_to_chart_error() {
        let err: ChartError = TableError::ColumnNotFound {
            name: "Region".to_string(),
        }
        .into();
        assert!(err.is_column_not_found());
        assert_eq!(err.to_string(), "Column 'Region' not found");
    }

    #[test]
    fn test_malformed_stays_table_error() {
        let err: ChartError = TableError::Malformed("ragged row".to_string()).into();
        assert!(matches!(err, ChartError::Table(TableError::Malformed(_))));
        assert!(!err.is_invalid_data());
    }

    #[test]
    fn test_invalid_data_is_transparent() {
        let err = ChartError::from(InvalidDataError::DuplicateCategories);
        assert!(err.is_invalid_data());
        assert_eq!(
            err.to_string(),
            "DataFrame contains duplicate entries in the category column."
        );
    }
}
