use thiserror::Error;

pub type IntelResult<T> = Result<T, IntelError>;

#[derive(Error, Debug)]
pub enum IntelError {
    #[error("Schema mismatch in {source_name}: row {row} is missing required field `{field}`")]
    SchemaMismatch {
        source_name: String,
        field: String,
        row: usize,
    },

    #[error("Invalid value in {source_name}: row {row} field `{field}` has unparseable value {value:?}")]
    InvalidValue {
        source_name: String,
        field: String,
        row: usize,
        value: String,
    },

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Unknown dimension: {0}")]
    UnknownDimension(String),

    #[error("Unknown sort key: {0}")]
    UnknownSortKey(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl IntelError {
    pub fn schema_mismatch(source_name: &str, field: &str, row: usize) -> Self {
        Self::SchemaMismatch {
            source_name: source_name.to_string(),
            field: field.to_string(),
            row,
        }
    }

    pub fn invalid_value(source_name: &str, field: &str, row: usize, value: &str) -> Self {
        Self::InvalidValue {
            source_name: source_name.to_string(),
            field: field.to_string(),
            row,
            value: value.to_string(),
        }
    }
}

impl From<config::ConfigError> for IntelError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
