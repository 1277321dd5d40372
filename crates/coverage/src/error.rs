use std::fmt;

#[derive(Debug)]
pub enum CoverageError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty column name, duplicate prefix, etc.).
    ConfigValidation(String),
    /// Missing required column in an input table.
    MissingColumn { table: String, column: String },
    /// A cell that must hold a number could not be parsed.
    InvalidNumber {
        table: String,
        row: usize,
        column: String,
        value: String,
    },
    /// Targets text could not be parsed.
    TargetsParse { line: usize, message: String },
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for CoverageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { table, column } => {
                write!(f, "{table}: missing column '{column}'")
            }
            Self::InvalidNumber { table, row, column, value } => {
                write!(f, "{table}, row {row}: cannot parse '{column}' value '{value}' as a number")
            }
            Self::TargetsParse { line, message } => {
                write!(f, "targets, line {line}: {message}")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for CoverageError {}
