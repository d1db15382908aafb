use thiserror::Error;

#[derive(Error, Debug)]
pub enum AllocError {
    #[error("Invalid format for {field} '{value}': {reason}")]
    InvalidFormat {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{table} is missing required columns: {}", columns.join(", "))]
    MissingColumns { table: String, columns: Vec<String> },

    #[error("Required input not found: {path}")]
    MissingInput { path: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field} '{value}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AllocError {
    pub fn invalid_format(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidFormat {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidFormat { .. }
            | Self::MissingColumns { .. }
            | Self::MissingInput { .. }
            | Self::CsvError(_) => ErrorCategory::Input,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) | Self::SerializationError(_) | Self::ProcessingError { .. } => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => match self {
                // 被中斷的 I/O 重跑即可
                Self::IoError(e) if e.kind() == std::io::ErrorKind::Interrupted => {
                    ErrorSeverity::Medium
                }
                _ => ErrorSeverity::Critical,
            },
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::InvalidFormat { field, .. } => format!(
                "Check the value of '{}'; identifiers need a trailing number (e.g. 1MS20CS001) \
                 and capacities must be whole numbers",
                field
            ),
            Self::MissingColumns { table, columns } => format!(
                "Add the column(s) {} to the header row of the {}",
                columns.join(", "),
                table
            ),
            Self::MissingInput { .. } => {
                "Run the seat allocation phase first so its classroom allocation is available"
                    .to_string()
            }
            Self::CsvError(_) => {
                "Make sure the input file is valid CSV with a header row".to_string()
            }
            Self::IoError(_) => {
                "Check that the file exists and the output directory is writable".to_string()
            }
            Self::SerializationError(_) => "Try a different output format (csv or tsv)".to_string(),
            Self::ProcessingError { .. } => "Re-run with --verbose and check the log".to_string(),
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => {
                "Review the configuration file or command-line flags".to_string()
            }
        }
    }

    /// 根據錯誤嚴重程度決定退出碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InvalidFormat { field, value, .. } => {
                format!("The value '{}' given for {} is not in the expected format", value, field)
            }
            Self::MissingColumns { table, columns } => {
                format!("The {} must contain the columns: {}", table, columns.join(", "))
            }
            Self::MissingInput { path } => {
                format!("Classroom allocation not found at '{}'", path)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AllocError>;
