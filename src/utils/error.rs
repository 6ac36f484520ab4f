use thiserror::Error;

use crate::core::assignment::AssignmentError;

#[derive(Error, Debug)]
pub enum SantaError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Roster error: {message}")]
    RosterError { message: String },

    #[error(transparent)]
    AssignmentError(#[from] AssignmentError),

    #[error("Failed to deliver message to {destination}: {message}")]
    DeliveryError {
        destination: String,
        message: String,
    },
}

/// 錯誤分類，決定 CLI 的輸出與退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Assignment,
    Delivery,
}

impl SantaError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SantaError::ConfigError { .. }
            | SantaError::MissingConfigError { .. }
            | SantaError::InvalidConfigValueError { .. }
            | SantaError::TomlError(_) => ErrorCategory::Configuration,
            SantaError::IoError(_) | SantaError::CsvError(_) | SantaError::RosterError { .. } => {
                ErrorCategory::Input
            }
            SantaError::AssignmentError(AssignmentError::InvalidInput { .. }) => {
                ErrorCategory::Input
            }
            SantaError::AssignmentError(AssignmentError::AssignmentFailed { .. }) => {
                ErrorCategory::Assignment
            }
            SantaError::DeliveryError { .. } => ErrorCategory::Delivery,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration => 1,
            ErrorCategory::Assignment => 2,
            ErrorCategory::Delivery => 3,
            ErrorCategory::Input => 4,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SantaError::IoError(e) if e.kind() == std::io::ErrorKind::NotFound => {
                "Participant file not found".to_string()
            }
            SantaError::AssignmentError(AssignmentError::AssignmentFailed {
                infeasible: true,
                ..
            }) => "No valid Secret Santa assignment exists for this group".to_string(),
            SantaError::AssignmentError(AssignmentError::AssignmentFailed { attempts, .. }) => {
                format!(
                    "Could not find a valid Secret Santa assignment after {} attempts",
                    attempts
                )
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SantaError::IoError(_) => "Check that the participant CSV exists and is readable",
            SantaError::CsvError(_) | SantaError::RosterError { .. } => {
                "Fix the reported rows in the participant CSV and run again"
            }
            SantaError::TomlError(_) => "Check the syntax of the configuration file",
            SantaError::ConfigError { .. }
            | SantaError::MissingConfigError { .. }
            | SantaError::InvalidConfigValueError { .. } => {
                "Review the command line flags, environment variables and config file"
            }
            SantaError::AssignmentError(AssignmentError::InvalidInput { .. }) => {
                "Make sure there are at least two participants and couples have exactly two members"
            }
            SantaError::AssignmentError(AssignmentError::AssignmentFailed {
                infeasible: true,
                ..
            }) => "Add more participants or remove couple constraints",
            SantaError::AssignmentError(AssignmentError::AssignmentFailed { .. }) => {
                "Run again or increase --max-attempts"
            }
            SantaError::DeliveryError { .. } => {
                "Check AWS credentials, region and SMS permissions, then run again"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SantaError>;
