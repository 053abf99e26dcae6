use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DrtPrepError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("no {marker} table found in {path}")]
    MissingTable { path: PathBuf, marker: String },

    #[error("failed to parse table in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("hash registry unreadable: {path}: {message}")]
    RegistryCorruption { path: PathBuf, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },

    #[error("Permission denied: {path}")]
    Permission { path: String },
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for DrtPrepError {
    fn user_message(&self) -> String {
        match self {
            DrtPrepError::MissingTable { path, marker } => {
                format!("No {} data block found in {}", marker, path.display())
            }
            DrtPrepError::Parse { path, message } => {
                format!("Could not parse table in {}: {}", path.display(), message)
            }
            DrtPrepError::RegistryCorruption { path, message } => {
                format!(
                    "Hash registry at {} is unreadable: {}",
                    path.display(),
                    message
                )
            }
            DrtPrepError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            DrtPrepError::InvalidPath { path } => {
                format!("Invalid path: {}", path)
            }
            DrtPrepError::Permission { path } => {
                format!("Permission denied accessing: {}", path)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            DrtPrepError::MissingTable { .. } => Some(
                "Verify the file is an instrument export containing the marker token, or adjust [parser].marker in the configuration.".to_string()
            ),
            DrtPrepError::RegistryCorruption { .. } => Some(
                "The registry is the dedup source of truth and will not be silently replaced. Restore it from a backup, or delete it deliberately to re-convert everything.".to_string()
            ),
            DrtPrepError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present.".to_string()
            ),
            DrtPrepError::Permission { .. } => Some(
                "Ensure you have read access to the input tree and write access to the output directory.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<csv::Error> for DrtPrepError {
    fn from(error: csv::Error) -> Self {
        match error.into_kind() {
            csv::ErrorKind::Io(io_error) => DrtPrepError::Io(io_error),
            other => DrtPrepError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("CSV write failed: {:?}", other),
            )),
        }
    }
}

impl From<toml::de::Error> for DrtPrepError {
    fn from(error: toml::de::Error) -> Self {
        DrtPrepError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DrtPrepError>;
