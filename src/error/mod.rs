//! Error types and handling infrastructure for output sniffing and GeoJSON conversion

use anyhow::Error;
use std::fmt;
use std::path::PathBuf;

/// Core error types for the conversion process
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConversionErrorKind {
    #[error("Invalid specification: {message}")]
    InvalidSpecification { message: String },

    #[error("Invalid CRS: {message}")]
    InvalidCrs { message: String },

    #[error("Invalid geometry: item: {record}\n params: {spec}")]
    InvalidGeometry { record: String, spec: String },

    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
    },

    #[error("Input too large: {size} bytes (limit: {limit} bytes)")]
    JsonTooLarge { size: usize, limit: usize },

    #[error("Invalid configuration: {message}")]
    Configuration { message: String },
}

impl ConversionErrorKind {
    pub fn invalid_specification(message: impl Into<String>) -> Self {
        Self::InvalidSpecification {
            message: message.into(),
        }
    }

    pub fn invalid_crs(message: impl Into<String>) -> Self {
        Self::InvalidCrs {
            message: message.into(),
        }
    }

    /// Invalid geometry carrying the offending record and the settings used
    pub fn invalid_geometry(record: &serde_json::Value, spec: &serde_json::Value) -> Self {
        Self::InvalidGeometry {
            record: serde_json::to_string_pretty(record).unwrap_or_else(|_| record.to_string()),
            spec: serde_json::to_string_pretty(spec).unwrap_or_else(|_| spec.to_string()),
        }
    }

    pub fn io(message: String, path: Option<PathBuf>) -> Self {
        Self::Io { message, path }
    }

    pub fn configuration(message: String) -> Self {
        Self::Configuration { message }
    }
}

/// Main error type for conversion operations
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error(transparent)]
    ParseError(#[from] ParseError),

    #[error("{kind}")]
    Conversion {
        kind: ConversionErrorKind,
        source: Option<anyhow::Error>,
    },

    #[error(transparent)]
    Other(#[from] Error),
}

impl ConversionError {
    pub fn parse(message: String, location: Option<(usize, usize)>) -> Self {
        Self::ParseError(ParseError::new(message, location))
    }

    pub fn conversion(kind: ConversionErrorKind) -> Self {
        Self::Conversion { kind, source: None }
    }

    pub fn conversion_with_source(kind: ConversionErrorKind, source: anyhow::Error) -> Self {
        Self::Conversion {
            kind,
            source: Some(source),
        }
    }

    pub fn other(error: Error) -> Self {
        Self::Other(error)
    }

    /// Error kind, when this is a conversion error
    pub fn kind(&self) -> Option<&ConversionErrorKind> {
        match self {
            Self::Conversion { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// Create a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::ParseError(err) => {
                if let Some((line, col)) = err.location {
                    format!(
                        "Parse error at line {}, column {}: {}",
                        line, col, err.message
                    )
                } else {
                    format!("Parse error: {}", err.message)
                }
            }
            Self::Conversion { kind, .. } => match kind {
                ConversionErrorKind::InvalidSpecification { message } => {
                    format!("Invalid geometry specification: {}", message)
                }
                ConversionErrorKind::InvalidCrs { message } => {
                    format!("Invalid coordinate reference system: {}", message)
                }
                ConversionErrorKind::InvalidGeometry { record, .. } => {
                    format!("No geometry could be built for record:\n{}", record)
                }
                ConversionErrorKind::JsonTooLarge { size, limit } => {
                    format!("Input too large: {} bytes (limit: {} bytes)", size, limit)
                }
                _ => self.to_string(),
            },
            Self::Other(err) => {
                format!("Unexpected error: {}", err)
            }
        }
    }
}

/// Parsing errors raised while sniffing a data format
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub location: Option<(usize, usize)>,
    pub input_preview: Option<String>,
}

impl ParseError {
    pub fn new(message: String, location: Option<(usize, usize)>) -> Self {
        Self {
            message,
            location,
            input_preview: None,
        }
    }

    pub fn with_preview(mut self, preview: String) -> Self {
        self.input_preview = Some(preview);
        self
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(error: serde_json::Error) -> Self {
        let location = match error.line() {
            0 => None,
            line => Some((line, error.column())),
        };
        Self::new(format!("Invalid JSON: {}", error), location)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some((line, col)) = self.location {
            write!(f, " at line {}, column {}", line, col)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Result type for conversion operations
pub type ConversionResult<T> = Result<T, ConversionError>;

/// Convenience result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;
