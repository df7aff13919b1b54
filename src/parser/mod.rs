//! Output items and format sniffing
//!
//! An [`OutputItem`] is the opaque value handed over by a notebook-style host:
//! a mime type plus structured, text and raw-byte accessors. The
//! [`sniffer`] classifies it.

pub mod delimited;
pub mod directory;
pub mod repair;
pub mod sniffer;
pub mod xml;

use crate::error::{ParseError, ParseResult};
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};

pub use sniffer::{DataFormat, FormatSniffer, SniffedData, SniffedOutput};

/// Opaque output value exposed by the host
pub trait OutputItem {
    /// Mime type reported by the host
    fn mime(&self) -> &str;

    /// Already-structured data; fails when the payload is not JSON
    fn json(&self) -> ParseResult<Value>;

    /// Text representation; empty when the payload is not text
    fn text(&self) -> String;

    /// Raw bytes
    fn data(&self) -> &[u8];
}

/// In-memory output item
#[derive(Debug, Clone, PartialEq)]
pub struct CellOutput {
    mime: String,
    bytes: Vec<u8>,
}

impl CellOutput {
    pub fn from_bytes(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    pub fn from_text(mime: impl Into<String>, text: impl Into<String>) -> Self {
        Self::from_bytes(mime, text.into().into_bytes())
    }

    /// Item whose payload is the JSON serialization of `value`
    pub fn from_value(value: &Value) -> Self {
        Self::from_text("application/json", value.to_string())
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = mime.into();
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl OutputItem for CellOutput {
    fn mime(&self) -> &str {
        &self.mime
    }

    fn json(&self) -> ParseResult<Value> {
        if self.bytes.is_empty() {
            return Err(ParseError::new("Empty output".to_string(), None));
        }
        serde_json::from_slice(&self.bytes).map_err(ParseError::from)
    }

    fn text(&self) -> String {
        std::str::from_utf8(&self.bytes)
            .map(str::to_string)
            .unwrap_or_default()
    }

    fn data(&self) -> &[u8] {
        &self.bytes
    }
}

/// Where an output item is read from
#[derive(Debug, Clone)]
pub enum OutputSource {
    String(String),
    File(PathBuf),
    Stdin,
}

impl OutputSource {
    /// Read this source into an output item
    pub fn read_item(&self) -> ParseResult<CellOutput> {
        match self {
            OutputSource::String(content) => {
                Ok(CellOutput::from_text("text/plain", content.clone()))
            }
            OutputSource::File(path) => {
                let bytes = std::fs::read(path).map_err(|e| {
                    ParseError::new(
                        format!("Failed to read file {}: {}", path.display(), e),
                        None,
                    )
                })?;
                Ok(CellOutput::from_bytes(guess_mime(path), bytes))
            }
            OutputSource::Stdin => {
                let mut buffer = Vec::new();
                std::io::stdin()
                    .read_to_end(&mut buffer)
                    .map_err(|e| ParseError::new(format!("Failed to read stdin: {}", e), None))?;
                Ok(CellOutput::from_bytes("text/plain", buffer))
            }
        }
    }

    /// Get a human-readable description of the source
    pub fn description(&self) -> String {
        match self {
            OutputSource::String(_) => "string input".to_string(),
            OutputSource::File(path) => format!("file: {}", path.display()),
            OutputSource::Stdin => "standard input".to_string(),
        }
    }

    /// Get the estimated size of the source in bytes (if known)
    pub fn estimated_size(&self) -> Option<u64> {
        match self {
            OutputSource::String(s) => Some(s.len() as u64),
            OutputSource::File(path) => std::fs::metadata(path).ok().map(|m| m.len()),
            OutputSource::Stdin => None,
        }
    }
}

/// Mime type from a file extension
pub fn guess_mime(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("json") => "application/json",
        Some("geojson") => "application/geo+json",
        Some("csv") => "text/csv",
        Some("xml") => "application/xml",
        _ => "text/plain",
    }
}
