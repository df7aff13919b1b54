//! Format sniffing for opaque output items
//!
//! [`FormatSniffer::sniff`] runs a fixed sequence of best-effort hypotheses
//! over an [`OutputItem`] and returns a [`SniffedOutput`]. Every failed step
//! is logged and the next hypothesis is tried; sniffing itself never fails.

use super::delimited::{is_csv, parse_csv};
use super::repair::{parse_json_text, preview};
use super::xml::{is_xml, parse_xml};
use super::OutputItem;
use serde_json::Value;
use std::fmt;

/// Detected format of an output item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFormat {
    /// Single JSON object
    Json,
    /// JSON array of records
    JsonArray,
    /// Already a GeoJSON collection
    GeoJson,
    Csv,
    Xml,
    /// Literal text with no recognized structure
    Text,
    Binary,
    /// Nothing to show
    Empty,
}

impl DataFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataFormat::Json => "JSON",
            DataFormat::JsonArray => "JSON array",
            DataFormat::GeoJson => "GeoJSON",
            DataFormat::Csv => "CSV",
            DataFormat::Xml => "XML",
            DataFormat::Text => "text",
            DataFormat::Binary => "binary",
            DataFormat::Empty => "empty",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized shape of a sniffed output item
#[derive(Debug, Clone, PartialEq)]
pub enum SniffedData {
    /// Value exposing a non-empty `features` array, passed through unchanged
    GeoJson(Value),
    /// Sequence of records
    Records(Vec<Value>),
    /// One record (JSON object or parsed XML document)
    Record(Value),
    /// Literal text for plain display
    Text(String),
    /// Raw bytes with no textual content
    Binary(Vec<u8>),
    Empty,
}

impl SniffedData {
    /// Structured form of the data, if it has one
    pub fn to_value(&self) -> Option<Value> {
        match self {
            SniffedData::GeoJson(value) | SniffedData::Record(value) => Some(value.clone()),
            SniffedData::Records(records) => Some(Value::Array(records.clone())),
            _ => None,
        }
    }
}

/// Result of sniffing one output item
#[derive(Debug, Clone, PartialEq)]
pub struct SniffedOutput {
    pub format: DataFormat,
    pub data: SniffedData,
}

impl SniffedOutput {
    fn new(format: DataFormat, data: SniffedData) -> Self {
        Self { format, data }
    }

    pub fn empty() -> Self {
        Self::new(DataFormat::Empty, SniffedData::Empty)
    }
}

/// Classifies output items
#[derive(Debug, Default, Clone, Copy)]
pub struct FormatSniffer;

impl FormatSniffer {
    pub fn new() -> Self {
        Self
    }

    /// Determine the effective format of an output item
    pub fn sniff(&self, item: &dyn OutputItem) -> SniffedOutput {
        log::debug!("Sniffing output item of type {}", item.mime());

        let sniffed = self
            .sniff_structured(item)
            .or_else(|| self.sniff_text(&item.text()))
            .unwrap_or_else(|| Self::sniff_bytes(item.data()));

        log::info!("Detected data format: {}", sniffed.format);
        sniffed
    }

    /// Structured accessor; a JSON string payload goes through text repair
    fn sniff_structured(&self, item: &dyn OutputItem) -> Option<SniffedOutput> {
        match item.json() {
            Ok(Value::String(text)) => {
                log::debug!("Structured data is a string, reparsing: {}", preview(&text));
                self.sniff_text(&text)
            }
            Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(self.normalize(value)),
            Ok(scalar) => {
                log::debug!("Structured data is a scalar ({}), treating as text", scalar);
                None
            }
            Err(e) => {
                log::debug!("No structured data: {}", e);
                None
            }
        }
    }

    /// Text hypotheses: JSON (with repair), XML, CSV, then literal text
    pub fn sniff_text(&self, text: &str) -> Option<SniffedOutput> {
        if text.is_empty() {
            return None;
        }
        log::debug!("Sniffing text: {}", preview(text));

        match parse_json_text(text) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => return Some(self.normalize(value)),
            Ok(Value::String(inner)) => return Self::classify_text(&inner),
            Ok(_) => {}
            Err(e) => log::debug!("JSON parse failed: {}", e),
        }

        Self::classify_text(text)
    }

    /// Data envelope unwrap, GeoJSON short-circuit, then record shape
    fn normalize(&self, value: Value) -> SniffedOutput {
        let value = match value {
            Value::Object(mut envelope) if envelope.get("data").is_some_and(is_truthy) => {
                log::debug!("Unwrapping data envelope");
                envelope.remove("data").unwrap_or(Value::Null)
            }
            other => other,
        };

        if has_features(&value) {
            return SniffedOutput::new(DataFormat::GeoJson, SniffedData::GeoJson(value));
        }

        match value {
            Value::Array(records) => {
                SniffedOutput::new(DataFormat::JsonArray, SniffedData::Records(records))
            }
            Value::Object(_) => SniffedOutput::new(DataFormat::Json, SniffedData::Record(value)),
            Value::String(text) => {
                Self::classify_text(&text).unwrap_or_else(SniffedOutput::empty)
            }
            scalar => SniffedOutput::new(DataFormat::Text, SniffedData::Text(scalar.to_string())),
        }
    }

    /// XML, CSV or literal text
    ///
    /// A document carrying the XML prologue is never tried as CSV, and CSV
    /// without any data row is not taken as a match.
    fn classify_text(text: &str) -> Option<SniffedOutput> {
        if is_xml(text) {
            match parse_xml(text) {
                Ok(document) => {
                    return Some(SniffedOutput::new(DataFormat::Xml, SniffedData::Record(document)))
                }
                Err(e) => log::warn!("XML parse error: {}", e),
            }
        } else if is_csv(text) {
            match parse_csv(text) {
                Ok(records) if records.is_empty() => {
                    log::debug!("CSV header without rows, keeping text")
                }
                Ok(records) => {
                    return Some(SniffedOutput::new(DataFormat::Csv, SniffedData::Records(records)))
                }
                Err(e) => log::warn!("CSV parse error: {}", e),
            }
        }

        if text.is_empty() || text == "{}" || text.starts_with("<Buffer ") {
            return None;
        }

        Some(SniffedOutput::new(
            DataFormat::Text,
            SniffedData::Text(text.to_string()),
        ))
    }

    fn sniff_bytes(bytes: &[u8]) -> SniffedOutput {
        if bytes.is_empty() {
            return SniffedOutput::empty();
        }
        log::debug!("Falling back to {} raw byte(s)", bytes.len());
        SniffedOutput::new(DataFormat::Binary, SniffedData::Binary(bytes.to_vec()))
    }
}

/// Value exposes a non-empty `features` array
pub fn has_features(value: &Value) -> bool {
    value
        .get("features")
        .and_then(Value::as_array)
        .is_some_and(|features| !features.is_empty())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
