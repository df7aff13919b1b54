//! geosniff: output format sniffing and GeoJSON conversion
//!
//! Classifies an opaque output value (structured data, JSON text, CSV, XML,
//! plain text or raw bytes), normalizes it into records and converts those
//! records into a GeoJSON `Feature` or `FeatureCollection` according to a
//! declarative geometry-mapping specification.

pub mod cli;
pub mod conversion;
pub mod error;
pub mod loader;
pub mod parser;
pub mod validation;

// Re-export commonly used types
pub use conversion::{
    to_geo, ConversionConfig, ConversionMetadata, ConversionResult, ConversionSpec, GeoConverter,
    GeoData, GeometryKind,
};
pub use error::{ConversionError, ConversionErrorKind, ParseError};
pub use loader::{LoadReport, LoadedOutput, OutputLoader};
pub use parser::{CellOutput, DataFormat, FormatSniffer, OutputItem, OutputSource, SniffedData};

/// Load a JSON value with the default loader configuration
pub fn load_value(value: &serde_json::Value) -> Result<LoadedOutput, ConversionError> {
    OutputLoader::new().load(&CellOutput::from_value(value))
}

/// Load raw text with a custom configuration
pub fn load_text(text: &str, config: &ConversionConfig) -> Result<LoadedOutput, ConversionError> {
    OutputLoader::with_config(config.clone()).load(&CellOutput::from_text("text/plain", text))
}
