//! Output loading: sniff an output item, then convert it to GeoJSON
//!
//! [`OutputLoader`] is the single entry point a host calls. It sniffs the
//! item, passes already-geo data through, converts records with the
//! configured geometry specification and falls back to the original data
//! when no geometry can be produced.

use serde_json::Value;

use crate::conversion::limits::check_size;
use crate::conversion::{ConversionConfig, ConversionMetadata, GeoConverter};
use crate::error::ConversionResult;
use crate::parser::{DataFormat, FormatSniffer, OutputItem, SniffedData};
use crate::validation::{GeoJsonValidator, IssueSeverity, ValidationReport};

/// What the host should display
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedOutput {
    /// A `Feature` or `FeatureCollection`, produced or passed through
    GeoJson(Value),
    /// Structured data without usable geometry
    Data(Value),
    Text(String),
    Binary(Vec<u8>),
    Empty,
}

impl LoadedOutput {
    /// Short name of the variant, for logs and stats
    pub fn kind(&self) -> &'static str {
        match self {
            LoadedOutput::GeoJson(_) => "GeoJSON",
            LoadedOutput::Data(_) => "data",
            LoadedOutput::Text(_) => "text",
            LoadedOutput::Binary(_) => "binary",
            LoadedOutput::Empty => "empty",
        }
    }

    pub fn is_geojson(&self) -> bool {
        matches!(self, LoadedOutput::GeoJson(_))
    }

    /// Whether the output is a collection with at least one feature
    pub fn has_features(&self) -> bool {
        match self {
            LoadedOutput::GeoJson(value) => value
                .get("features")
                .and_then(Value::as_array)
                .is_some_and(|features| !features.is_empty()),
            _ => false,
        }
    }

    /// Structured value, if any
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            LoadedOutput::GeoJson(value) | LoadedOutput::Data(value) => Some(value),
            _ => None,
        }
    }

    /// Bytes to write out: JSON is rendered per the config, text and binary
    /// payloads are written as-is
    pub fn to_bytes(&self, config: &ConversionConfig) -> Vec<u8> {
        match self {
            LoadedOutput::GeoJson(value) | LoadedOutput::Data(value) => {
                config.render(value).into_bytes()
            }
            LoadedOutput::Text(text) => text.clone().into_bytes(),
            LoadedOutput::Binary(bytes) => bytes.clone(),
            LoadedOutput::Empty => Vec::new(),
        }
    }
}

/// Loaded output together with what was learned on the way
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub output: LoadedOutput,
    /// Format detected by the sniffer
    pub format: DataFormat,
    /// Present when a conversion ran
    pub metadata: Option<ConversionMetadata>,
    /// Present when produced GeoJSON was checked
    pub validation: Option<ValidationReport>,
}

impl LoadReport {
    fn passthrough(output: LoadedOutput, format: DataFormat) -> Self {
        Self {
            output,
            format,
            metadata: None,
            validation: None,
        }
    }
}

/// Loads notebook-style output items
#[derive(Debug, Clone, Default)]
pub struct OutputLoader {
    config: ConversionConfig,
    sniffer: FormatSniffer,
    converter: GeoConverter,
}

impl OutputLoader {
    /// Create a loader with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader with a custom configuration
    pub fn with_config(config: ConversionConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Load an output item
    ///
    /// Specification, CRS and (under the throwing policy) geometry errors
    /// are propagated; everything else degrades to a pass-through output.
    pub fn load(&self, item: &dyn OutputItem) -> ConversionResult<LoadedOutput> {
        self.load_detailed(item).map(|report| report.output)
    }

    /// Like [`OutputLoader::load`], also returning format and conversion metadata
    pub fn load_detailed(&self, item: &dyn OutputItem) -> ConversionResult<LoadReport> {
        check_size(item.data().len(), &self.config)?;
        self.dispatch(item, false)
    }

    /// Load an output item without ever failing
    ///
    /// A conversion error is logged and the sniffed data is returned as-is.
    pub fn load_lossy(&self, item: &dyn OutputItem) -> LoadReport {
        if let Err(e) = check_size(item.data().len(), &self.config) {
            log::warn!("Output not loaded: {}", e);
            return LoadReport::passthrough(LoadedOutput::Empty, DataFormat::Empty);
        }

        match self.dispatch(item, true) {
            Ok(report) => report,
            Err(e) => {
                // dispatch recovers every conversion error in lossy mode
                log::warn!("Output not loaded: {}", e);
                LoadReport::passthrough(LoadedOutput::Empty, DataFormat::Empty)
            }
        }
    }

    fn dispatch(&self, item: &dyn OutputItem, lossy: bool) -> ConversionResult<LoadReport> {
        let sniffed = self.sniffer.sniff(item);
        let format = sniffed.format;

        let output = match sniffed.data {
            SniffedData::GeoJson(value) => {
                log::debug!("Output is already GeoJSON, skipping conversion");
                LoadedOutput::GeoJson(value)
            }
            SniffedData::Records(records) => {
                return self.convert(Value::Array(records), format, lossy)
            }
            SniffedData::Record(record) => return self.convert(record, format, lossy),
            SniffedData::Text(text) => LoadedOutput::Text(text),
            SniffedData::Binary(bytes) => LoadedOutput::Binary(bytes),
            SniffedData::Empty => LoadedOutput::Empty,
        };

        Ok(LoadReport::passthrough(output, format))
    }

    fn convert(&self, input: Value, format: DataFormat, lossy: bool) -> ConversionResult<LoadReport> {
        let geo = match self.converter.to_geo(&input, &self.config.spec) {
            Ok(geo) => geo,
            Err(e) if lossy => {
                log::warn!("GeoJSON conversion failed, showing data as-is: {}", e);
                return Ok(LoadReport::passthrough(LoadedOutput::Data(input), format));
            }
            Err(e) => return Err(e),
        };

        let usable = if input.is_array() {
            geo.has_features()
        } else {
            geo.has_geometry()
        };

        if !usable {
            log::info!("No geometry found in {} data", format);
            return Ok(LoadReport {
                output: LoadedOutput::Data(input),
                format,
                metadata: Some(geo.metadata),
                validation: None,
            });
        }

        let validation = self.config.validate_output.then(|| {
            let report = GeoJsonValidator::new().validate(&geo.geojson);
            for issue in &report.issues {
                match issue.severity {
                    IssueSeverity::Error => log::warn!("GeoJSON compliance: {}", issue.message),
                    IssueSeverity::Warning => log::debug!("GeoJSON compliance: {}", issue.message),
                }
            }
            report
        });

        Ok(LoadReport {
            output: LoadedOutput::GeoJson(geo.geojson),
            format,
            metadata: Some(geo.metadata),
            validation,
        })
    }
}
