//! Configuration options for output loading and GeoJSON conversion

use crate::conversion::spec::ConversionSpec;

/// Conversion configuration options
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Geometry-mapping specification
    pub spec: ConversionSpec,
    /// Maximum input size in bytes
    pub memory_limit: usize,
    /// Pretty-print output (vs compact)
    pub pretty: bool,
    /// Check produced GeoJSON against RFC 7946 shapes and log the issues
    pub validate_output: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            spec: ConversionSpec::loader_default(),
            memory_limit: 100 * 1024 * 1024, // 100MB
            pretty: true,
            validate_output: true,
        }
    }
}

impl ConversionConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration for batch processing
    pub fn batch_processing() -> Self {
        Self {
            memory_limit: 512 * 1024 * 1024, // 512MB
            pretty: false,
            validate_output: false,
            ..Default::default()
        }
    }

    /// Set the geometry-mapping specification
    pub fn with_spec(mut self, spec: ConversionSpec) -> Self {
        self.spec = spec;
        self
    }

    /// Set memory limit
    pub fn with_memory_limit(mut self, limit_bytes: usize) -> Self {
        self.memory_limit = limit_bytes;
        self
    }

    /// Enable/disable pretty printing
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Enable/disable output validation
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate_output = validate;
        self
    }

    /// Validate configuration consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.memory_limit < 1024 {
            return Err("Memory limit must be at least 1KB".to_string());
        }

        if !self.spec.has_geometry() {
            return Err("Specification must map at least one geometry type".to_string());
        }

        Ok(())
    }

    /// Render a JSON value according to the `pretty` setting
    pub fn render(&self, value: &serde_json::Value) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|_| value.to_string())
    }
}
