//! Core conversion engine: records to GeoJSON

use std::time::Instant;

use serde_json::Value;

use crate::conversion::assembler::{add_optional_properties, build_collection, build_feature};
use crate::conversion::builder::{Geometry, GeometryBuilder, GeometryError};
use crate::conversion::resolver::{resolve, ResolvedSpec};
use crate::conversion::spec::ConversionSpec;
use crate::error::{ConversionError, ConversionErrorKind, ConversionResult};

/// Conversion result
#[derive(Debug, Clone)]
pub struct GeoData {
    pub geojson: Value,
    pub metadata: ConversionMetadata,
}

impl GeoData {
    /// Whether the output is a collection with at least one feature
    pub fn has_features(&self) -> bool {
        self.geojson
            .get("features")
            .and_then(Value::as_array)
            .map_or(false, |features| !features.is_empty())
    }

    /// Whether the output is a single feature with a usable geometry
    pub fn has_geometry(&self) -> bool {
        self.geojson
            .get("geometry")
            .map_or(false, |geometry| geometry.get("type").is_some())
    }
}

/// Metadata about one conversion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionMetadata {
    pub record_count: usize,
    pub feature_count: usize,
    pub dropped_count: usize,
    pub processing_time_ms: u64,
}

/// Records to GeoJSON converter
///
/// Holds only the defaults merged under every specification; all
/// per-conversion state is created inside [`GeoConverter::to_geo`].
#[derive(Debug, Clone)]
pub struct GeoConverter {
    defaults: ConversionSpec,
}

impl Default for GeoConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl GeoConverter {
    /// Create a converter with the standard defaults
    pub fn new() -> Self {
        Self {
            defaults: ConversionSpec::converter_defaults(),
        }
    }

    /// Create a converter with custom defaults
    pub fn with_defaults(defaults: ConversionSpec) -> Self {
        Self { defaults }
    }

    /// Convert a record or an array of records to GeoJSON
    ///
    /// An array becomes a `FeatureCollection`; anything else becomes a single
    /// `Feature`.
    pub fn to_geo(&self, input: &Value, spec: &ConversionSpec) -> ConversionResult<GeoData> {
        let start_time = Instant::now();

        let settings = spec.apply_defaults(&self.defaults);
        let resolved = resolve(&settings)?;
        let builder = GeometryBuilder::new(&resolved);

        let (mut geojson, mut metadata) = match input {
            Value::Array(records) => self.collection(records, &builder, &resolved)?,
            record => {
                let geometry = build_or_empty(&builder, record)?;
                let metadata = ConversionMetadata {
                    record_count: 1,
                    feature_count: usize::from(geometry.is_valid()),
                    ..Default::default()
                };
                (build_feature(record, &geometry, &resolved), metadata)
            }
        };

        add_optional_properties(&mut geojson, &resolved.settings)?;

        metadata.processing_time_ms = start_time.elapsed().as_millis() as u64;
        log::info!(
            "Converted {} record(s) to {} feature(s), dropped {}",
            metadata.record_count,
            metadata.feature_count,
            metadata.dropped_count
        );

        Ok(GeoData { geojson, metadata })
    }

    fn collection(
        &self,
        records: &[Value],
        builder: &GeometryBuilder<'_>,
        resolved: &ResolvedSpec,
    ) -> ConversionResult<(Value, ConversionMetadata)> {
        let mut features = Vec::with_capacity(records.len());
        let mut metadata = ConversionMetadata {
            record_count: records.len(),
            ..Default::default()
        };

        for record in records {
            let geometry = build_or_empty(builder, record)?;
            if geometry.is_valid() {
                metadata.feature_count += 1;
            } else if resolved.settings.remove_invalid_geometries {
                metadata.dropped_count += 1;
                continue;
            }
            features.push(build_feature(record, &geometry, resolved));
        }

        if metadata.dropped_count > 0 {
            log::debug!(
                "Dropped {} record(s) without geometry",
                metadata.dropped_count
            );
        }

        Ok((build_collection(features), metadata))
    }
}

/// Unresolved dot-paths are recovered as empty geometry; an invalid geometry
/// under the throwing policy is escalated
fn build_or_empty(builder: &GeometryBuilder<'_>, record: &Value) -> ConversionResult<Geometry> {
    match builder.build(record) {
        Ok(geometry) => Ok(geometry),
        Err(GeometryError::UnresolvedPath { path }) => {
            log::debug!("Record skipped, path '{}' not found", path);
            Ok(Geometry::Empty)
        }
        Err(GeometryError::Invalid { record, spec }) => Err(ConversionError::conversion(
            ConversionErrorKind::invalid_geometry(&record, &spec),
        )),
    }
}

/// Convert with the standard converter defaults
pub fn to_geo(input: &Value, spec: &ConversionSpec) -> ConversionResult<GeoData> {
    GeoConverter::new().to_geo(input, spec)
}
