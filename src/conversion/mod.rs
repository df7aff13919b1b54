//! Records to GeoJSON conversion module
//!
//! This module contains the geometry specification, rule resolution,
//! geometry building, feature assembly and the conversion engine.

pub mod assembler;
pub mod builder;
pub mod config;
pub mod engine;
pub mod limits;
pub mod resolver;
pub mod spec;

pub use builder::{Geometry, GeometryBuilder, GeometryError};
pub use config::ConversionConfig;
pub use engine::{to_geo, ConversionMetadata, GeoConverter, GeoData};
pub use resolver::{resolve, ConversionSettings, GeometryFieldSet, Locator, ResolvedSpec};
pub use spec::{ConversionSpec, GeometryKind};

pub use crate::error::ConversionResult;
