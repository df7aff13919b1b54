//! Command-line interface module

use clap::Parser;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;

use crate::conversion::{ConversionConfig, ConversionResult, ConversionSpec, GeometryKind};
use crate::error::{ConversionError, ConversionErrorKind};

pub mod path_mapping;

/// Main CLI arguments
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "geosniff")]
#[command(about = "Detect the format of output data and convert it to GeoJSON")]
#[command(version)]
#[command(long_about = None)]
pub struct Args {
    /// Input data (inline text, file, or directory)
    #[arg()]
    pub input: Option<String>,

    /// Output file path, or output directory in directory mode (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Read data from standard input
    #[arg(long)]
    pub stdin: bool,

    /// Recursively process directories
    #[arg(long)]
    pub recursive: bool,

    /// Geometry specification file (JSON)
    #[arg(long, conflicts_with_all = ["spec_json", "point"])]
    pub spec: Option<PathBuf>,

    /// Inline geometry specification (JSON)
    #[arg(long, conflicts_with = "point")]
    pub spec_json: Option<String>,

    /// Point fields as LAT,LNG[,ALT] (default: latitude,longitude)
    #[arg(long, value_name = "LAT,LNG[,ALT]")]
    pub point: Option<String>,

    /// Mime type reported for the input (default: guessed from the file extension)
    #[arg(long)]
    pub mime: Option<String>,

    /// Maximum input size (e.g., 100MB, default: 100MB)
    #[arg(long)]
    pub memory_limit: Option<String>,

    /// Disable pretty-printing
    #[arg(long)]
    pub plain: bool,

    /// Only detect the data format, don't convert
    #[arg(long)]
    pub detect_only: bool,

    /// Output conversion statistics
    #[arg(long)]
    pub stats: bool,

    /// Fail when a record yields no geometry
    #[arg(long)]
    pub throw_on_invalid_geometry: bool,

    /// Continue converting other files when one file fails
    #[arg(long)]
    pub continue_on_error: bool,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Suppress non-error output
    #[arg(long)]
    pub quiet: bool,
}

/// CLI configuration
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub args: Args,
    pub conversion_config: ConversionConfig,
}

impl CliConfig {
    /// Create CLI configuration from arguments
    pub fn from_args(args: Args) -> ConversionResult<Self> {
        let conversion_config = Self::create_conversion_config(&args)?;

        Ok(Self {
            args,
            conversion_config,
        })
    }

    /// Check if we should continue on error
    pub fn continue_on_error(&self) -> bool {
        self.args.continue_on_error
    }

    /// Create conversion configuration from CLI arguments
    fn create_conversion_config(args: &Args) -> ConversionResult<ConversionConfig> {
        let memory_limit = parse_memory_limit(&args.memory_limit)?;
        let mut spec = load_spec(args)?;
        if args.throw_on_invalid_geometry {
            spec = spec.with_throw_on_invalid_geometry(true);
        }

        let config = ConversionConfig::new()
            .with_spec(spec)
            .with_memory_limit(memory_limit)
            .with_pretty(!args.plain);

        // Validate configuration
        config
            .validate()
            .map_err(|e| ConversionError::conversion(ConversionErrorKind::configuration(e)))?;

        Ok(config)
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.args.quiet
    }

    /// Check if stats output is requested
    pub fn want_stats(&self) -> bool {
        self.args.stats
    }

    /// Check if only format detection is requested
    pub fn is_detect_only(&self) -> bool {
        self.args.detect_only
    }

    /// Get input source description
    pub fn input_description(&self) -> String {
        if self.args.stdin {
            "standard input".to_string()
        } else if let Some(input) = &self.args.input {
            format!("'{}'", input)
        } else {
            "no input specified".to_string()
        }
    }

    /// Get output destination description
    pub fn output_description(&self) -> String {
        if let Some(output) = &self.args.output {
            format!("'{}'", output.display())
        } else {
            "standard output".to_string()
        }
    }
}

/// Geometry specification from `--spec`, `--spec-json` or `--point`
fn load_spec(args: &Args) -> ConversionResult<ConversionSpec> {
    if let Some(path) = &args.spec {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ConversionError::conversion(ConversionErrorKind::io(
                format!("Failed to read specification: {}", e),
                Some(path.clone()),
            ))
        })?;
        return parse_spec(&text);
    }

    if let Some(text) = &args.spec_json {
        return parse_spec(text);
    }

    if let Some(fields) = &args.point {
        return parse_point_fields(fields);
    }

    Ok(ConversionSpec::loader_default())
}

fn parse_spec(text: &str) -> ConversionResult<ConversionSpec> {
    ConversionSpec::from_json_str(text).map_err(|e| {
        ConversionError::conversion(ConversionErrorKind::configuration(format!(
            "Invalid specification JSON: {}",
            e
        )))
    })
}

/// `lat,lng[,alt]` into a point specification
fn parse_point_fields(fields: &str) -> ConversionResult<ConversionSpec> {
    let names: Vec<&str> = fields
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();

    if !(2..=3).contains(&names.len()) {
        return Err(ConversionError::conversion(ConversionErrorKind::configuration(
            format!("Invalid point fields '{}', expected LAT,LNG[,ALT]", fields),
        )));
    }

    let locator = Value::Array(names.into_iter().map(|name| json!(name)).collect());
    Ok(ConversionSpec::loader_default().with_locator(GeometryKind::Point, locator))
}

/// Parse memory limit string (e.g., "100MB", "1GB", "500KB")
fn parse_memory_limit(limit: &Option<String>) -> ConversionResult<usize> {
    let Some(limit_str) = limit else {
        return Ok(100 * 1024 * 1024); // 100MB default
    };

    let limit_str = limit_str.trim().to_uppercase();
    let invalid = || {
        ConversionError::conversion(ConversionErrorKind::Configuration {
            message: format!("Invalid memory limit: {}", limit_str),
        })
    };

    let scaled = |suffix_len: usize, scale: f64| {
        limit_str[..limit_str.len() - suffix_len]
            .trim()
            .parse::<f64>()
            .map(|size| (size * scale) as usize)
            .map_err(|_| invalid())
    };

    if limit_str.ends_with("GB") {
        scaled(2, 1024.0 * 1024.0 * 1024.0)
    } else if limit_str.ends_with("MB") {
        scaled(2, 1024.0 * 1024.0)
    } else if limit_str.ends_with("KB") {
        scaled(2, 1024.0)
    } else if let Some(bytes) = limit_str.strip_suffix('B') {
        bytes.trim().parse::<usize>().map_err(|_| invalid())
    } else {
        // Assume bytes
        limit_str.parse::<usize>().map_err(|_| invalid())
    }
}

/// CLI utilities and helpers
pub struct CliUtils;

impl CliUtils {
    /// Format a file size in human-readable format
    pub fn format_file_size(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", bytes, UNITS[unit_index])
        } else {
            format!("{:.1} {}", size, UNITS[unit_index])
        }
    }

    /// Format a duration in human-readable format
    pub fn format_duration(duration: Duration) -> String {
        let total_millis = duration.as_millis();

        if total_millis < 1000 {
            format!("{}ms", total_millis)
        } else if total_millis < 60_000 {
            format!("{:.1}s", total_millis as f64 / 1000.0)
        } else {
            let minutes = total_millis / 60_000;
            let seconds = (total_millis % 60_000) / 1000;
            format!("{}m {}s", minutes, seconds)
        }
    }

    /// Create a progress bar for file processing
    pub fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
        let pb = indicatif::ProgressBar::new(total);
        let style = indicatif::ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb
    }

    /// Show a success message (if not in quiet mode)
    pub fn show_success(message: &str, quiet: bool) {
        if !quiet {
            eprintln!("✓ {}", message);
        }
    }

    /// Show an error message
    pub fn show_error(message: &str) {
        eprintln!("✗ {}", message);
    }

    /// Show a warning message (if not in quiet mode)
    pub fn show_warning(message: &str, quiet: bool) {
        if !quiet {
            eprintln!("⚠ {}", message);
        }
    }
}

/// Handle CLI errors with user-friendly messages
pub fn handle_error(error: &ConversionError) {
    let message = error.user_message();
    CliUtils::show_error(&message);

    // Provide helpful suggestions
    match error.kind() {
        Some(ConversionErrorKind::InvalidSpecification { .. }) => {
            eprintln!("\nTip: Map a geometry type, e.g. --point lat,lng or --spec-json '{{\"Point\": [\"lat\", \"lng\"]}}'");
        }
        Some(ConversionErrorKind::InvalidGeometry { .. }) => {
            eprintln!("\nTip: Drop --throw-on-invalid-geometry to skip records without coordinates");
        }
        Some(ConversionErrorKind::JsonTooLarge { .. }) => {
            eprintln!("\nTip: Use --memory-limit to increase memory allowance");
        }
        _ => {}
    }

    // Show usage hint
    eprintln!("\nTry 'geosniff --help' for usage information.");
}
