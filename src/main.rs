use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::Level;
use tracing_log::LogTracer;
use tracing_subscriber::FmtSubscriber;

use geosniff::cli::path_mapping::map_input_to_output;
use geosniff::cli::{handle_error, Args, CliConfig, CliUtils};
use geosniff::conversion::limits::check_source_size_before_read;
use geosniff::parser::directory::find_convertible_files;
use geosniff::parser::{CellOutput, OutputSource};
use geosniff::{ConversionError, FormatSniffer, LoadReport, LoadedOutput, OutputLoader, SniffedData};

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let config = match CliConfig::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            handle_error(&e);
            std::process::exit(2);
        }
    };

    if let Err(e) = run(&config) {
        match e.downcast_ref::<ConversionError>() {
            Some(error) => handle_error(error),
            None => CliUtils::show_error(&format!("{:#}", e)),
        }
        std::process::exit(1);
    }

    Ok(())
}

fn init_logging(args: &Args) -> Result<()> {
    let log_level = if args.debug {
        Level::DEBUG
    } else if args.verbose {
        Level::INFO
    } else if args.quiet {
        Level::ERROR
    } else {
        Level::WARN
    };

    // Bridge logs from the `log` crate to the `tracing` ecosystem.
    LogTracer::init()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn run(config: &CliConfig) -> Result<()> {
    let args = &config.args;
    tracing::info!("Loading {}", config.input_description());

    let source = if args.stdin {
        OutputSource::Stdin
    } else if let Some(input) = &args.input {
        let path = PathBuf::from(input);
        if path.is_dir() {
            return convert_directory(&path, config);
        } else if path.is_file() {
            OutputSource::File(path)
        } else {
            OutputSource::String(input.clone())
        }
    } else {
        return Err(anyhow::anyhow!(
            "No input provided. Use --stdin or provide an input path"
        ));
    };

    let item = read_item(&source, config)?;

    if config.is_detect_only() {
        let sniffed = FormatSniffer::new().sniff(&item);
        println!("{}", sniffed.format);
        if config.want_stats() {
            let count = match &sniffed.data {
                SniffedData::Records(records) => records.len(),
                SniffedData::GeoJson(_) | SniffedData::Record(_) => 1,
                _ => 0,
            };
            eprintln!("Records: {}", count);
        }
        return Ok(());
    }

    let start = Instant::now();
    let report = OutputLoader::with_config(config.conversion_config.clone()).load_detailed(&item)?;
    let bytes = report.output.to_bytes(&config.conversion_config);

    if let Some(output_path) = &args.output {
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output_path, &bytes)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        CliUtils::show_success(
            &format!("Converted to: {}", config.output_description()),
            config.is_quiet(),
        );
    } else {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&bytes)?;
        if !bytes.ends_with(b"\n") {
            writeln!(stdout)?;
        }
    }

    if config.want_stats() && !config.is_quiet() {
        output_statistics(&report, start);
    }

    Ok(())
}

fn read_item(source: &OutputSource, config: &CliConfig) -> Result<CellOutput> {
    check_source_size_before_read(source, &config.conversion_config)?;
    let item = source
        .read_item()
        .with_context(|| format!("Failed to read {}", source.description()))?;
    Ok(match &config.args.mime {
        Some(mime) => item.with_mime(mime.clone()),
        None => item,
    })
}

/// Extension for a converted file, by what the loader produced
fn output_extension(output: &LoadedOutput) -> Option<&'static str> {
    match output {
        LoadedOutput::GeoJson(_) => Some("geojson"),
        LoadedOutput::Data(_) => Some("json"),
        LoadedOutput::Text(_) | LoadedOutput::Binary(_) => Some("txt"),
        LoadedOutput::Empty => None,
    }
}

fn convert_single_file(
    input_dir: &Path,
    input_file: &Path,
    output_dir: &Path,
    loader: &OutputLoader,
    config: &CliConfig,
    written: &mut HashSet<PathBuf>,
) -> Result<Option<PathBuf>> {
    let item = read_item(&OutputSource::File(input_file.to_path_buf()), config)?;
    let report = loader.load_detailed(&item)?;

    let Some(extension) = output_extension(&report.output) else {
        tracing::warn!("{} has no content, skipped", input_file.display());
        return Ok(None);
    };

    let output_file = map_input_to_output(input_dir, input_file, output_dir, extension);
    if !written.insert(output_file.clone()) {
        anyhow::bail!(
            "{} would overwrite {}, already written from another input",
            input_file.display(),
            output_file.display()
        );
    }
    if let Some(parent) = output_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output_file, report.output.to_bytes(loader.config()))?;

    Ok(Some(output_file))
}

fn convert_directory(input_dir: &Path, config: &CliConfig) -> Result<()> {
    let args = &config.args;
    let output_dir = args
        .output
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("Output directory required for directory conversion"))?;

    std::fs::create_dir_all(output_dir)?;

    let files = find_convertible_files(input_dir, args.recursive)
        .with_context(|| format!("Failed finding files in {}", input_dir.display()))?;

    if files.is_empty() {
        CliUtils::show_warning(
            &format!("No convertible files found in {}", input_dir.display()),
            config.is_quiet(),
        );
        return Ok(());
    }

    if !config.is_quiet() {
        eprintln!("Found {} convertible files", files.len());
    }

    let loader = OutputLoader::with_config(config.conversion_config.clone());
    let progress = CliUtils::create_progress_bar(files.len() as u64);
    if config.is_quiet() {
        progress.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    let mut converted = 0usize;
    let mut failed = 0usize;
    let mut written = HashSet::new();

    for file in &files {
        let relative_path = file.strip_prefix(input_dir).unwrap_or(file);
        progress.set_message(relative_path.display().to_string());

        match convert_single_file(input_dir, file, output_dir, &loader, config, &mut written) {
            Ok(Some(output_file)) => {
                converted += 1;
                tracing::info!("{} -> {}", relative_path.display(), output_file.display());
            }
            Ok(None) => {}
            Err(e) => {
                failed += 1;
                progress.suspend(|| {
                    CliUtils::show_error(&format!(
                        "Error converting {}: {:#}",
                        relative_path.display(),
                        e
                    ))
                });
                if !config.continue_on_error() {
                    progress.abandon();
                    return Err(anyhow::anyhow!("Aborting due to conversion error: {:#}", e));
                }
            }
        }
        progress.inc(1);
    }

    progress.finish_and_clear();
    CliUtils::show_success(
        &format!("Converted {} of {} files ({} failed)", converted, files.len(), failed),
        config.is_quiet(),
    );

    Ok(())
}

fn output_statistics(report: &LoadReport, start: Instant) {
    eprintln!("\nConversion Statistics:");
    eprintln!("Detected format: {}", report.format);
    eprintln!("Output: {}", report.output.kind());

    if let Some(metadata) = &report.metadata {
        eprintln!("Records: {}", metadata.record_count);
        eprintln!("Features: {}", metadata.feature_count);
        eprintln!("Dropped: {}", metadata.dropped_count);
        eprintln!("Conversion time: {}ms", metadata.processing_time_ms);
    }

    if let Some(validation) = &report.validation {
        eprintln!(
            "Compliance: {} error(s), {} warning(s)",
            validation.error_count(),
            validation.warning_count()
        );
    }

    eprintln!("Total time: {}", CliUtils::format_duration(start.elapsed()));
}
