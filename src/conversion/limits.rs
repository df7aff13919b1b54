use crate::conversion::config::ConversionConfig;
use crate::error::{ConversionError, ConversionErrorKind, ConversionResult};
use crate::parser::OutputSource;

/// Check the source size before reading it into memory.
/// This avoids loading very large files if the user-configured
/// limit is smaller than the file.
pub fn check_source_size_before_read(
    source: &OutputSource,
    config: &ConversionConfig,
) -> ConversionResult<()> {
    if let Some(size) = source.estimated_size() {
        check_size(size as usize, config)?;
    }
    Ok(())
}

/// Check the size of an already-read payload
pub fn check_size(size: usize, config: &ConversionConfig) -> ConversionResult<()> {
    if size > config.memory_limit {
        return Err(ConversionError::conversion(
            ConversionErrorKind::JsonTooLarge {
                size,
                limit: config.memory_limit,
            },
        ));
    }
    Ok(())
}
