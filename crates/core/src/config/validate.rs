use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Image quality and video CRF ranges (delegated to the converter types)
/// - Encoder timeout is not 0
/// - Batch concurrency, when set, is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    config
        .image
        .validate()
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    config
        .video
        .validate()
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    if config.encoder.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "encoder.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.batch.concurrency == Some(0) {
        return Err(ConfigError::ValidationError(
            "batch.concurrency cannot be 0".to_string(),
        ));
    }

    Ok(())
}
