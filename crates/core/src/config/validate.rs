use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Refresh interval is not 0
/// - TVHeadend URL is an http(s) URL
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.refresh.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "refresh.interval_secs cannot be 0".to_string(),
        ));
    }

    let url = config.tvheadend.url.trim();
    if url.is_empty() {
        return Err(ConfigError::ValidationError(
            "tvheadend.url is required".to_string(),
        ));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::ValidationError(format!(
            "tvheadend.url must start with http:// or https://, got {}",
            url
        )));
    }

    Ok(())
}
