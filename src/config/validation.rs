use crate::config::types::{Config, PaginatedEntry, PresenterConfig, ScraperConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

const MAX_CONCURRENCY: usize = 10_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_presenter_config(&config.presenter)?;
    for url in &config.urls {
        validate_url(url)?;
    }
    validate_paginated(&config.paginated)?;
    Ok(())
}

/// Validates scraper configuration
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 0 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "connect-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent name cannot be empty".to_string(),
        ));
    }

    if config.name.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "user-agent name cannot contain whitespace, got '{}'",
            config.name
        )));
    }

    if config.version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent version cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_presenter_config(config: &PresenterConfig) -> Result<(), ConfigError> {
    if config.stop_words_path.is_empty() {
        return Err(ConfigError::Validation(
            "stop-words-path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates paginated URL ranges
fn validate_paginated(entries: &[PaginatedEntry]) -> Result<(), ConfigError> {
    for entry in entries {
        if entry.pages < 1 {
            return Err(ConfigError::Validation(format!(
                "Paginated range '{}' must have at least one page",
                entry.base_url
            )));
        }
        // The first page is representative: only a numeric suffix differs.
        if let Some(first) = entry.expand().next() {
            validate_url(&first)?;
        }
    }
    Ok(())
}

/// Checks that a URL parses and uses an HTTP(S) scheme
fn validate_url(raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid URL '{}': {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidUrl(format!(
            "URL '{}' must use http or https, got '{}'",
            raw, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/").is_ok());
        assert!(validate_url("http://127.0.0.1:8080/page").is_ok());

        assert!(validate_url("").is_err());
        assert!(validate_url("example.com").is_err());
        assert!(validate_url("ftp://example.com/file").is_err());
        assert!(validate_url("mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_validate_scraper_config() {
        assert!(validate_scraper_config(&ScraperConfig::default()).is_ok());

        let too_many = ScraperConfig {
            concurrency: MAX_CONCURRENCY + 1,
            ..ScraperConfig::default()
        };
        assert!(validate_scraper_config(&too_many).is_err());

        let no_timeout = ScraperConfig {
            request_timeout_secs: 0,
            ..ScraperConfig::default()
        };
        assert!(validate_scraper_config(&no_timeout).is_err());
    }

    #[test]
    fn test_validate_user_agent_config() {
        assert!(validate_user_agent_config(&UserAgentConfig::default()).is_ok());

        let blank = UserAgentConfig {
            name: "  ".to_string(),
            version: "1.0".to_string(),
        };
        assert!(validate_user_agent_config(&blank).is_err());

        let spaced = UserAgentConfig {
            name: "Word Harvest".to_string(),
            version: "1.0".to_string(),
        };
        assert!(validate_user_agent_config(&spaced).is_err());
    }

    #[test]
    fn test_validate_paginated_base_url() {
        let bad = PaginatedEntry {
            base_url: "not a url/".to_string(),
            pages: 2,
        };
        assert!(matches!(
            validate_paginated(&[bad]),
            Err(ConfigError::InvalidUrl(_))
        ));
    }
}
