use serde::Deserialize;

/// Main configuration structure for Word-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scraper: ScraperConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub presenter: PresenterConfig,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub paginated: Vec<PaginatedEntry>,
}

impl Config {
    /// Builds the URL batch: explicit URLs first, then every paginated range
    /// expanded in order
    pub fn batch_urls(&self) -> Vec<String> {
        let mut urls = self.urls.clone();
        for entry in &self.paginated {
            urls.extend(entry.expand());
        }
        urls
    }
}

/// Scraper behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Maximum number of fetches running at once (0 = available parallelism)
    #[serde(default)]
    pub concurrency: usize,

    /// Overall per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl ScraperConfig {
    /// Resolves the configured concurrency into an actual permit count
    ///
    /// `0` maps to the number of CPUs the process may use. Values above the
    /// semaphore limit are clamped.
    pub fn effective_concurrency(&self) -> usize {
        let n = if self.concurrency == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            self.concurrency
        };
        n.min(tokio::sync::Semaphore::MAX_PERMITS)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            concurrency: 0,
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name sent in the User-Agent header
    pub name: String,

    /// Version sent in the User-Agent header
    pub version: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Result presentation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PresenterConfig {
    /// Newline-delimited stop word list
    #[serde(rename = "stop-words-path")]
    pub stop_words_path: String,

    /// Words counted fewer times than this are hidden
    #[serde(rename = "min-count", default = "default_min_count")]
    pub min_count: usize,
}

fn default_min_count() -> usize {
    1
}

/// A numbered page range: `base-url` followed by 1..=pages
#[derive(Debug, Clone, Deserialize)]
pub struct PaginatedEntry {
    #[serde(rename = "base-url")]
    pub base_url: String,

    pub pages: u32,
}

impl PaginatedEntry {
    pub fn expand(&self) -> impl Iterator<Item = String> + '_ {
        (1..=self.pages).map(move |page| format!("{}{}", self.base_url, page))
    }
}
