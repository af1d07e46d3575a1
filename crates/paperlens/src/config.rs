//! Configuration for the paperlens server.

use std::time::Duration;

/// API configuration constants.
pub mod api {
    use std::time::Duration;

    /// CrossRef REST API base URL.
    pub const CROSSREF_API: &str = "https://api.crossref.org";

    /// Semantic Scholar API base URL.
    pub const SEMANTIC_SCHOLAR_API: &str = "https://api.semanticscholar.org";

    /// arXiv export API base URL.
    pub const ARXIV_API: &str = "https://export.arxiv.org";

    /// OpenRouter API base URL.
    pub const OPENROUTER_API: &str = "https://openrouter.ai/api";

    /// Default base URL for a local Ollama OpenAI-compatible endpoint.
    pub const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434/v1";

    /// Model name used when `OLLAMA_MODEL` is not configured.
    pub const OLLAMA_DEFAULT_MODEL: &str = "llama3";

    /// Timeout for exact-identifier catalog lookups.
    pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(8);

    /// Timeout for free-text search and model-list fetches.
    pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Model-list cache time-to-live.
    pub const MODEL_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

    /// User-Agent sent to catalogs that require attribution (CrossRef
    /// polite pool).
    pub const USER_AGENT: &str = "paperlens/0.1 (mailto:dev@paperlens.dev)";

    /// Free-text queries are truncated to this many characters before being
    /// sent to the search catalog.
    pub const QUERY_MAX_CHARS: usize = 200;

    /// Identifier scanning stops after this many pages.
    pub const MAX_SCAN_PAGES: usize = 2;
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the local Ollama-compatible endpoint.
    pub ollama_base_url: String,

    /// Model name forced for the local provider.
    pub ollama_model: Option<String>,

    /// OpenRouter API key (remote provider is unusable without it).
    pub openrouter_api_key: Option<String>,

    /// Site URL sent as the `HTTP-Referer` attribution header.
    pub site_url: String,

    /// CrossRef base URL (overridable for mock servers).
    pub crossref_url: String,

    /// Semantic Scholar base URL (overridable for mock servers).
    pub semantic_scholar_url: String,

    /// arXiv base URL (overridable for mock servers).
    pub arxiv_url: String,

    /// OpenRouter base URL (overridable for mock servers).
    pub openrouter_url: String,

    /// Exact-lookup timeout.
    pub lookup_timeout: Duration,

    /// Search and model-list timeout.
    pub search_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Model-list cache TTL.
    pub model_cache_ttl: Duration,
}

impl Config {
    /// Create a configuration with production endpoints.
    #[must_use]
    pub fn new(openrouter_api_key: Option<String>) -> Self {
        Self {
            ollama_base_url: api::OLLAMA_DEFAULT_URL.to_string(),
            ollama_model: None,
            openrouter_api_key,
            site_url: "http://localhost:3000".to_string(),
            crossref_url: api::CROSSREF_API.to_string(),
            semantic_scholar_url: api::SEMANTIC_SCHOLAR_API.to_string(),
            arxiv_url: api::ARXIV_API.to_string(),
            openrouter_url: api::OPENROUTER_API.to_string(),
            lookup_timeout: api::LOOKUP_TIMEOUT,
            search_timeout: api::SEARCH_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
            model_cache_ttl: api::MODEL_CACHE_TTL,
        }
    }

    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::new(env_nonempty("OPENROUTER_API_KEY"));
        if let Some(url) = env_nonempty("OLLAMA_BASE_URL") {
            config.ollama_base_url = url.trim_end_matches('/').to_string();
        }
        config.ollama_model = env_nonempty("OLLAMA_MODEL");
        if let Some(url) = env_nonempty("SITE_URL") {
            config.site_url = url;
        }
        config
    }

    /// Create a test configuration with every external endpoint pointed at
    /// a mock server.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            ollama_base_url: format!("{base_url}/v1"),
            ollama_model: None,
            openrouter_api_key: None,
            site_url: "http://localhost:3000".to_string(),
            crossref_url: base_url.to_string(),
            semantic_scholar_url: base_url.to_string(),
            arxiv_url: base_url.to_string(),
            openrouter_url: format!("{base_url}/api"),
            lookup_timeout: Duration::from_secs(5),
            search_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            model_cache_ttl: api::MODEL_CACHE_TTL,
        }
    }

    /// Check if the remote provider has a key configured.
    #[must_use]
    pub const fn has_openrouter_key(&self) -> bool {
        self.openrouter_api_key.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None)
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
