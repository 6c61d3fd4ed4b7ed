use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::Error;
use crate::session::DEFAULT_STORAGE_KEY;

/// Blogging API client configuration.
///
/// Required field (`base_url`) is a constructor parameter. Everything else
/// has a default and a `with_*` override.
///
/// ```rust,ignore
/// let config = ClientConfig::new("https://blog.example.com/api/".parse()?)
///     .with_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ClientConfig {
    pub(crate) base_url: Url,
    pub(crate) refresh_path: String,
    pub(crate) storage_key: String,
    pub(crate) session_dir: Option<PathBuf>,
    pub(crate) timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(
            Url::parse(Self::DEFAULT_BASE_URL).expect("valid default URL"),
        )
    }
}

impl ClientConfig {
    pub const DEFAULT_BASE_URL: &'static str = "http://127.0.0.1:8000/api/";
    pub const DEFAULT_REFRESH_PATH: &'static str = "token/refresh/";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a configuration for the API rooted at `base_url`.
    ///
    /// A trailing `/` is added if missing so endpoint paths resolve beneath it.
    #[must_use]
    pub fn new(mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            base_url,
            refresh_path: Self::DEFAULT_REFRESH_PATH.into(),
            storage_key: DEFAULT_STORAGE_KEY.into(),
            session_dir: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Optional env vars
    /// - `BLOG_API_URL`: API base URL (default `http://127.0.0.1:8000/api/`)
    /// - `BLOG_TOKEN_REFRESH_PATH`: token refresh endpoint, relative to the base
    /// - `BLOG_STORAGE_KEY`: key the credential record is stored under
    /// - `BLOG_SESSION_DIR`: directory for file-backed credential storage
    /// - `BLOG_HTTP_TIMEOUT_SECS`: per-request timeout in seconds
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set but invalid.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = match lookup("BLOG_API_URL") {
            Some(url_str) => {
                let url: Url = url_str
                    .parse()
                    .map_err(|e| Error::Config(format!("BLOG_API_URL: {e}")))?;
                Self::new(url)
            }
            None => Self::default(),
        };

        if let Some(path) = lookup("BLOG_TOKEN_REFRESH_PATH") {
            config = config.with_refresh_path(path);
        }
        if let Some(key) = lookup("BLOG_STORAGE_KEY") {
            if key.trim().is_empty() {
                return Err(Error::Config("BLOG_STORAGE_KEY must not be empty".into()));
            }
            config = config.with_storage_key(key);
        }
        if let Some(dir) = lookup("BLOG_SESSION_DIR") {
            config = config.with_session_dir(dir);
        }
        if let Some(secs) = lookup("BLOG_HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("BLOG_HTTP_TIMEOUT_SECS: {e}")))?;
            if secs == 0 {
                return Err(Error::Config("BLOG_HTTP_TIMEOUT_SECS must be positive".into()));
            }
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    #[must_use]
    pub fn with_session_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.session_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn refresh_path(&self) -> &str {
        &self.refresh_path
    }

    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    #[must_use]
    pub fn session_dir(&self) -> Option<&PathBuf> {
        self.session_dir.as_ref()
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
