use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use reqwest::Url;

use crate::error::{Result, TokenizerError};

pub const DEFAULT_ENDPOINT: &str = "https://huggingface.co";
pub const DEFAULT_REVISION: &str = "main";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One artifact of a pretrained tokenizer repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerFile {
    pub name: &'static str,
    pub mandatory: bool,
}

/// Files fetched for every pretrained model, in declaration order.
pub const TOKENIZER_FILES: [TokenizerFile; 5] = [
    TokenizerFile { name: "tokenizer.json", mandatory: true },
    TokenizerFile { name: "vocab.txt", mandatory: false },
    TokenizerFile { name: "merges.txt", mandatory: false },
    TokenizerFile { name: "special_tokens_map.json", mandatory: false },
    TokenizerFile { name: "added_tokens.json", mandatory: false },
];

/// File the engine is built from once the fetch completes
pub const TOKENIZER_JSON: &str = "tokenizer.json";

/// Result of one fetch task.
#[derive(Debug)]
pub enum FetchOutcome {
    Downloaded { bytes: u64 },
    AlreadyPresent,
    OptionalFailed(TokenizerError),
    MandatoryFailed(TokenizerError),
}

impl FetchOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, FetchOutcome::OptionalFailed(_) | FetchOutcome::MandatoryFailed(_))
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FetchOutcome::Downloaded { bytes } => write!(f, "downloaded ({} bytes)", bytes),
            FetchOutcome::AlreadyPresent => write!(f, "already present"),
            FetchOutcome::OptionalFailed(e) => write!(f, "skipped: {}", e),
            FetchOutcome::MandatoryFailed(e) => write!(f, "failed: {}", e),
        }
    }
}

/// Settings for [`crate::Tokenizer::from_pretrained`].
///
/// ```no_run
/// # use tokenbridge::PretrainedOptions;
/// let options = PretrainedOptions::new()
///     .with_cache_dir("/var/cache/tokenizers")
///     .with_auth_token("hf_xxx");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PretrainedOptions {
    /// Persistent cache root; a temporary directory is used when unset
    pub cache_dir: Option<PathBuf>,
    /// Bearer token, falls back to `HF_TOKEN`
    pub auth_token: Option<String>,
    pub endpoint: String,
    pub revision: String,
    /// Per-request timeout
    pub timeout: Duration,
    pub encode_special_tokens: bool,
}

impl Default for PretrainedOptions {
    fn default() -> Self {
        Self {
            cache_dir: None,
            auth_token: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            revision: DEFAULT_REVISION.to_string(),
            timeout: DEFAULT_TIMEOUT,
            encode_special_tokens: false,
        }
    }
}

impl PretrainedOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = revision.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_encode_special_tokens(mut self, enabled: bool) -> Self {
        self.encode_special_tokens = enabled;
        self
    }

    /// The token sent as `Authorization: Bearer`.
    ///
    /// An explicit token wins; an explicit empty token forces anonymous
    /// requests. Without one, a non-empty `HF_TOKEN` is used.
    pub fn resolved_auth_token(&self) -> Option<String> {
        match &self.auth_token {
            Some(token) if token.is_empty() => None,
            Some(token) => Some(token.clone()),
            None => std::env::var("HF_TOKEN").ok().filter(|t| !t.is_empty()),
        }
    }

    /// `{endpoint}/{model_id}/resolve/{revision}/{filename}` with every
    /// path segment percent-encoded.
    pub fn file_url(&self, model_id: &str, filename: &str) -> Result<Url> {
        let mut url = Url::parse(self.endpoint.trim()).map_err(|e| {
            TokenizerError::InvalidInput(format!("Invalid endpoint '{}': {}", self.endpoint, e))
        })?;
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|_| TokenizerError::InvalidInput(format!("Endpoint '{}' cannot be a base URL", self.endpoint)))?
            .pop_if_empty()
            .extend(model_id.split('/').filter(|s| !s.is_empty()))
            .push("resolve")
            .push(&self.revision)
            .push(filename);
        Ok(url)
    }
}
