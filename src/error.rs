use std::fmt;
use std::error::Error;
use std::path::PathBuf;

/// Errors raised by the tokenizer handle, the engines behind it and the
/// pretrained bootstrapper.
#[derive(Debug)]
pub enum TokenizerError {
    /// Local input rejected before any engine or network call
    InvalidInput(String),
    /// A local file or cache entry does not exist
    NotFound(PathBuf),
    /// The model identifier resolves outside of the cache root
    PathEscape {
        model_id: String,
        root: PathBuf,
    },
    /// A mandatory artifact could not be downloaded
    RemoteFetchFailed {
        filename: String,
        /// HTTP status when the server answered, `None` for transport errors
        status: Option<u16>,
        message: String,
    },
    /// The engine rejected the artifact it was given
    EngineConstructionFailed(String),
    /// The handle was already released
    Closed,
    /// The engine failed to encode the input
    EncodeFailed(String),
    /// The engine produced no text for the given ids
    DecodeFailed(String),
    /// Wraps std::io::Error for cache and file operations
    Io(std::io::Error),
}

pub type Result<T> = std::result::Result<T, TokenizerError>;

impl fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenizerError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            TokenizerError::NotFound(path) => write!(f, "File not found: {}", path.display()),
            TokenizerError::PathEscape { model_id, root } => write!(
                f,
                "Model id '{}' resolves outside of cache directory {}",
                model_id,
                root.display()
            ),
            TokenizerError::RemoteFetchFailed { filename, status: Some(status), message } => {
                write!(f, "Failed to download {} (HTTP {}): {}", filename, status, message)
            }
            TokenizerError::RemoteFetchFailed { filename, status: None, message } => {
                write!(f, "Failed to download {}: {}", filename, message)
            }
            TokenizerError::EngineConstructionFailed(msg) => {
                write!(f, "Failed to create tokenizer: {}", msg)
            }
            TokenizerError::Closed => write!(f, "Tokenizer is closed"),
            TokenizerError::EncodeFailed(msg) => write!(f, "Encoding error: {}", msg),
            TokenizerError::DecodeFailed(msg) => write!(f, "Decoding error: {}", msg),
            TokenizerError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl Error for TokenizerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TokenizerError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TokenizerError {
    fn from(err: std::io::Error) -> Self {
        TokenizerError::Io(err)
    }
}
