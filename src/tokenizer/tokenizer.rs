use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use crate::engine::{Engine, HuggingFaceEngine, TiktokenEngine};
use crate::error::{Result, TokenizerError};
use crate::hub::{self, PretrainedOptions};
use super::options::{EncodeOption, EncodeOptions, TokenizerOption, TokenizerOptions};
use super::projection::{project, project_batch};
use super::types::{Encoding, TruncationDirection};

/// A handle to one loaded tokenizer engine.
///
/// The handle exclusively owns its engine. Calls on one handle are
/// serialized; share it across threads behind an `Arc`. The engine is
/// released exactly once, either by [`Tokenizer::close`] or when the handle
/// is dropped.
pub struct Tokenizer {
    engine: Mutex<Option<Box<dyn Engine>>>,
    backend: &'static str,
}

impl Tokenizer {
    /// Creates a tokenizer from the bytes of a `tokenizer.json` document.
    ///
    /// # Arguments
    /// * `data` - Serialized tokenizer definition, must not be empty
    /// * `options` - Construction options such as [`TokenizerOption::EncodeSpecialTokens`]
    ///
    /// # Returns
    /// * `Result<Self>` - The handle or `InvalidInput` / `EngineConstructionFailed`
    pub fn from_bytes(data: &[u8], options: &[TokenizerOption]) -> Result<Self> {
        if data.is_empty() {
            return Err(TokenizerError::InvalidInput("tokenizer data is empty".to_string()));
        }
        let options = TokenizerOptions::from_options(options);
        let engine = HuggingFaceEngine::from_bytes(data, &options)?;
        Ok(Self::from_engine(Box::new(engine)))
    }

    /// Creates a tokenizer whose every encode is truncated to `max_len` ids.
    ///
    /// `direction` picks the end that is dropped. The bound includes the
    /// special tokens added when encoding with `add_special_tokens`.
    pub fn from_bytes_with_truncation(
        data: &[u8],
        max_len: usize,
        direction: TruncationDirection,
    ) -> Result<Self> {
        if data.is_empty() {
            return Err(TokenizerError::InvalidInput("tokenizer data is empty".to_string()));
        }
        if max_len == 0 {
            return Err(TokenizerError::InvalidInput(
                "truncation length must be greater than 0".to_string(),
            ));
        }
        let engine = HuggingFaceEngine::from_bytes_with_truncation(data, max_len, direction)?;
        Ok(Self::from_engine(Box::new(engine)))
    }

    /// Loads a tokenizer from a `tokenizer.json` file on disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file_with_options(path, &[])
    }

    pub fn from_file_with_options(path: impl AsRef<Path>, options: &[TokenizerOption]) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(TokenizerError::NotFound(path.to_path_buf()));
        }
        let options = TokenizerOptions::from_options(options);
        let engine = HuggingFaceEngine::from_file(path, &options)?;
        Ok(Self::from_engine(Box::new(engine)))
    }

    /// Builds a tiktoken tokenizer.
    ///
    /// # Arguments
    /// * `model_path` - Rank file with one `base64(token) rank` pair per line
    /// * `config_path` - `tokenizer_config.json` holding `added_tokens_decoder`
    /// * `pattern` - Pre-tokenization regex
    pub fn from_tiktoken(
        model_path: impl AsRef<Path>,
        config_path: impl AsRef<Path>,
        pattern: &str,
    ) -> Result<Self> {
        let (model_path, config_path) = (model_path.as_ref(), config_path.as_ref());
        for path in [model_path, config_path] {
            if !path.is_file() {
                return Err(TokenizerError::NotFound(path.to_path_buf()));
            }
        }
        if pattern.is_empty() {
            return Err(TokenizerError::InvalidInput("split pattern is empty".to_string()));
        }
        let engine = TiktokenEngine::from_files(model_path, config_path, pattern)?;
        Ok(Self::from_engine(Box::new(engine)))
    }

    /// Downloads the tokenizer files of `model_id` and loads `tokenizer.json`.
    pub async fn from_pretrained(model_id: &str, options: PretrainedOptions) -> Result<Self> {
        hub::from_pretrained(model_id, options).await
    }

    /// Wraps an already constructed engine.
    pub fn from_engine(engine: Box<dyn Engine>) -> Self {
        let backend = engine.name();
        debug!(backend, "Tokenizer handle created");
        Self {
            engine: Mutex::new(Some(engine)),
            backend,
        }
    }

    /// Name of the engine backend behind this handle
    pub fn backend(&self) -> &'static str {
        self.backend
    }

    /// Encodes one text.
    ///
    /// Only `ids` are returned unless `options` ask for more.
    pub fn encode(
        &self,
        text: &str,
        add_special_tokens: bool,
        options: &[EncodeOption],
    ) -> Result<Encoding> {
        let options = EncodeOptions::from_options(add_special_tokens, options);
        let guard = self.lock();
        let engine = guard.as_ref().ok_or(TokenizerError::Closed)?;
        let raw = engine.encode(text, &options)?;
        project(raw, &options)
    }

    /// Encodes a batch in one engine call. Results follow input order.
    pub fn encode_batch(
        &self,
        texts: &[&str],
        add_special_tokens: bool,
        options: &[EncodeOption],
    ) -> Result<Vec<Encoding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let options = EncodeOptions::from_options(add_special_tokens, options);
        let guard = self.lock();
        let engine = guard.as_ref().ok_or(TokenizerError::Closed)?;
        let raw = engine.encode_batch(texts, &options)?;
        if raw.len() != texts.len() {
            return Err(TokenizerError::EncodeFailed(format!(
                "engine returned {} encodings for {} inputs",
                raw.len(),
                texts.len()
            )));
        }
        project_batch(raw, &options)
    }

    /// Renders ids back to text.
    pub fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String> {
        if ids.is_empty() {
            return Ok(String::new());
        }
        let guard = self.lock();
        let engine = guard.as_ref().ok_or(TokenizerError::Closed)?;
        engine.decode(ids, skip_special_tokens)
    }

    /// Vocabulary size including added tokens, `0` once closed.
    pub fn vocab_size(&self) -> u32 {
        self.lock().as_ref().map_or(0, |engine| engine.vocab_size())
    }

    /// Releases the engine. Calling it again is a no-op.
    pub fn close(&self) {
        if let Some(engine) = self.lock().take() {
            info!(backend = engine.name(), "Releasing tokenizer");
            drop(engine);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    // A panic while holding the lock leaves the slot itself consistent
    fn lock(&self) -> MutexGuard<'_, Option<Box<dyn Engine>>> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Tokenizer {
    fn drop(&mut self) {
        let slot = self.engine.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(engine) = slot.take() {
            debug!(backend = engine.name(), "Releasing tokenizer on drop");
        }
    }
}

impl std::fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokenizer")
            .field("backend", &self.backend)
            .field("closed", &self.is_closed())
            .finish()
    }
}
