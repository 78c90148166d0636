use std::path::Path;
use tokenizers::{PostProcessor, TruncationParams};
use tracing::debug;

use super::engine::{Engine, RawEncoding};
use crate::error::{Result, TokenizerError};
use crate::tokenizer::{EncodeOptions, TokenizerOptions, TruncationDirection};

/// Engine backed by a `tokenizer.json` loaded through the `tokenizers` crate.
pub struct HuggingFaceEngine {
    inner: tokenizers::Tokenizer,
}

impl HuggingFaceEngine {
    pub fn from_bytes(data: &[u8], options: &TokenizerOptions) -> Result<Self> {
        let mut inner = tokenizers::Tokenizer::from_bytes(data).map_err(|e| {
            TokenizerError::EngineConstructionFailed(format!("Failed to create tokenizer from bytes: {}", e))
        })?;
        inner.set_encode_special_tokens(options.encode_special_tokens);
        Ok(Self { inner })
    }

    pub fn from_bytes_with_truncation(
        data: &[u8],
        max_len: usize,
        direction: TruncationDirection,
    ) -> Result<Self> {
        let mut inner = tokenizers::Tokenizer::from_bytes(data).map_err(|e| {
            TokenizerError::EngineConstructionFailed(format!("Failed to create tokenizer from bytes: {}", e))
        })?;

        // The engine subtracts its special tokens from max_length and would underflow
        let added = inner
            .get_post_processor()
            .map(|processor| processor.added_tokens(false))
            .unwrap_or(0);
        if max_len < added {
            return Err(TokenizerError::EngineConstructionFailed(format!(
                "max length {} is smaller than the {} special tokens added by the tokenizer",
                max_len, added
            )));
        }

        let params = TruncationParams {
            max_length: max_len,
            direction: match direction {
                TruncationDirection::Left => tokenizers::TruncationDirection::Left,
                TruncationDirection::Right => tokenizers::TruncationDirection::Right,
            },
            ..Default::default()
        };
        inner.with_truncation(Some(params)).map_err(|e| {
            TokenizerError::EngineConstructionFailed(format!("Failed to set truncation parameters: {}", e))
        })?;
        debug!(max_len, %direction, "Truncation bound to tokenizer");

        Ok(Self { inner })
    }

    pub fn from_file(path: &Path, options: &TokenizerOptions) -> Result<Self> {
        let mut inner = tokenizers::Tokenizer::from_file(path).map_err(|e| {
            TokenizerError::EngineConstructionFailed(format!(
                "Failed to load tokenizer from file '{}': {}",
                path.display(),
                e
            ))
        })?;
        inner.set_encode_special_tokens(options.encode_special_tokens);
        Ok(Self { inner })
    }

    /// Copies the requested fields out of an engine encoding.
    fn materialize(encoding: &tokenizers::Encoding, options: &EncodeOptions) -> RawEncoding {
        RawEncoding {
            ids: encoding.get_ids().to_vec(),
            type_ids: options.return_type_ids.then(|| encoding.get_type_ids().to_vec()),
            tokens: options.return_tokens.then(|| encoding.get_tokens().to_vec()),
            special_tokens_mask: options
                .return_special_tokens_mask
                .then(|| encoding.get_special_tokens_mask().to_vec()),
            attention_mask: options
                .return_attention_mask
                .then(|| encoding.get_attention_mask().to_vec()),
            offsets: options.return_offsets.then(|| encoding.get_offsets().to_vec()),
        }
    }
}

impl Engine for HuggingFaceEngine {
    fn name(&self) -> &'static str {
        "huggingface"
    }

    fn encode(&self, text: &str, options: &EncodeOptions) -> Result<RawEncoding> {
        let encoding = self
            .inner
            .encode_char_offsets(text, options.add_special_tokens)
            .map_err(|e| TokenizerError::EncodeFailed(e.to_string()))?;
        Ok(Self::materialize(&encoding, options))
    }

    fn encode_batch(&self, texts: &[&str], options: &EncodeOptions) -> Result<Vec<RawEncoding>> {
        let encodings = self
            .inner
            .encode_batch_char_offsets(texts.to_vec(), options.add_special_tokens)
            .map_err(|e| TokenizerError::EncodeFailed(e.to_string()))?;
        Ok(encodings
            .iter()
            .map(|encoding| Self::materialize(encoding, options))
            .collect())
    }

    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String> {
        self.inner
            .decode(ids, skip_special_tokens)
            .map_err(|e| TokenizerError::DecodeFailed(e.to_string()))
    }

    fn vocab_size(&self) -> u32 {
        self.inner.get_vocab_size(true) as u32
    }
}
