use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use base64::{engine::general_purpose, Engine as _};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use tiktoken_rs::{CoreBPE, Rank};
use tracing::debug;

use super::engine::{Engine, RawEncoding};
use crate::error::{Result, TokenizerError};
use crate::tokenizer::EncodeOptions;

/// Subset of `tokenizer_config.json` read for special tokens.
#[derive(Debug, Deserialize)]
struct TokenizerConfig {
    added_tokens_decoder: HashMap<String, AddedToken>,
}

#[derive(Debug, Deserialize)]
struct AddedToken {
    content: String,
}

/// Engine backed by a tiktoken rank file.
pub struct TiktokenEngine {
    bpe: CoreBPE,
    vocab_size: u32,
    /// Ids with a decoder entry, ordinary or special
    known_ids: HashSet<u32>,
    special_tokens: HashSet<String>,
    special_token_ids: HashSet<u32>,
}

impl TiktokenEngine {
    /// Loads a base64 rank file, the special tokens listed in
    /// `tokenizer_config.json` and the split pattern.
    pub fn from_files(model_path: &Path, config_path: &Path, pattern: &str) -> Result<Self> {
        let ranks = std::fs::read_to_string(model_path).map_err(|e| {
            TokenizerError::EngineConstructionFailed(format!(
                "Failed to read model file {}: {}",
                model_path.display(),
                e
            ))
        })?;
        let mut encoder = parse_ranks(&ranks)?;

        let config = std::fs::read(config_path).map_err(|e| {
            TokenizerError::EngineConstructionFailed(format!(
                "Failed to read config file {}: {}",
                config_path.display(),
                e
            ))
        })?;
        let config: TokenizerConfig = serde_json::from_slice(&config).map_err(|e| {
            TokenizerError::EngineConstructionFailed(format!("Failed to parse config JSON: {}", e))
        })?;

        let mut special_encoder: FxHashMap<String, Rank> = FxHashMap::default();
        for (token_id, added_token) in config.added_tokens_decoder {
            let id: Rank = token_id.parse().map_err(|e| {
                TokenizerError::EngineConstructionFailed(format!(
                    "Failed to parse token ID '{}': {}",
                    token_id, e
                ))
            })?;
            special_encoder.insert(added_token.content, id);
        }
        let special_tokens: HashSet<String> = special_encoder.keys().cloned().collect();
        let special_token_ids: HashSet<u32> = special_encoder.values().copied().collect();

        let existing: HashSet<Rank> = encoder.values().copied().collect();
        if existing.len() != encoder.len() {
            return Err(TokenizerError::EngineConstructionFailed(
                "model file assigns the same rank to more than one token".to_string(),
            ));
        }

        let max_rank = encoder.values().copied().max().unwrap_or(0);
        let max_special = special_encoder.values().copied().max().unwrap_or(0);
        let vocab_size = max_rank.max(max_special) + 1;

        // Every rank below the maximum must decode to something
        let mut reserved = 0u32;
        for rank in 0..max_rank {
            if !existing.contains(&rank) && !special_token_ids.contains(&rank) {
                encoder.insert(format!("<|reserved_special_token_{}|>", reserved).into_bytes(), rank);
                reserved += 1;
            }
        }

        let known_ids: HashSet<u32> = encoder.values().chain(special_encoder.values()).copied().collect();

        let bpe = CoreBPE::new(encoder, special_encoder, pattern).map_err(|e| {
            TokenizerError::EngineConstructionFailed(format!("Failed to create tiktoken tokenizer: {}", e))
        })?;
        debug!(vocab_size, special = special_tokens.len(), reserved, "Tiktoken engine ready");

        Ok(Self {
            bpe,
            vocab_size,
            known_ids,
            special_tokens,
            special_token_ids,
        })
    }

    fn encode_ids(&self, text: &str, add_special_tokens: bool) -> Result<Vec<u32>> {
        let allowed: HashSet<&str> = if add_special_tokens {
            self.special_tokens.iter().map(String::as_str).collect()
        } else {
            HashSet::new()
        };
        // tiktoken panics on bytes missing from the rank table
        panic::catch_unwind(AssertUnwindSafe(|| self.bpe.encode(text, &allowed).0))
            .map_err(|_| TokenizerError::EncodeFailed(format!("tiktoken could not encode {:?}", text)))
    }
}

/// Parses `base64(token) rank` lines.
fn parse_ranks(content: &str) -> Result<FxHashMap<Vec<u8>, Rank>> {
    let mut encoder: FxHashMap<Vec<u8>, Rank> = FxHashMap::default();
    for (line_num, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut parts = line.split(' ');
        let raw = parts.next().unwrap_or_default();
        let token = general_purpose::STANDARD.decode(raw).map_err(|e| {
            TokenizerError::EngineConstructionFailed(format!(
                "Failed to decode base64 at line {}: {}",
                line_num + 1,
                e
            ))
        })?;
        let rank: Rank = parts
            .next()
            .ok_or_else(|| {
                TokenizerError::EngineConstructionFailed(format!(
                    "Invalid model file format at line {}: missing rank",
                    line_num + 1
                ))
            })?
            .trim()
            .parse()
            .map_err(|e| {
                TokenizerError::EngineConstructionFailed(format!(
                    "Failed to parse rank at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;
        encoder.insert(token, rank);
    }
    Ok(encoder)
}

impl Engine for TiktokenEngine {
    fn name(&self) -> &'static str {
        "tiktoken"
    }

    fn encode(&self, text: &str, options: &EncodeOptions) -> Result<RawEncoding> {
        let ids = self.encode_ids(text, options.add_special_tokens)?;
        let len = ids.len();

        let tokens = options.return_tokens.then(|| {
            self.bpe
                ._decode_native_and_split(ids.clone())
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .collect()
        });
        let special_tokens_mask = options.return_special_tokens_mask.then(|| {
            ids.iter()
                .map(|id| u32::from(self.special_token_ids.contains(id)))
                .collect()
        });

        Ok(RawEncoding {
            type_ids: options.return_type_ids.then(|| vec![0; len]),
            attention_mask: options.return_attention_mask.then(|| vec![1; len]),
            tokens,
            special_tokens_mask,
            // Not tracked by this engine
            offsets: None,
            ids,
        })
    }

    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String> {
        let ids: Vec<u32> = if skip_special_tokens {
            ids.iter()
                .filter(|id| !self.special_token_ids.contains(id))
                .copied()
                .collect()
        } else {
            ids.to_vec()
        };
        if ids.is_empty() {
            return Ok(String::new());
        }
        if let Some(id) = ids.iter().find(|id| !self.known_ids.contains(id)) {
            return Err(TokenizerError::DecodeFailed(format!(
                "unknown token id {} for vocabulary of {}",
                id, self.vocab_size
            )));
        }

        if let Ok(text) = self.bpe.decode(ids.clone()) {
            return Ok(text);
        }

        // Trailing tokens may split a UTF-8 sequence: keep the longest
        // decodable prefix and mark each remaining token with U+FFFD.
        let mut prefix_len = ids.len() - 1;
        let mut text = String::new();
        while prefix_len > 0 {
            if let Ok(decoded) = self.bpe.decode(ids[..prefix_len].to_vec()) {
                text = decoded;
                break;
            }
            prefix_len -= 1;
        }
        text.push_str(&"\u{FFFD}".repeat(ids.len() - prefix_len));
        Ok(text)
    }

    fn vocab_size(&self) -> u32 {
        self.vocab_size
    }
}
