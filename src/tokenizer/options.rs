/// A single encode option. Each value turns on exactly one output field,
/// except `ReturnAllAttributes` which turns on every optional field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeOption {
    ReturnTypeIds,
    ReturnTokens,
    ReturnSpecialTokensMask,
    ReturnAttentionMask,
    ReturnOffsets,
    ReturnAllAttributes,
}

/// The flag set handed to the engine for one encode call.
///
/// Built by folding `EncodeOption` values over the defaults; only `ids`
/// are produced unless a `return_*` flag is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    pub add_special_tokens: bool,
    pub return_type_ids: bool,
    pub return_tokens: bool,
    pub return_special_tokens_mask: bool,
    pub return_attention_mask: bool,
    pub return_offsets: bool,
}

impl EncodeOptions {
    pub fn new(add_special_tokens: bool) -> Self {
        Self {
            add_special_tokens,
            ..Default::default()
        }
    }

    /// Folds a sequence of options into a flag set.
    pub fn from_options<'a, I>(add_special_tokens: bool, options: I) -> Self
    where
        I: IntoIterator<Item = &'a EncodeOption>,
    {
        options
            .into_iter()
            .fold(Self::new(add_special_tokens), |acc, option| acc.with(*option))
    }

    #[must_use]
    pub fn with(self, option: EncodeOption) -> Self {
        match option {
            EncodeOption::ReturnTypeIds => Self { return_type_ids: true, ..self },
            EncodeOption::ReturnTokens => Self { return_tokens: true, ..self },
            EncodeOption::ReturnSpecialTokensMask => Self { return_special_tokens_mask: true, ..self },
            EncodeOption::ReturnAttentionMask => Self { return_attention_mask: true, ..self },
            EncodeOption::ReturnOffsets => Self { return_offsets: true, ..self },
            EncodeOption::ReturnAllAttributes => Self {
                return_type_ids: true,
                return_tokens: true,
                return_special_tokens_mask: true,
                return_attention_mask: true,
                return_offsets: true,
                ..self
            },
        }
    }

    /// True when anything beyond the ids was requested.
    pub fn wants_attributes(&self) -> bool {
        self.return_type_ids
            || self.return_tokens
            || self.return_special_tokens_mask
            || self.return_attention_mask
            || self.return_offsets
    }
}

/// Construction-time options for a tokenizer handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizerOption {
    /// Treat text that matches a special token as ordinary text to be
    /// re-tokenized instead of mapping it to the special token id.
    EncodeSpecialTokens,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenizerOptions {
    pub encode_special_tokens: bool,
}

impl TokenizerOptions {
    pub fn from_options(options: &[TokenizerOption]) -> Self {
        let mut resolved = Self::default();
        for option in options {
            match option {
                TokenizerOption::EncodeSpecialTokens => resolved.encode_special_tokens = true,
            }
        }
        resolved
    }
}
