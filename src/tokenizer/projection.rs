use crate::engine::RawEncoding;
use crate::error::{Result, TokenizerError};
use super::options::EncodeOptions;
use super::types::Encoding;

/// Moves an engine record into an owned `Encoding`.
///
/// Only the fields selected by `options` survive; anything an engine filled in
/// without being asked is dropped here. Every populated field must be as long
/// as `ids`.
pub(crate) fn project(raw: RawEncoding, options: &EncodeOptions) -> Result<Encoding> {
    let RawEncoding {
        ids,
        type_ids,
        tokens,
        special_tokens_mask,
        attention_mask,
        offsets,
    } = raw;

    let encoding = Encoding {
        type_ids: keep(type_ids, options.return_type_ids),
        tokens: keep(tokens, options.return_tokens),
        special_tokens_mask: keep(special_tokens_mask, options.return_special_tokens_mask),
        attention_mask: keep(attention_mask, options.return_attention_mask),
        offsets: keep(offsets, options.return_offsets),
        ids,
    };
    check_lengths(&encoding)?;
    Ok(encoding)
}

pub(crate) fn project_batch(raw: Vec<RawEncoding>, options: &EncodeOptions) -> Result<Vec<Encoding>> {
    raw.into_iter().map(|r| project(r, options)).collect()
}

fn keep<T>(field: Option<T>, requested: bool) -> Option<T> {
    if requested {
        field
    } else {
        None
    }
}

fn check_lengths(encoding: &Encoding) -> Result<()> {
    let expected = encoding.ids.len();
    let lengths = [
        ("type_ids", encoding.type_ids.as_ref().map(Vec::len)),
        ("tokens", encoding.tokens.as_ref().map(Vec::len)),
        ("special_tokens_mask", encoding.special_tokens_mask.as_ref().map(Vec::len)),
        ("attention_mask", encoding.attention_mask.as_ref().map(Vec::len)),
        ("offsets", encoding.offsets.as_ref().map(Vec::len)),
    ];
    for (field, len) in lengths {
        if let Some(len) = len {
            if len != expected {
                return Err(TokenizerError::EncodeFailed(format!(
                    "engine returned {} {} for {} ids",
                    len, field, expected
                )));
            }
        }
    }
    Ok(())
}
