use crate::error::Result;
use crate::tokenizer::EncodeOptions;

/// One encode result as produced by an engine.
///
/// Optional fields are only filled when the matching `return_*` flag was
/// set; the façade moves the record into an owned `Encoding` and drops it
/// before returning.
#[derive(Debug, Default)]
pub struct RawEncoding {
    pub ids: Vec<u32>,
    pub type_ids: Option<Vec<u32>>,
    pub tokens: Option<Vec<String>>,
    pub special_tokens_mask: Option<Vec<u32>>,
    pub attention_mask: Option<Vec<u32>>,
    pub offsets: Option<Vec<(usize, usize)>>,
}

/// Boundary to a loaded tokenizer engine.
///
/// A boxed engine is the opaque handle owned by a `Tokenizer`. Dropping the
/// box releases every engine-side resource.
pub trait Engine: Send {
    /// Short backend name used in log lines
    fn name(&self) -> &'static str;

    fn encode(&self, text: &str, options: &EncodeOptions) -> Result<RawEncoding>;

    /// Encodes a whole batch in one call; results are in input order.
    fn encode_batch(&self, texts: &[&str], options: &EncodeOptions) -> Result<Vec<RawEncoding>> {
        texts.iter().map(|text| self.encode(text, options)).collect()
    }

    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String>;

    fn vocab_size(&self) -> u32;
}
