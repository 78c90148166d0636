//! # tokenbridge
//!
//! A tokenizer handle over the `tokenizers` and `tiktoken-rs` engines.
//!
//! - [`Tokenizer`] owns one engine and exposes encode, batch encode, decode
//!   and vocabulary size. Encode results carry only the fields requested
//!   through [`EncodeOption`] values.
//! - [`Tokenizer::from_pretrained`] fetches `tokenizer.json` and its optional
//!   companion files from a Hugging Face style file server into a local cache.
//!
//! ```no_run
//! use tokenbridge::{EncodeOption, Tokenizer};
//!
//! # fn main() -> tokenbridge::Result<()> {
//! let tokenizer = Tokenizer::from_file("tokenizer.json")?;
//! let encoding = tokenizer.encode("brown fox", true, &[EncodeOption::ReturnTokens])?;
//! println!("{:?} {:?}", encoding.ids, encoding.tokens);
//! tokenizer.close();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod hub;
pub mod tokenizer;

pub use engine::{Engine, RawEncoding};
pub use error::{Result, TokenizerError};
pub use hub::{FetchOutcome, PretrainedOptions};
pub use tokenizer::{
    EncodeOption, EncodeOptions, Encoding, Tokenizer, TokenizerOption, TokenizerOptions,
    TruncationDirection,
};
