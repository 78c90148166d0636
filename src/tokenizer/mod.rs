//! Tokenizer handle and the encode/decode façade.
//!
//! A [`Tokenizer`] owns one engine and projects each engine result into an
//! owned [`Encoding`] holding only the fields the caller asked for through
//! [`EncodeOption`] values.

pub mod options;
pub mod projection;
pub mod tokenizer;
pub mod types;

pub use options::{EncodeOption, EncodeOptions, TokenizerOption, TokenizerOptions};
pub use tokenizer::Tokenizer;
pub use types::{Encoding, TruncationDirection};
