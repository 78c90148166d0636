//! Pretrained bootstrap: fetches a model's tokenizer artifacts from a
//! Hugging Face style file server into a local cache and loads them.

pub mod cache;
pub mod fetcher;
pub mod pretrained;
pub mod types;

pub use cache::CacheTarget;
pub use fetcher::{Fetched, Fetcher};
pub use pretrained::{fetch_all, from_pretrained};
pub use types::{FetchOutcome, PretrainedOptions, TokenizerFile, TOKENIZER_FILES};
