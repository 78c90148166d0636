pub mod engine;
pub mod huggingface;
pub mod tiktoken;

pub use engine::{Engine, RawEncoding};
pub use huggingface::HuggingFaceEngine;
pub use tiktoken::TiktokenEngine;
