//! Command line surface of the `tokenbridge` binary.

pub mod display;

use std::path::PathBuf;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "tokenbridge", version, about = "Encode and decode text with local or pretrained tokenizers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Encode text into token ids
    Encode {
        #[command(flatten)]
        source: SourceArgs,
        /// Text to encode
        text: String,
        /// Do not add the tokenizer's special tokens
        #[arg(long)]
        no_special_tokens: bool,
        /// Print the encoding as JSON
        #[arg(long)]
        json: bool,
    },
    /// Decode token ids back into text
    Decode {
        #[command(flatten)]
        source: SourceArgs,
        /// Token ids, space or comma separated
        #[arg(required = true, value_delimiter = ',', num_args = 1..)]
        ids: Vec<u32>,
        /// Keep special tokens in the output
        #[arg(long)]
        keep_special_tokens: bool,
    },
    /// Print the vocabulary size
    VocabSize {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Fetch a pretrained tokenizer into the cache
    Fetch {
        /// Model identifier, e.g. `bert-base-uncased`
        model_id: String,
        /// Cache root, overrides the configured one
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

/// Where the tokenizer comes from
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// Path to a tokenizer.json file
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Pretrained model identifier
    #[arg(long)]
    pub pretrained: Option<String>,
}
