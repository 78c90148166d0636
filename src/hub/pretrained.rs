use futures::future::join_all;
use tracing::{debug, info, warn};

use super::cache::{validate_model_id, CacheTarget};
use super::fetcher::{Fetched, Fetcher};
use super::types::{FetchOutcome, PretrainedOptions, TokenizerFile, TOKENIZER_FILES, TOKENIZER_JSON};
use crate::error::{Result, TokenizerError};
use crate::tokenizer::{Tokenizer, TokenizerOption};

/// Fetches the tokenizer files of `model_id` and loads `tokenizer.json`.
///
/// Every file is fetched on its own task and all tasks run to completion
/// before the outcome is evaluated. Optional files may fail silently; the
/// first failed mandatory file in declaration order becomes the error.
/// A persistent cache keeps whatever was downloaded so the next call only
/// retries what is missing. A temporary directory is always removed.
pub async fn from_pretrained(model_id: &str, options: PretrainedOptions) -> Result<Tokenizer> {
    let model_id = validate_model_id(model_id)?;
    // Endpoint problems surface before anything is written
    options.file_url(model_id, TOKENIZER_JSON)?;
    let auth_token = options.resolved_auth_token();
    let fetcher = Fetcher::new(options.timeout, auth_token.as_deref())?;
    let target = CacheTarget::resolve(model_id, options.cache_dir.as_deref())?;

    info!(
        model_id,
        dir = %target.dir().display(),
        persistent = target.is_persistent(),
        authenticated = auth_token.is_some(),
        "Fetching pretrained tokenizer"
    );

    let outcomes = fetch_all(&fetcher, model_id, &target, &options).await;
    evaluate(model_id, outcomes)?;

    let mut tokenizer_options = Vec::new();
    if options.encode_special_tokens {
        tokenizer_options.push(TokenizerOption::EncodeSpecialTokens);
    }
    let tokenizer = Tokenizer::from_file_with_options(target.dir().join(TOKENIZER_JSON), &tokenizer_options)?;
    info!(model_id, vocab_size = tokenizer.vocab_size(), "Pretrained tokenizer ready");
    Ok(tokenizer)
}

/// Downloads every file of the set into `target`.
///
/// Returns one outcome per file in declaration order.
pub async fn fetch_all(
    fetcher: &Fetcher,
    model_id: &str,
    target: &CacheTarget,
    options: &PretrainedOptions,
) -> Vec<(TokenizerFile, FetchOutcome)> {
    let handles: Vec<_> = TOKENIZER_FILES
        .iter()
        .map(|file| {
            let fetcher = fetcher.clone();
            let url = options.file_url(model_id, file.name);
            let destination = target.dir().join(file.name);
            let file = *file;
            let handle = tokio::spawn(async move {
                let fetched = match url {
                    Ok(url) => fetcher.fetch(url.as_str(), &destination).await,
                    Err(e) => Err(e),
                };
                match fetched {
                    Ok(Fetched::Downloaded { bytes }) => FetchOutcome::Downloaded { bytes },
                    Ok(Fetched::AlreadyPresent) => FetchOutcome::AlreadyPresent,
                    Err(e) if file.mandatory => FetchOutcome::MandatoryFailed(e),
                    Err(e) => FetchOutcome::OptionalFailed(e),
                }
            });
            (file, handle)
        })
        .collect();

    let (files, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
    let results = join_all(handles).await;

    files
        .into_iter()
        .zip(results)
        .map(|(file, joined)| {
            let outcome = joined.unwrap_or_else(|e| {
                let err = TokenizerError::RemoteFetchFailed {
                    filename: file.name.to_string(),
                    status: None,
                    message: format!("fetch task aborted: {}", e),
                };
                if file.mandatory {
                    FetchOutcome::MandatoryFailed(err)
                } else {
                    FetchOutcome::OptionalFailed(err)
                }
            });
            (file, outcome)
        })
        .collect()
}

fn evaluate(model_id: &str, outcomes: Vec<(TokenizerFile, FetchOutcome)>) -> Result<()> {
    let mut first_error = None;
    for (file, outcome) in outcomes {
        match outcome {
            FetchOutcome::MandatoryFailed(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                } else {
                    warn!(model_id, file = file.name, error = %e, "Additional mandatory file failed");
                }
            }
            FetchOutcome::OptionalFailed(e) => {
                debug!(model_id, file = file.name, error = %e, "Optional file unavailable");
            }
            other => debug!(model_id, file = file.name, outcome = %other, "File ready"),
        }
    }
    match first_error {
        Some(e) => {
            warn!(model_id, error = %e, "Pretrained fetch failed");
            Err(e)
        }
        None => Ok(()),
    }
}
