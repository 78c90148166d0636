use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, TokenizerError};

/// What a successful fetch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetched {
    Downloaded { bytes: u64 },
    AlreadyPresent,
}

/// Downloads remote files into a local directory.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Builds the HTTP client with a per-request timeout and optional
    /// bearer token sent on every request.
    pub fn new(timeout: Duration, auth_token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = auth_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                TokenizerError::InvalidInput("auth token contains invalid header characters".to_string())
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| TokenizerError::InvalidInput(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Fetches `url` into `destination`.
    ///
    /// Returns `AlreadyPresent` without touching the network when the file
    /// exists. The body is streamed into a sibling `.part` file that is
    /// renamed into place once complete.
    pub async fn fetch(&self, url: &str, destination: &Path) -> Result<Fetched> {
        if fs::try_exists(destination).await? {
            debug!(path = %destination.display(), "Skipping existing file");
            return Ok(Fetched::AlreadyPresent);
        }

        let filename = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let transport = |e: reqwest::Error| TokenizerError::RemoteFetchFailed {
            filename: filename.clone(),
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TokenizerError::RemoteFetchFailed {
                filename: filename.clone(),
                status: Some(status.as_u16()),
                message: status.canonical_reason().unwrap_or("request failed").to_string(),
            });
        }

        let partial = partial_path(destination);
        let result = async {
            let mut file = fs::File::create(&partial).await?;
            let mut bytes = 0u64;
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(transport)?;
                file.write_all(&chunk).await?;
                bytes += chunk.len() as u64;
            }
            file.flush().await?;
            file.sync_all().await?;
            Ok::<u64, TokenizerError>(bytes)
        }
        .await;

        match result {
            Ok(bytes) => {
                persist(&partial, destination).await?;
                debug!(path = %destination.display(), bytes, "Downloaded file");
                Ok(Fetched::Downloaded { bytes })
            }
            Err(e) => {
                let _ = fs::remove_file(&partial).await;
                Err(e)
            }
        }
    }
}

/// Moves a completed `.part` file into place, removing it if the move fails.
async fn persist(partial: &Path, destination: &Path) -> Result<()> {
    if let Err(e) = fs::rename(partial, destination).await {
        let _ = fs::remove_file(partial).await;
        return Err(e.into());
    }
    Ok(())
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.part", Uuid::new_v4()));
    destination.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_path_is_sibling() {
        let partial = partial_path(Path::new("/cache/model/tokenizer.json"));
        assert_eq!(partial.parent(), Some(Path::new("/cache/model")));
        let name = partial.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("tokenizer.json."));
        assert!(name.ends_with(".part"));
    }

    #[tokio::test]
    async fn test_failed_persist_removes_partial() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory cannot be replaced by a file
        let destination = dir.path().join("tokenizer.json");
        std::fs::create_dir(&destination).unwrap();
        std::fs::write(destination.join("occupant"), "x").unwrap();

        let partial = partial_path(&destination);
        std::fs::write(&partial, "{}").unwrap();

        assert!(persist(&partial, &destination).await.is_err());
        assert!(!partial.exists());
        assert!(destination.join("occupant").exists());
    }

    #[tokio::test]
    async fn test_persist_moves_partial() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("vocab.txt");
        let partial = partial_path(&destination);
        std::fs::write(&partial, "hello").unwrap();

        persist(&partial, &destination).await.unwrap();
        assert!(!partial.exists());
        assert_eq!(std::fs::read_to_string(&destination).unwrap(), "hello");
    }

    #[test]
    fn test_token_with_newline_rejected() {
        assert!(matches!(
            Fetcher::new(Duration::from_secs(1), Some("bad\ntoken")),
            Err(TokenizerError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_existing_file_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.txt");
        std::fs::write(&path, "seeded").unwrap();

        let fetcher = Fetcher::new(Duration::from_secs(1), None).unwrap();
        // Unroutable; any network access would fail
        let fetched = fetcher.fetch("http://127.0.0.1:9/vocab.txt", &path).await.unwrap();
        assert_eq!(fetched, Fetched::AlreadyPresent);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "seeded");
    }
}
