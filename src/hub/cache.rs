use std::path::{Component, Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

use crate::error::{Result, TokenizerError};

/// Checks a model identifier and returns it trimmed.
pub fn validate_model_id(model_id: &str) -> Result<&str> {
    let model_id = model_id.trim();
    if model_id.is_empty() {
        return Err(TokenizerError::InvalidInput("model id is empty".to_string()));
    }
    if model_id.contains('\0') {
        return Err(TokenizerError::InvalidInput("model id contains a null byte".to_string()));
    }
    Ok(model_id)
}

/// Lexically cleans `model_id` into a path relative to `root`.
///
/// Fails with `PathEscape` when the identifier is absolute or climbs above
/// the root through `..`.
pub fn relative_model_path(model_id: &str, root: &Path) -> Result<PathBuf> {
    let escape = || TokenizerError::PathEscape {
        model_id: model_id.to_string(),
        root: root.to_path_buf(),
    };

    let mut cleaned = PathBuf::new();
    for component in Path::new(model_id).components() {
        match component {
            Component::Normal(part) => cleaned.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !cleaned.pop() {
                    return Err(escape());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(escape()),
        }
    }

    if cleaned.as_os_str().is_empty() {
        return Err(TokenizerError::InvalidInput(format!(
            "model id '{}' does not name a directory",
            model_id
        )));
    }
    Ok(cleaned)
}

/// Local directory the artifacts of one model are fetched into.
#[derive(Debug)]
pub enum CacheTarget {
    /// `root/model_id`, kept after the bootstrap returns
    Persistent(PathBuf),
    /// Removed when the target is dropped
    Temporary { dir: PathBuf, _guard: TempDir },
}

impl CacheTarget {
    /// Validates `model_id` against the root and creates the directory.
    ///
    /// Nothing is written before the path has been checked.
    pub fn resolve(model_id: &str, cache_root: Option<&Path>) -> Result<Self> {
        match cache_root {
            Some(root) => {
                let dir = root.join(relative_model_path(model_id, root)?);
                std::fs::create_dir_all(&dir)?;
                debug!(dir = %dir.display(), "Using persistent cache directory");
                Ok(CacheTarget::Persistent(dir))
            }
            None => {
                let relative = relative_model_path(model_id, &std::env::temp_dir())?;
                let guard = tempfile::Builder::new().prefix("tokenbridge-").tempdir()?;
                let dir = guard.path().join(relative);
                std::fs::create_dir_all(&dir)?;
                debug!(dir = %dir.display(), "Using temporary cache directory");
                Ok(CacheTarget::Temporary { dir, _guard: guard })
            }
        }
    }

    pub fn dir(&self) -> &Path {
        match self {
            CacheTarget::Persistent(dir) => dir,
            CacheTarget::Temporary { dir, .. } => dir,
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self, CacheTarget::Persistent(_))
    }
}
