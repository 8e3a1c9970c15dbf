use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// The resolved path lies outside the root.
    #[error("path {requested:?} escapes the served directory")]
    Traversal { requested: String },
    /// Neither the path nor its parent directory exist, so it cannot be
    /// proven to stay inside the root.
    #[error("parent directory of {requested:?} does not exist")]
    ParentMissing { requested: String },
    /// The root itself could not be resolved. A configuration problem.
    #[error("served directory {root:?} is unavailable: {source}")]
    RootUnavailable {
        root: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Resolves `requested` against `root` and proves it stays on or under
/// the canonical root.
///
/// A path that does not exist yet (a file about to be created) is judged
/// by its canonical parent directory. An existing entry that cannot be
/// resolved (a dangling symlink) is rejected. Returns the absolute path
/// to use.
pub fn validate(root: &Path, requested: &str) -> Result<PathBuf, PathError> {
    let root = root
        .canonicalize()
        .map_err(|source| PathError::RootUnavailable {
            root: root.to_path_buf(),
            source,
        })?;

    let traversal = || PathError::Traversal {
        requested: requested.to_string(),
    };

    let candidate = root.join(requested);

    let resolved = match candidate.canonicalize() {
        Ok(resolved) => resolved,
        Err(_) => {
            // Exists but does not resolve: a dangling link.
            if candidate.symlink_metadata().is_ok() {
                tracing::warn!(requested, "Rejected unresolvable link");
                return Err(traversal());
            }
            let file_name = candidate.file_name().ok_or_else(traversal)?;
            let parent = candidate
                .parent()
                .and_then(|p| p.canonicalize().ok())
                .ok_or_else(|| PathError::ParentMissing {
                    requested: requested.to_string(),
                })?;
            parent.join(file_name)
        }
    };

    if resolved.starts_with(&root) {
        Ok(resolved)
    } else {
        tracing::warn!(requested, root = %root.display(), "Rejected path traversal attempt");
        Err(traversal())
    }
}
