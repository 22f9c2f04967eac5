//! Collecting, reading and writing the files docbot works on.
//!
//! The pipeline is: [`collect`] turns user-supplied paths into a flat, ordered list of
//! [`ResolvedPath`]s (validating each input and walking directories), then [`aggregate`]
//! reads them all concurrently and joins the readable ones into a single document.
//!
//! # Error Handling
//! - A missing input path is fatal ([`FileError::PathNotFound`]); callers must not recover.
//! - A failing directory listing aborts the walk ([`FileError::DirectoryRead`]).
//! - A failing file read during aggregation is logged and the file is left out.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use futures::future::join_all;
use tracing::{debug, error, info, warn};

/// Joins the contents of consecutive files in the aggregated document.
pub const SEPARATOR: &str = "\n Document this additional code using JSDoc \n";

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("File not found: {}", .path.display())]
    PathNotFound { path: PathBuf },
    #[error("could not inspect {}: {source}", .path.display())]
    Metadata {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not read directory {}: {source}", .path.display())]
    DirectoryRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// An absolute path that existed when it was validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedPath(PathBuf);

impl ResolvedPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for ResolvedPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.display().fmt(f)
    }
}

/// Resolves `path` to an absolute form and checks that it exists.
pub async fn validate(path: impl AsRef<Path>) -> Result<ResolvedPath, FileError> {
    let path = path.as_ref();
    let full_path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    match tokio::fs::try_exists(&full_path).await {
        Ok(true) => Ok(ResolvedPath(full_path)),
        Ok(false) | Err(_) => {
            debug!(path = %full_path.display(), "Input path does not exist");
            Err(FileError::PathNotFound { path: full_path })
        }
    }
}

/// Recursively lists every non-directory entry below `dir`.
///
/// Entries come out in the order the filesystem lists them at each level, depth first.
pub async fn walk(dir: &ResolvedPath) -> Result<Vec<ResolvedPath>, FileError> {
    let mut files = Vec::new();
    walk_into(dir.as_path().to_path_buf(), &mut files).await?;
    debug!(dir = %dir, count = files.len(), "Walked directory");
    Ok(files)
}

fn walk_into<'a>(
    dir: PathBuf,
    files: &'a mut Vec<ResolvedPath>,
) -> Pin<Box<dyn Future<Output = Result<(), FileError>> + Send + 'a>> {
    Box::pin(async move {
        let read_error = |source| FileError::DirectoryRead {
            path: dir.clone(),
            source,
        };
        let mut entries = tokio::fs::read_dir(&dir).await.map_err(read_error)?;

        while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
            let path = entry.path();
            let file_type = entry.file_type().await.map_err(read_error)?;
            if file_type.is_dir() {
                walk_into(path, files).await?;
            } else {
                files.push(ResolvedPath(path));
            }
        }
        Ok(())
    })
}

/// Turns a list of file and directory inputs into a flat list of files.
///
/// Output order is the concatenation, in input order, of each input's expansion.
/// The same file reached through two inputs appears twice.
pub async fn collect<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<ResolvedPath>, FileError> {
    let mut results = Vec::new();

    for path in paths {
        let resolved = validate(path).await?;
        let metadata = tokio::fs::metadata(resolved.as_path())
            .await
            .map_err(|source| FileError::Metadata {
                path: resolved.as_path().to_path_buf(),
                source,
            })?;

        if metadata.is_dir() {
            results.extend(walk(&resolved).await?);
        } else {
            results.push(resolved);
        }
    }

    debug!(
        paths = ?results.iter().map(ResolvedPath::to_string).collect::<Vec<_>>(),
        "Valid file paths"
    );
    Ok(results)
}

/// Reads every path concurrently, dropping the ones that fail.
///
/// The returned contents keep the order of `paths`.
pub async fn read_contents(paths: &[ResolvedPath]) -> Vec<String> {
    let reads = paths.iter().map(|path| async move {
        match tokio::fs::read_to_string(path.as_path()).await {
            Ok(content) => Some(content),
            Err(e) => {
                warn!(path = %path, error = %e, "Error reading file, leaving it out");
                None
            }
        }
    });

    join_all(reads).await.into_iter().flatten().collect()
}

/// Reads `paths` and joins the readable contents with [`SEPARATOR`].
pub async fn aggregate(paths: &[ResolvedPath]) -> String {
    let contents = read_contents(paths).await;
    info!(
        requested = paths.len(),
        read = contents.len(),
        "Aggregated file contents"
    );
    contents.join(SEPARATOR)
}

/// Writes `content` to `path`, replacing any existing file.
pub async fn write_contents(path: impl AsRef<Path>, content: &str) -> Result<(), FileError> {
    let path = path.as_ref();
    tokio::fs::write(path, content).await.map_err(|source| {
        error!(path = %path.display(), error = %source, "Error writing to file");
        FileError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}
