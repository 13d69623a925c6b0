//! Remote file open endpoint
//!
//! `GET /open?path=<p>` answers with the raw bytes of `<p>`:
//! - 400 with a fixed message when `path` is absent or empty
//! - 404 when the path cannot be opened as a regular file
//! - 200 with the file streamed verbatim otherwise

use std::io;
use std::path::{Path, PathBuf};

use hyper::Response;
use tokio::fs::File;

use super::resolve::{resolve_path, ResolvedPath};
use crate::config::FilesConfig;
use crate::error::OpenError;
use crate::http::{self, ResponseBody};
use crate::logger;

/// Exact body of the 400 response
pub const NO_PATH_MESSAGE: &str = "no path query parameter is found\n";

/// A file opened for streaming
#[derive(Debug)]
pub struct OpenedFile {
    pub path: ResolvedPath,
    pub file: File,
}

/// Result classification of one open request
#[derive(Debug)]
pub enum Outcome {
    BadRequest,
    NotFound,
    Success(OpenedFile),
}

impl From<Result<OpenedFile, OpenError>> for Outcome {
    fn from(result: Result<OpenedFile, OpenError>) -> Self {
        match result {
            Ok(opened) => Self::Success(opened),
            Err(OpenError::MissingPathParameter) => Self::BadRequest,
            Err(OpenError::FileUnavailable { .. }) => Self::NotFound,
        }
    }
}

impl Outcome {
    pub fn into_response(self, chunk_size: usize) -> Response<ResponseBody> {
        match self {
            Self::BadRequest => http::build_400_response(NO_PATH_MESSAGE),
            Self::NotFound => http::build_404_response(),
            Self::Success(OpenedFile { path, file }) => http::build_stream_response(
                http::stream_body(file, chunk_size, path.as_path()),
            ),
        }
    }
}

/// Serves the open endpoint from the local filesystem
#[derive(Debug, Clone)]
pub struct OpenResponder {
    /// Set when any root was configured, even if none could be resolved
    restricted: bool,
    /// Canonical forms of the configured roots
    allowed_roots: Vec<PathBuf>,
    chunk_size: usize,
}

impl OpenResponder {
    /// Roots that cannot be canonicalized are skipped with a warning, so a
    /// misconfigured root narrows access rather than widening it.
    pub fn new(files: &FilesConfig) -> Self {
        let allowed_roots = files
            .allowed_roots
            .iter()
            .filter_map(|root| match std::fs::canonicalize(root) {
                Ok(p) => Some(p),
                Err(e) => {
                    logger::log_warning(&format!("Ignoring allowed root '{root}': {e}"));
                    None
                }
            })
            .collect();

        Self {
            restricted: !files.allowed_roots.is_empty(),
            allowed_roots,
            chunk_size: files.chunk_size,
        }
    }

    /// Handle one request given its raw query string
    pub async fn handle(&self, query: Option<&str>) -> Response<ResponseBody> {
        self.fetch(query).await.into_response(self.chunk_size)
    }

    /// Classify a request without building the response
    pub async fn fetch(&self, query: Option<&str>) -> Outcome {
        let result = match resolve_path(query) {
            Ok(path) => self.open(path).await,
            Err(e) => Err(e),
        };
        Outcome::from(result)
    }

    async fn open(&self, path: ResolvedPath) -> Result<OpenedFile, OpenError> {
        let target = self.check_allowed(&path).await?;

        // Opening a FIFO or device would block until a peer shows up
        let meta = tokio::fs::metadata(&target)
            .await
            .map_err(|e| OpenError::unavailable(path.as_path(), e))?;
        ensure_regular_file(&path, &meta)?;

        let file = File::open(&target)
            .await
            .map_err(|e| OpenError::unavailable(path.as_path(), e))?;

        // The entry may have been swapped between the two checks
        let meta = file
            .metadata()
            .await
            .map_err(|e| OpenError::unavailable(path.as_path(), e))?;
        ensure_regular_file(&path, &meta)?;

        Ok(OpenedFile { path, file })
    }

    /// Returns the path to open: the caller's path when unrestricted,
    /// otherwise its canonical form after checking it lies under a root.
    async fn check_allowed(&self, path: &ResolvedPath) -> Result<PathBuf, OpenError> {
        if !self.restricted {
            return Ok(path.as_path().to_path_buf());
        }

        let canonical = tokio::fs::canonicalize(path.as_path())
            .await
            .map_err(|e| OpenError::unavailable(path.as_path(), e))?;

        if self.is_under_root(&canonical) {
            Ok(canonical)
        } else {
            logger::log_warning(&format!(
                "Open outside allowed roots blocked: {} -> {}",
                path,
                canonical.display()
            ));
            Err(OpenError::unavailable(
                path.as_path(),
                io::Error::new(io::ErrorKind::PermissionDenied, "outside allowed roots"),
            ))
        }
    }

    fn is_under_root(&self, canonical: &Path) -> bool {
        self.allowed_roots
            .iter()
            .any(|root| canonical.starts_with(root))
    }
}

fn ensure_regular_file(path: &ResolvedPath, meta: &std::fs::Metadata) -> Result<(), OpenError> {
    if meta.is_file() {
        Ok(())
    } else {
        Err(OpenError::unavailable(
            path.as_path(),
            io::Error::other("not a regular file"),
        ))
    }
}
