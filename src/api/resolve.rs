//! Path parameter resolution for the open endpoint

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

use crate::error::OpenError;

/// Name of the query parameter carrying the file path
pub const PATH_PARAM: &str = "path";

/// A validated, non-empty `path` parameter, exactly as the caller sent it
/// after percent-decoding. The decoded bytes are kept as-is, so file names
/// that are not valid UTF-8 survive. No normalization or symlink resolution
/// is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath(PathBuf);

impl ResolvedPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Extract the `path` parameter from a raw query string.
///
/// Pairs are split on `&` and `=`, `+` means space, and percent escapes are
/// decoded to raw bytes. The first occurrence wins; other parameters are
/// ignored. Absent and empty values are both `MissingPathParameter`.
pub fn resolve_path(query: Option<&str>) -> Result<ResolvedPath, OpenError> {
    query
        .and_then(|q| {
            q.split('&').find_map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_component(key) == PATH_PARAM.as_bytes())
                    .then(|| decode_component(value))
            })
        })
        .filter(|value| !value.is_empty())
        .map(|bytes| ResolvedPath(path_from_bytes(bytes)))
        .ok_or(OpenError::MissingPathParameter)
}

fn decode_component(component: &str) -> Vec<u8> {
    let spaced = component.replace('+', " ");
    percent_decode_str(&spaced).collect()
}

#[cfg(unix)]
fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    use std::os::unix::ffi::OsStringExt;
    PathBuf::from(OsString::from_vec(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    PathBuf::from(OsString::from(String::from_utf8_lossy(&bytes).into_owned()))
}
