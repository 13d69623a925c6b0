//! Job scheduler collaborator
//!
//! The router is built around a client of the compute-job backend. Sibling
//! endpoints (submit, status, cancel) drive jobs through it; the open endpoint
//! only needs it to exist, since job output is read straight from disk.

use std::sync::Arc;

use crate::config::JobsConfig;
use crate::error::ServerError;

/// Client of a compute-job backend
pub trait JobClient: Send + Sync + 'static {
    /// Backend name, used in startup logs
    fn backend(&self) -> &str;
}

/// Backend that runs jobs on the local host
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClient;

impl LocalClient {
    pub const BACKEND: &'static str = "local";
}

impl JobClient for LocalClient {
    fn backend(&self) -> &str {
        Self::BACKEND
    }
}

/// Build the client selected by `jobs.backend`
pub fn client_from_config(cfg: &JobsConfig) -> Result<Arc<LocalClient>, ServerError> {
    match cfg.backend.as_str() {
        LocalClient::BACKEND => Ok(Arc::new(LocalClient)),
        other => Err(ServerError::UnsupportedBackend(other.to_string())),
    }
}
