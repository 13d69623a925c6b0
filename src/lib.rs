//! red-box: the compute-host agent of a job scheduling control plane.
//!
//! Serves job output and log files to remote callers over HTTP
//! (`GET /open?path=<file>`), so no shared network storage is needed.

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod jobs;
pub mod logger;
pub mod server;
