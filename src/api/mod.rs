//! Job control plane HTTP API
//!
//! Currently exposes the remote file open endpoint used to fetch job output
//! and log files from this host.

pub mod open;
pub mod resolve;
pub mod router;

// Re-export main entry points
pub use open::{OpenResponder, OpenedFile, Outcome, NO_PATH_MESSAGE};
pub use resolve::{resolve_path, ResolvedPath};
pub use router::{Router, OPEN_PATH};
