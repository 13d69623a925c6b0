//! HTTP protocol layer module
//!
//! Body types and response builders, decoupled from the endpoints using them.

pub mod body;
pub mod response;

// Re-export commonly used types
pub use body::{empty_body, full_body, stream_body, ResponseBody};
pub use response::{
    build_400_response, build_404_response, build_405_response, build_stream_response,
};
