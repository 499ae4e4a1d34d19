//! HTTP protocol layer module
//!
//! Header parsing and response building shared by the dispatch engine,
//! decoupled from any particular endpoint.

pub mod accept;
pub mod body;
pub mod conditional;
pub mod cors;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use accept::Accept;
pub use body::{json_body, require_content_type, to_json};
pub use conditional::{CacheHeaders, EntityTag, Precondition, Preconditions};
pub use cors::{AccessControlRequest, AccessControlResponse};
pub use range::{ContentRange, IfRangePolicy, Range};
pub use response::HttpResponse;
