//! Routing module
//!
//! Provides path pattern routing for the mux:
//! - Literal and `{variable}` segments
//! - Most specific match first, registration order among equals

mod matcher;
mod pattern;
mod vars;

use thiserror::Error;

pub use matcher::RouteTable;
pub use pattern::{Pattern, Segment};
pub use vars::RouteVars;

/// Why a route pattern was refused at registration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route pattern {0:?} must start with '/'")]
    MissingLeadingSlash(String),

    #[error("route pattern {0:?} has an empty variable name")]
    EmptyVariable(String),

    #[error("route pattern {0:?} has an unterminated or misplaced brace")]
    UnterminatedVariable(String),

    #[error("route pattern {pattern:?} declares variable {name:?} twice")]
    DuplicateVariable { pattern: String, name: String },

    #[error("route pattern {pattern:?} conflicts with {existing:?}")]
    Conflict { pattern: String, existing: String },
}
