//! Request middleware owned by the HTTP layer.

pub mod access_log;
pub mod body_parser;

pub use access_log::access_log;
pub use body_parser::{body_parser, BodyLimits, ParsedBody};
