//! Cookie sessions identifying the owner of each request.

pub mod domain;
pub mod http;
