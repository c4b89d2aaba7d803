//! Income and expense bookkeeping, and the reports built on top of it.

pub mod domain;
pub mod http;
pub mod reporting;
pub mod services;
