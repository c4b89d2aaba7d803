pub mod authentication;
pub mod cli;
mod client_ip;
pub mod cors;
pub mod database;
pub mod http_err;
pub mod identities;
pub mod ledger;
pub mod models;
pub mod passwords;
pub mod rate_limit;
pub mod repos;
pub mod server;
