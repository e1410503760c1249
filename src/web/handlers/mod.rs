//! Web handlers module
//!
//! HTTP request handlers; each delegates to the resolver and maps the outcome
//! onto a response.

pub mod favicon;
pub mod health;
