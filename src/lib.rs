//! Favicon resolver
//!
//! Resolves a favicon for any domain by probing an ordered list of candidate
//! sources, caching the first success per `(domain, size)`, and synthesizing
//! a letter avatar when nothing answers.

pub mod config;
pub mod errors;
pub mod models;
pub mod services;
pub mod utils;
pub mod web;
