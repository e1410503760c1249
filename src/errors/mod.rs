//! Centralized error handling for the favicon resolver
//!
//! Errors are split by how far they are allowed to travel:
//!
//! - **Fetch Errors**: a single candidate source failed. These never leave the
//!   resolver; they only advance it to the next candidate.
//! - **Render Errors**: avatar synthesis failed. There is no lower fallback
//!   tier, so these surface to the caller.
//! - **Validation Errors**: the request was unusable (missing domain, bad
//!   size or colour). Raised at the boundary before the resolver runs.
//!
//! # Usage
//!
//! ```rust
//! use favicon_resolver::errors::{AppError, AppResult};
//!
//! fn parse_size(raw: &str) -> AppResult<u32> {
//!     raw.parse()
//!         .map_err(|_| AppError::validation(format!("Invalid size: {raw}")))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for a single fetch attempt
pub type FetchResult<T> = Result<T, FetchError>;

/// Convenience type alias for avatar rendering
pub type RenderResult<T> = Result<T, RenderError>;
