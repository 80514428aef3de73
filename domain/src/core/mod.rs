//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: domain-level errors
//! - [`id`]: short ids, message ids and the UTC clock
//! - [`string`]: UTF-8 safe truncation helpers

pub mod error;
pub mod id;
pub mod string;
