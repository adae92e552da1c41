//! Shared foundational types used across the moss PAR toolchain.
//!
//! This crate provides interned identifiers (used for graph port names and
//! other hot comparisons) and the common result types distinguishing
//! internal tool bugs from user-facing diagnostics.

#![warn(missing_docs)]

pub mod ident;
pub mod result;

pub use ident::{Ident, Interner};
pub use result::{InternalError, MossResult};
