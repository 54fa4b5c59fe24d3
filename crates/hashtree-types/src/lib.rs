//! Core types for hashtree
//!
//! This crate provides the [`Digest`] value shared by every hashtree crate,
//! together with its hex and URL-safe base64 renditions.

pub mod encoding;
pub mod error;

pub use encoding::Digest;
pub use error::{Error, Result};
