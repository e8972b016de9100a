//! Shared building blocks for the Maestro gateway crates

#![allow(clippy::must_use_candidate)]

mod error;
pub mod id;

pub use error::HttpError;
pub use id::{IdNamespace, generate_id};
