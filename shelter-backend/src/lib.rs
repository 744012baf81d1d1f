//! Traits and structs for shelter backend interaction.
//!
//! A backend stores any number of named *generations*. Each generation maps a
//! [`CacheKey`](shelter_core::CacheKey) to a serialized response. If you want
//! to implement your own storage, you are in the right place.
mod backend;
mod error;
pub mod format;

pub use backend::{Backend, BackendResult, CacheBackend};
pub use error::BackendError;
pub use format::{Format, FormatError, JsonFormat};

/// Status of deleting result.
#[derive(Debug, PartialEq, Eq)]
pub enum DeleteStatus {
    /// Record successfully deleted.
    Deleted(u32),
    /// Record already missing.
    Missing,
}
