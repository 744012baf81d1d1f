#![warn(missing_docs)]
//! # shelter-core
//!
//! Core traits and types for the shelter offline caching proxy.
//!
//! This crate holds the vocabulary shared by every other shelter crate:
//!
//! - **Identify** cached entries ([`CacheKey`])
//! - **Describe** intercepted traffic ([`FetchRequest`], [`FetchResponse`])
//! - **Call** the network ([`Upstream`])
//! - **Execute** background tasks ([`Offload`])
//!
//! Storage lives in `shelter-backend`, the caching decisions in `shelter`.

pub mod key;
pub mod offload;
pub mod request;
pub mod response;
pub mod upstream;

pub use key::CacheKey;
pub use offload::{DisabledOffload, Offload};
pub use request::{FetchRequest, RequestMode};
pub use response::{FetchResponse, ResponseSource};
#[doc(hidden)]
pub use smol_str::SmolStr;
pub use upstream::{FetchError, Upstream};

/// Raw byte data type used for serialized cache values.
/// Using `Bytes` provides efficient zero-copy cloning via reference counting.
pub type Raw = bytes::Bytes;
