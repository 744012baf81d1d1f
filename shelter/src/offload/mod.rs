//! Offload manager for background task execution.
//!
//! Write-through and stale-while-revalidate refreshes run here, off the
//! response path. A failed background task is logged and never reaches the
//! caller that triggered it.
//!
//! ```ignore
//! use shelter::offload::{OffloadConfig, OffloadManager};
//!
//! let manager = OffloadManager::new(OffloadConfig::default());
//! manager.spawn("write_through", async {
//!     // store the response
//! });
//! ```

mod manager;
mod policy;

pub use manager::{OffloadHandle, OffloadKey, OffloadManager};
pub use policy::{OffloadConfig, OffloadConfigBuilder, TimeoutPolicy};
