//! Builder for configuring [`MokaBackend`].

use moka::future::{Cache, CacheBuilder};
use moka::policy::EvictionPolicy;
use shelter_backend::format::{Format, JsonFormat};
use shelter_core::{CacheKey, Raw};
use smol_str::SmolStr;

use crate::backend::MokaBackend;

/// Fixed overhead estimate for a stored entry besides its URL and payload.
const ENTRY_OVERHEAD: usize = 64;

#[derive(Clone, Copy)]
enum Capacity {
    Entries(u64),
    Bytes(u64),
}

/// Creates the per-generation caches with the configured limits.
#[derive(Clone)]
pub(crate) struct GenerationFactory {
    capacity: Capacity,
    eviction_policy: EvictionPolicy,
}

impl GenerationFactory {
    pub(crate) fn build(&self) -> Cache<CacheKey, Raw> {
        match self.capacity {
            Capacity::Entries(entries) => CacheBuilder::new(entries)
                .eviction_policy(self.eviction_policy.clone())
                .build(),
            Capacity::Bytes(bytes) => CacheBuilder::new(bytes)
                .weigher(byte_weigher)
                .eviction_policy(self.eviction_policy.clone())
                .build(),
        }
    }
}

/// Approximate byte cost of an entry: URL, payload and fixed overhead.
fn byte_weigher(key: &CacheKey, value: &Raw) -> u32 {
    (key.url().len() + value.len() + ENTRY_OVERHEAD).min(u32::MAX as usize) as u32
}

/// Marker type: capacity has not been configured yet.
///
/// You must call either [`max_entries()`](MokaBackendBuilder::max_entries) or
/// [`max_bytes()`](MokaBackendBuilder::max_bytes) before calling `build()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapacity;

/// Marker type: entry-count capacity per generation has been configured.
#[derive(Debug, Clone, Copy)]
pub struct EntryCapacity(pub(crate) u64);

/// Marker type: byte-based capacity per generation has been configured.
#[derive(Debug, Clone, Copy)]
pub struct ByteCapacity(pub(crate) u64);

/// Builder for creating and configuring a [`MokaBackend`].
///
/// Capacity is required and applies to every generation separately. The
/// typestate makes `build()` available only once it is set.
///
/// ```
/// use shelter_moka::{EvictionPolicy, MokaBackend};
///
/// let backend = MokaBackend::builder()
///     .max_bytes(50 * 1024 * 1024)
///     .eviction_policy(EvictionPolicy::lru())
///     .label("assets")
///     .build();
/// ```
pub struct MokaBackendBuilder<Cap, S = JsonFormat>
where
    S: Format,
{
    capacity: Cap,
    serializer: S,
    label: SmolStr,
    eviction_policy: Option<EvictionPolicy>,
}

impl MokaBackendBuilder<NoCapacity, JsonFormat> {
    /// Creates a new builder with no capacity configured.
    pub fn new() -> Self {
        Self {
            capacity: NoCapacity,
            serializer: JsonFormat,
            label: SmolStr::new_static("moka"),
            eviction_policy: None,
        }
    }
}

impl Default for MokaBackendBuilder<NoCapacity, JsonFormat> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> MokaBackendBuilder<NoCapacity, S>
where
    S: Format,
{
    /// Sets the maximum number of entries each generation can hold.
    pub fn max_entries(self, capacity: u64) -> MokaBackendBuilder<EntryCapacity, S> {
        MokaBackendBuilder {
            capacity: EntryCapacity(capacity),
            serializer: self.serializer,
            label: self.label,
            eviction_policy: self.eviction_policy,
        }
    }

    /// Sets the approximate memory budget in bytes for each generation.
    pub fn max_bytes(self, bytes: u64) -> MokaBackendBuilder<ByteCapacity, S> {
        MokaBackendBuilder {
            capacity: ByteCapacity(bytes),
            serializer: self.serializer,
            label: self.label,
            eviction_policy: self.eviction_policy,
        }
    }
}

impl<Cap, S> MokaBackendBuilder<Cap, S>
where
    S: Format,
{
    /// Sets a custom label for this backend, shown in logs.
    ///
    /// Default: `"moka"`.
    pub fn label(mut self, label: impl Into<SmolStr>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the eviction policy.
    ///
    /// Defaults to [`EvictionPolicy::tiny_lfu()`] for entry capacity and
    /// [`EvictionPolicy::lru()`] for byte capacity. TinyLFU may refuse to admit
    /// a new entry into a full generation, LRU always admits it.
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }

    /// Sets the value serialization format.
    pub fn value_format<NewS>(self, serializer: NewS) -> MokaBackendBuilder<Cap, NewS>
    where
        NewS: Format,
    {
        MokaBackendBuilder {
            capacity: self.capacity,
            serializer,
            label: self.label,
            eviction_policy: self.eviction_policy,
        }
    }
}

impl<S> MokaBackendBuilder<EntryCapacity, S>
where
    S: Format,
{
    /// Builds the [`MokaBackend`] with entry-count based capacity.
    pub fn build(self) -> MokaBackend<S> {
        let factory = GenerationFactory {
            capacity: Capacity::Entries(self.capacity.0),
            eviction_policy: self
                .eviction_policy
                .unwrap_or_else(EvictionPolicy::tiny_lfu),
        };
        MokaBackend::from_parts(factory, self.serializer, self.label)
    }
}

impl<S> MokaBackendBuilder<ByteCapacity, S>
where
    S: Format,
{
    /// Builds the [`MokaBackend`] with byte-based capacity.
    pub fn build(self) -> MokaBackend<S> {
        let factory = GenerationFactory {
            capacity: Capacity::Bytes(self.capacity.0),
            eviction_policy: self.eviction_policy.unwrap_or_else(EvictionPolicy::lru),
        };
        MokaBackend::from_parts(factory, self.serializer, self.label)
    }
}
