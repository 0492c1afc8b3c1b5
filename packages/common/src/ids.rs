use crc32fast::Hasher;
use std::sync::atomic::{AtomicU32, Ordering};

/// Source of fresh identifiers for stored documents and sync ids
pub trait IdGenerator: Send + Sync {
    /// Generate the next unique id
    fn next_id(&self) -> String;

    /// Cross-branch correlation token for a new document of `application_id`
    fn sync_id(&self, application_id: &str) -> String {
        format!("{}_{}", application_id, self.next_id())
    }
}

/// Derive a short, stable seed from a namespace using CRC32
pub fn namespace_seed(namespace: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(namespace.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential ids under a CRC32 namespace seed (`<seed>-1`, `<seed>-2`, ...)
///
/// Deterministic, so tests can predict the ids the store hands out.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    seed: String,
    count: AtomicU32,
}

impl SequentialIdGenerator {
    pub fn new(namespace: &str) -> Self {
        Self::from_seed(namespace_seed(namespace))
    }

    pub fn from_seed(seed: String) -> Self {
        Self {
            seed,
            count: AtomicU32::new(0),
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        let n = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", self.seed, n)
    }
}

/// Random v4 UUIDs
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}
