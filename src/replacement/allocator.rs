//! Per-request allocation of pool values.
//!
//! The allocator remembers every substitute handed out during one request
//! so a pool pick can avoid giving two different originals the same value.
//! When a pool has no unused value left it wraps around to the hashed slot
//! and records the pool as exhausted; that is degraded output, not an error.

use super::generators::hash_index;
use std::collections::{BTreeSet, HashSet};
use tracing::warn;

#[derive(Debug, Default)]
pub struct PoolAllocator {
    used: HashSet<String>,
    exhausted: BTreeSet<String>,
}

impl PoolAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `value` as handed out.
    pub fn claim(&mut self, value: &str) {
        if !self.used.contains(value) {
            self.used.insert(value.to_string());
        }
    }

    pub fn is_used(&self, value: &str) -> bool {
        self.used.contains(value)
    }

    /// Picks a value for `original` from `pool`.
    ///
    /// The search starts at the slot chosen by hashing `original` and walks the
    /// pool in order, skipping values already handed out and the original
    /// itself. Returns `None` only for an empty pool.
    pub fn pick(&mut self, pool_name: &str, pool: &[String], original: &str) -> Option<String> {
        if pool.is_empty() {
            return None;
        }

        let start = hash_index(original, pool.len());
        let walk = (0..pool.len()).map(|offset| &pool[(start + offset) % pool.len()]);

        let fresh = walk
            .clone()
            .find(|candidate| candidate.as_str() != original && !self.is_used(candidate));

        let value = match fresh {
            Some(value) => value.clone(),
            None => {
                if self.exhausted.insert(pool_name.to_string()) {
                    warn!(pool = pool_name, size = pool.len(), "Replacement pool exhausted, reusing values");
                }
                walk
                    .clone()
                    .find(|candidate| candidate.as_str() != original)
                    .unwrap_or(&pool[start])
                    .clone()
            }
        };

        self.claim(&value);
        Some(value)
    }

    /// Pools that ran out of unused values during this request.
    pub fn exhausted_pools(&self) -> impl Iterator<Item = &str> {
        self.exhausted.iter().map(String::as_str)
    }
}
