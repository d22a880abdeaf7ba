//! Deterministic request identities
//!
//! A key is the namespace of a logical operation joined with the
//! canonical JSON encoding of its argument list. Arguments are first
//! converted to `serde_json::Value`, whose object representation keeps
//! keys sorted, so logically equal argument structures always encode to
//! the same text regardless of field or insertion order.

use crate::error::{CacheError, Result};
use crate::types::CacheKey;
use serde::Serialize;

/// Derive the cache identity for a call to `namespace` with `args`
///
/// Pure and deterministic: equal `(namespace, args)` pairs always
/// produce equal keys, unequal pairs different keys. Arguments must be
/// plain serializable values; anything else is a caller programming
/// error reported as [`CacheError::Serialization`].
pub fn build_key<A: Serialize>(namespace: &str, args: &A) -> Result<CacheKey> {
    let canonical = serde_json::to_value(args)
        .map_err(|e| CacheError::Serialization(e.to_string()))?;
    Ok(format!("{}:{}", namespace, canonical))
}

/// Chainable key builder for call sites assembling arguments one by one
///
/// Serialization failures are deferred to [`build`](KeyBuilder::build)
/// so the chain itself stays infallible.
#[derive(Debug)]
pub struct KeyBuilder {
    namespace: String,
    args: Vec<serde_json::Value>,
    error: Option<CacheError>,
}

impl KeyBuilder {
    /// Create a builder for the given namespace
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            args: Vec::new(),
            error: None,
        }
    }

    /// Append one argument
    pub fn arg<V: Serialize>(mut self, value: &V) -> Self {
        if self.error.is_none() {
            match serde_json::to_value(value) {
                Ok(v) => self.args.push(v),
                Err(e) => self.error = Some(CacheError::Serialization(e.to_string())),
            }
        }
        self
    }

    /// Build the cache key
    pub fn build(self) -> Result<CacheKey> {
        if let Some(error) = self.error {
            return Err(error);
        }
        build_key(&self.namespace, &self.args)
    }
}
