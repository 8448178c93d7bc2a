//! Claim store — point lookups for persistent claims.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::types::Claim;

/// Point-read access to persistent claims.
///
/// In production this is backed by the orchestrator's watch cache and is
/// eventually consistent relative to live cluster state; reconciling that
/// lag is not the placement engine's concern.
pub trait ClaimStore: Send + Sync {
    /// Look up a claim by namespace and name.
    fn get(&self, namespace: &str, name: &str) -> StoreResult<Claim>;
}

/// Map-backed claim store for tests and single-process runs.
#[derive(Debug, Default)]
pub struct InMemoryClaimStore {
    claims: RwLock<HashMap<String, Claim>>,
}

impl InMemoryClaimStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a claim, keyed by `{namespace}/{name}`.
    pub fn insert(&self, claim: Claim) {
        let mut claims = self.claims.write().unwrap_or_else(|e| e.into_inner());
        claims.insert(claim.key(), claim);
    }

    /// Remove a claim. Returns the removed claim, if present.
    pub fn remove(&self, namespace: &str, name: &str) -> Option<Claim> {
        let mut claims = self.claims.write().unwrap_or_else(|e| e.into_inner());
        claims.remove(&format!("{namespace}/{name}"))
    }
}

impl ClaimStore for InMemoryClaimStore {
    fn get(&self, namespace: &str, name: &str) -> StoreResult<Claim> {
        let claims = self.claims.read().unwrap_or_else(|e| e.into_inner());
        claims
            .get(&format!("{namespace}/{name}"))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccessMode;

    fn make_claim(ns: &str, name: &str) -> Claim {
        Claim {
            name: name.to_string(),
            namespace: ns.to_string(),
            access_modes: vec![AccessMode::ReadWriteOnce],
        }
    }

    #[test]
    fn get_returns_inserted_claim() {
        let store = InMemoryClaimStore::new();
        store.insert(make_claim("prod", "db"));

        let claim = store.get("prod", "db").unwrap();
        assert_eq!(claim.name, "db");
        assert_eq!(claim.namespace, "prod");
    }

    #[test]
    fn get_missing_is_not_found() {
        let store = InMemoryClaimStore::new();
        let err = store.get("prod", "absent").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn lookups_are_namespace_scoped() {
        let store = InMemoryClaimStore::new();
        store.insert(make_claim("prod", "db"));

        assert!(store.get("staging", "db").unwrap_err().is_not_found());
    }

    #[test]
    fn remove_then_get_is_not_found() {
        let store = InMemoryClaimStore::new();
        store.insert(make_claim("prod", "db"));

        assert!(store.remove("prod", "db").is_some());
        assert!(store.get("prod", "db").unwrap_err().is_not_found());
    }
}
