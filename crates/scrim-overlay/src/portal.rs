#![forbid(unsafe_code)]

//! Portal mount: reference-counted insertion roots.
//!
//! Each [`PortalKey`] maps to at most one host root. The first acquire
//! creates it; later acquires reuse it; the last release removes it. Distinct
//! keys give independent roots, e.g. one per nested layout context.

use ahash::AHashMap;
use scrim_core::{Host, HostError, NodeId, PortalKey};

#[derive(Debug, Clone, Copy)]
struct Root {
    node: NodeId,
    refs: usize,
}

/// Owner of every insertion root the engine has asked the host for.
#[derive(Debug, Default)]
pub struct PortalMount {
    roots: AHashMap<PortalKey, Root>,
}

impl PortalMount {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a reference on the root for `key`, creating it on first use.
    ///
    /// # Errors
    ///
    /// Whatever the host reports when it cannot create the root. No
    /// reference is taken in that case.
    pub fn acquire(&mut self, host: &mut impl Host, key: &PortalKey) -> Result<NodeId, HostError> {
        if let Some(root) = self.roots.get_mut(key) {
            root.refs += 1;
            return Ok(root.node);
        }
        let node = host.create_root(key)?;
        tracing::debug!(portal = %key, node = node.0, "portal root created");
        self.roots.insert(key.clone(), Root { node, refs: 1 });
        Ok(node)
    }

    /// Drop a reference; removes the host root when none remain.
    ///
    /// Returns `true` if the root was removed.
    pub fn release(&mut self, host: &mut impl Host, key: &PortalKey) -> bool {
        let Some(root) = self.roots.get_mut(key) else {
            return false;
        };
        root.refs = root.refs.saturating_sub(1);
        if root.refs > 0 {
            return false;
        }
        let node = root.node;
        self.roots.remove(key);
        host.remove_root(node);
        tracing::debug!(portal = %key, node = node.0, "portal root removed");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrim_core::testing::ScriptedHost;

    #[test]
    fn acquire_is_idempotent_per_key() {
        let mut host = ScriptedHost::new();
        let mut portal = PortalMount::new();
        let key = PortalKey::default();

        let a = portal.acquire(&mut host, &key).unwrap();
        let b = portal.acquire(&mut host, &key).unwrap();
        assert_eq!(a, b);
        assert_eq!(host.created_roots().len(), 1);
        assert_eq!(portal.roots[&key].refs, 2);
    }

    #[test]
    fn last_release_removes_root() {
        let mut host = ScriptedHost::new();
        let mut portal = PortalMount::new();
        let key = PortalKey::new("sidebar");

        portal.acquire(&mut host, &key).unwrap();
        portal.acquire(&mut host, &key).unwrap();
        assert!(!portal.release(&mut host, &key));
        assert_eq!(host.live_roots(), 1);
        assert!(portal.release(&mut host, &key));
        assert_eq!(host.live_roots(), 0);
        assert!(portal.roots.is_empty());
    }

    #[test]
    fn distinct_keys_get_distinct_roots() {
        let mut host = ScriptedHost::new();
        let mut portal = PortalMount::new();
        let a = portal.acquire(&mut host, &PortalKey::new("a")).unwrap();
        let b = portal.acquire(&mut host, &PortalKey::new("b")).unwrap();
        assert_ne!(a, b);
        assert_eq!(portal.roots.len(), 2);
    }

    #[test]
    fn failed_acquire_takes_no_reference() {
        let mut host = ScriptedHost::new();
        host.fail_mounts(true);
        let mut portal = PortalMount::new();
        let key = PortalKey::default();
        assert_eq!(portal.acquire(&mut host, &key), Err(HostError::NotReady));
        assert!(!portal.roots.contains_key(&key));
        assert!(!portal.release(&mut host, &key));
    }
}
