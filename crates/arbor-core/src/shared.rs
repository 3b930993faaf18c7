//! Registry handle shared between async tasks.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::registry::Registry;

/// Cloneable handle over one registry.
///
/// Readers share a consistent view. A writer excludes every reader, so the
/// mutations it makes are serialized one at a time.
#[derive(Debug, Clone)]
pub struct SharedRegistry {
    inner: Arc<RwLock<Registry>>,
}

impl SharedRegistry {
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.inner.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.inner.write().await
    }

    /// Run a read-only closure under the read lock.
    pub async fn query<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Registry) -> R,
    {
        let registry = self.inner.read().await;
        f(&registry)
    }

    /// Run a mutation under the write lock.
    pub async fn apply<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Registry) -> R,
    {
        let mut registry = self.inner.write().await;
        f(&mut registry)
    }
}

impl From<Registry> for SharedRegistry {
    fn from(registry: Registry) -> Self {
        Self::new(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::error::Result;
    use arbor_governance::ProposalKind;
    use arbor_ledger::Address;

    fn grant(
        reg: &mut Registry,
        node: &Address,
        member: Address,
        amount: u64,
        admin: &Address,
    ) -> Result<()> {
        let id = reg.create_proposal(node, ProposalKind::AddMember { member, amount }, admin)?;
        reg.vote(node, id, true, admin)?;
        reg.process_voting(node, id, admin)
    }

    #[tokio::test]
    async fn concurrent_writers_are_serialized() {
        let shared = SharedRegistry::new(Registry::new(RegistryConfig::new()));
        let admin = Address::from_label("admin");
        let node = shared.apply(|reg| reg.construct([admin], &[])).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16u64 {
            let shared = shared.clone();
            handles.push(tokio::spawn(async move {
                let member = Address::from_label(&format!("member-{}", i));
                shared.apply(|reg| grant(reg, &node, member, i + 1, &admin)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let supply = shared.query(|reg| reg.total_supply(&node)).await.unwrap();
        assert_eq!(supply, (1..=16).sum::<u64>());
        shared.read().await.check_invariants().unwrap();
    }

    #[tokio::test]
    async fn readers_see_one_state() {
        let shared: SharedRegistry = Registry::new(RegistryConfig::new()).into();
        let x = Address::from_label("x");
        let node = shared.write().await.construct([x], &[]).unwrap();

        let (a, b) = tokio::join!(
            shared.query(|reg| reg.len()),
            shared.query(|reg| reg.contains_node(&node)),
        );
        assert_eq!(a, 1);
        assert!(b);
    }
}
