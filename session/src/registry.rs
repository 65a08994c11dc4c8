//! Addresses of contracts this manager deployed.
//!
//! Process-local and lost on restart. The remote environment stays
//! authoritative for whether an address still hosts a live contract.

use std::collections::HashSet;

use votebox_types::Address;

#[derive(Debug, Default)]
pub struct SessionRegistry {
    addresses: HashSet<Address>,
    closed: HashSet<Address>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly deployed contract. Returns `false` if already known.
    pub fn insert(&mut self, address: Address) -> bool {
        self.addresses.insert(address)
    }

    /// Forget a contract without marking it closed. Returns `false` if it was
    /// not registered.
    pub fn remove(&mut self, address: &Address) -> bool {
        self.addresses.remove(address)
    }

    /// Move a destroyed contract out of the live set. Returns `false` if it
    /// was not registered.
    pub fn close(&mut self, address: Address) -> bool {
        let was_live = self.addresses.remove(&address);
        self.closed.insert(address);
        was_live
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.addresses.contains(address)
    }

    /// Whether the contract at `address` is known to have been destroyed.
    pub fn is_closed(&self, address: &Address) -> bool {
        self.closed.contains(address)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// All registered addresses, in no particular order.
    pub fn addresses(&self) -> Vec<Address> {
        self.addresses.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_remove() {
        let mut registry = SessionRegistry::new();
        let a = Address::with_last_byte(1);
        assert!(registry.insert(a));
        assert!(!registry.insert(a));
        assert!(registry.contains(&a));
        assert_eq!(registry.len(), 1);
        assert!(registry.remove(&a));
        assert!(!registry.remove(&a));
        assert!(registry.is_empty());
        assert!(!registry.is_closed(&a));
    }

    #[test]
    fn closed_addresses_leave_the_live_set() {
        let mut registry = SessionRegistry::new();
        let a = Address::with_last_byte(1);
        registry.insert(a);

        assert!(registry.close(a));
        assert!(!registry.contains(&a));
        assert!(registry.is_closed(&a));
        assert!(registry.is_empty());
        assert!(!registry.close(a));
    }
}
