use std::collections::HashMap;

use alloy_primitives::Address;

use crate::error::PlanError;

/// Symbolic names resolved to addresses during a run.
///
/// Entries are append-only: once a name is bound, a binding to a different
/// address is refused.
#[derive(Debug, Clone, Default)]
pub(crate) struct AddressDirectory {
    entries: HashMap<String, Address>,
}

impl AddressDirectory {
    pub(crate) fn get(&self, name: &str) -> Option<Address> {
        self.entries.get(name).copied()
    }

    /// Binds `name` to `address`. Re-binding the same address is a no-op.
    pub(crate) fn insert(&mut self, name: impl Into<String>, address: Address) -> Result<(), PlanError> {
        let name = name.into();
        match self.entries.get(&name) {
            Some(existing) if *existing != address => Err(PlanError::NameConflict {
                name,
                existing: *existing,
                rejected: address,
            }),
            Some(_) => Ok(()),
            None => {
                self.entries.insert(name, address);
                Ok(())
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
