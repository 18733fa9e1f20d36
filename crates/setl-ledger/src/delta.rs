use std::collections::BTreeMap;

use crate::entries::{EntryKey, LedgerEntry};

/// A scoped staging buffer of ledger changes.
///
/// A delta owns two maps: the entries *inherited* from its ancestors at
/// derivation time, and the entries *staged* through it. Reads consult
/// staged first, then inherited; only staged entries move on commit, so a
/// child never re-commits what its parent already holds.
///
/// Deltas are plain values. [`LedgerDelta::derive`] snapshots the parent's
/// effective view instead of borrowing it, which keeps nesting free of
/// lifetime coupling; [`LedgerDelta::commit_into`] folds the child's
/// writes back into the parent. Dropping a delta without committing
/// discards its changes.
#[derive(Clone, Debug, Default)]
pub struct LedgerDelta {
    inherited: BTreeMap<EntryKey, LedgerEntry>,
    staged: BTreeMap<EntryKey, LedgerEntry>,
}

impl LedgerDelta {
    /// A root delta with nothing staged.
    pub fn new() -> Self {
        LedgerDelta::default()
    }

    /// Derive a child whose reads observe everything the parent observes,
    /// including the parent's own staged writes.
    pub fn derive(parent: &LedgerDelta) -> Self {
        let mut inherited = parent.inherited.clone();
        for (key, entry) in &parent.staged {
            inherited.insert(key.clone(), entry.clone());
        }
        LedgerDelta {
            inherited,
            staged: BTreeMap::new(),
        }
    }

    /// Record a mutated entry. Later writes to the same key replace
    /// earlier ones.
    pub fn store_change(&mut self, entry: LedgerEntry) {
        self.staged.insert(entry.key(), entry);
    }

    /// Staged-then-inherited lookup.
    pub fn get(&self, key: &EntryKey) -> Option<&LedgerEntry> {
        self.staged.get(key).or_else(|| self.inherited.get(key))
    }

    /// Fold this delta's own writes into the parent.
    pub fn commit_into(self, parent: &mut LedgerDelta) {
        for (key, entry) in self.staged {
            parent.staged.insert(key, entry);
        }
    }

    /// The entries staged through this delta, in key order.
    pub fn changes(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.staged.values()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }
}
