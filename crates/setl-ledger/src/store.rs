use std::collections::BTreeMap;

use setl_schemas::{AccountId, Asset};

use crate::delta::LedgerDelta;
use crate::entries::{AccountEntry, EntryKey, LedgerEntry, TrustLineEntry};

/// The committed ledger world.
///
/// Mutation goes through [`StoreTransaction`]: the transaction buffers
/// entry upserts and folds them in on commit; dropping the handle rolls
/// back. Direct `put_*` seeding is for world setup only.
#[derive(Clone, Debug, Default)]
pub struct LedgerStore {
    accounts: BTreeMap<AccountId, AccountEntry>,
    trustlines: BTreeMap<(AccountId, Asset), TrustLineEntry>,
    base_reserve: i64,
}

impl LedgerStore {
    pub fn new() -> Self {
        LedgerStore::default()
    }

    /// A store enforcing a minimum native balance on every account.
    pub fn with_base_reserve(base_reserve: i64) -> Self {
        LedgerStore {
            base_reserve,
            ..LedgerStore::default()
        }
    }

    /// Minimum native balance accounts must retain.
    pub fn base_reserve(&self) -> i64 {
        self.base_reserve
    }

    /// Seed an account (world setup, bypasses the transaction path).
    pub fn put_account(&mut self, account: AccountEntry) {
        self.accounts.insert(account.id.clone(), account);
    }

    /// Seed a trustline (world setup, bypasses the transaction path).
    pub fn put_trustline(&mut self, line: TrustLineEntry) {
        self.trustlines
            .insert((line.holder.clone(), line.asset.clone()), line);
    }

    pub fn account(&self, id: &AccountId) -> Option<&AccountEntry> {
        self.accounts.get(id)
    }

    pub fn trustline(&self, holder: &AccountId, asset: &Asset) -> Option<&TrustLineEntry> {
        self.trustlines.get(&(holder.clone(), asset.clone()))
    }

    /// Open a transaction over this store.
    pub fn begin(&mut self) -> StoreTransaction<'_> {
        StoreTransaction {
            store: self,
            pending: BTreeMap::new(),
        }
    }

    fn lookup(&self, key: &EntryKey) -> Option<LedgerEntry> {
        match key {
            EntryKey::Account(id) => self.accounts.get(id).cloned().map(LedgerEntry::Account),
            EntryKey::TrustLine(holder, asset) => self
                .trustlines
                .get(&(holder.clone(), asset.clone()))
                .cloned()
                .map(LedgerEntry::TrustLine),
        }
    }
}

/// A storage transaction: buffered entry upserts that reach the store only
/// on [`StoreTransaction::commit`]. Dropping the handle without committing
/// discards the buffer.
///
/// Loads answer from the supplied delta chain first (a delta must observe
/// its own staged writes), then from the committed store.
#[derive(Debug)]
pub struct StoreTransaction<'a> {
    store: &'a mut LedgerStore,
    pending: BTreeMap<EntryKey, LedgerEntry>,
}

impl<'a> StoreTransaction<'a> {
    /// Minimum native balance enforced on account balance changes.
    pub fn min_balance(&self) -> i64 {
        self.store.base_reserve
    }

    /// Load an account as seen through `delta`, or `None` if it does not
    /// exist.
    pub fn load_account(&self, delta: &LedgerDelta, id: &AccountId) -> Option<AccountEntry> {
        let key = EntryKey::Account(id.clone());
        match delta.get(&key) {
            Some(LedgerEntry::Account(account)) => Some(account.clone()),
            Some(_) => None,
            None => match self.store.lookup(&key) {
                Some(LedgerEntry::Account(account)) => Some(account),
                _ => None,
            },
        }
    }

    /// Atomic answer to "does the issuer exist, and does the holder have a
    /// line to it?" for an issued asset. Returns the line (if any) and
    /// whether the issuer account exists.
    pub fn load_trustline_by_issuer(
        &self,
        delta: &LedgerDelta,
        holder: &AccountId,
        asset: &Asset,
    ) -> (Option<TrustLineEntry>, bool) {
        debug_assert!(!asset.is_native(), "native assets have no trustlines");
        let issuer_exists = match asset.issuer() {
            Some(issuer) => self.load_account(delta, issuer).is_some(),
            None => false,
        };
        let key = EntryKey::TrustLine(holder.clone(), asset.clone());
        let line = match delta.get(&key) {
            Some(LedgerEntry::TrustLine(line)) => Some(line.clone()),
            Some(_) => None,
            None => match self.store.lookup(&key) {
                Some(LedgerEntry::TrustLine(line)) => Some(line),
                _ => None,
            },
        };
        (line, issuer_exists)
    }

    /// Stage a mutated entry into both channels: the delta (in-memory
    /// visibility for later loads) and this transaction's buffer
    /// (durability on commit).
    pub fn store_change(&mut self, delta: &mut LedgerDelta, entry: LedgerEntry) {
        self.pending.insert(entry.key(), entry.clone());
        delta.store_change(entry);
    }

    /// Fold the buffered writes into the store.
    pub fn commit(self) {
        let StoreTransaction { store, pending } = self;
        for (_, entry) in pending {
            match entry {
                LedgerEntry::Account(account) => store.put_account(account),
                LedgerEntry::TrustLine(line) => store.put_trustline(line),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account_id(tag: u8) -> AccountId {
        let mut key = String::from("Q");
        key.push(char::from(b'A' + tag));
        while key.len() < setl_schemas::KEY_LEN {
            key.push('D');
        }
        AccountId::new(key)
    }

    fn idr(issuer_tag: u8) -> Asset {
        Asset::issued("IDR", account_id(issuer_tag))
    }

    fn seeded_store() -> LedgerStore {
        let mut store = LedgerStore::new();
        store.put_account(AccountEntry::new(account_id(0), 1_000_000)); // issuer
        store.put_account(AccountEntry::new(account_id(1), 500));
        store.put_trustline(TrustLineEntry::new(account_id(1), idr(0), 10_000));
        store
    }

    // --- Loads ---

    #[test]
    fn load_account_hits_store() {
        let mut store = seeded_store();
        let txn = store.begin();
        let delta = LedgerDelta::new();
        let acc = txn.load_account(&delta, &account_id(1)).unwrap();
        assert_eq!(acc.balance, 500);
        assert!(txn.load_account(&delta, &account_id(9)).is_none());
    }

    #[test]
    fn load_prefers_delta_over_store() {
        let mut store = seeded_store();
        let txn = store.begin();
        let mut delta = LedgerDelta::new();
        delta.store_change(LedgerEntry::Account(AccountEntry::new(account_id(1), 750)));
        let acc = txn.load_account(&delta, &account_id(1)).unwrap();
        assert_eq!(acc.balance, 750);
    }

    #[test]
    fn trustline_load_reports_issuer_existence() {
        let mut store = seeded_store();
        let txn = store.begin();
        let delta = LedgerDelta::new();

        let (line, issuer_exists) =
            txn.load_trustline_by_issuer(&delta, &account_id(1), &idr(0));
        assert!(issuer_exists);
        assert_eq!(line.unwrap().limit, 10_000);

        // Issuer account 7 does not exist; no line either.
        let (line, issuer_exists) =
            txn.load_trustline_by_issuer(&delta, &account_id(1), &idr(7));
        assert!(!issuer_exists);
        assert!(line.is_none());

        // Issuer exists but holder 0 has no line.
        let (line, issuer_exists) =
            txn.load_trustline_by_issuer(&delta, &account_id(0), &idr(0));
        assert!(issuer_exists);
        assert!(line.is_none());
    }

    // --- Transaction lifecycle ---

    #[test]
    fn commit_folds_pending_into_store() {
        let mut store = seeded_store();
        {
            let mut txn = store.begin();
            let mut delta = LedgerDelta::new();
            let mut acc = txn.load_account(&delta, &account_id(1)).unwrap();
            assert!(acc.add_balance(100, txn.min_balance()));
            txn.store_change(&mut delta, LedgerEntry::Account(acc));
            txn.commit();
        }
        assert_eq!(store.account(&account_id(1)).unwrap().balance, 600);
    }

    #[test]
    fn dropped_transaction_rolls_back() {
        let mut store = seeded_store();
        {
            let mut txn = store.begin();
            let mut delta = LedgerDelta::new();
            let mut acc = txn.load_account(&delta, &account_id(1)).unwrap();
            assert!(acc.add_balance(100, txn.min_balance()));
            txn.store_change(&mut delta, LedgerEntry::Account(acc));
            // txn dropped here without commit
        }
        assert_eq!(store.account(&account_id(1)).unwrap().balance, 500);
    }

    #[test]
    fn store_change_reflects_in_same_transaction_loads() {
        let mut store = seeded_store();
        let mut txn = store.begin();
        let mut delta = LedgerDelta::new();

        let mut acc = txn.load_account(&delta, &account_id(1)).unwrap();
        assert!(acc.add_balance(-200, txn.min_balance()));
        txn.store_change(&mut delta, LedgerEntry::Account(acc));

        let reloaded = txn.load_account(&delta, &account_id(1)).unwrap();
        assert_eq!(reloaded.balance, 300);
    }

    #[test]
    fn base_reserve_feeds_min_balance() {
        let mut store = LedgerStore::with_base_reserve(400);
        store.put_account(AccountEntry::new(account_id(1), 500));
        let txn = store.begin();
        assert_eq!(txn.min_balance(), 400);
    }
}
