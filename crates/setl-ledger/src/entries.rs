use serde::{Deserialize, Serialize};
use setl_schemas::{AccountId, Asset};

/// An account as the settlement core sees it: native balance plus the
/// signing attributes observed by the surrounding layers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountEntry {
    pub id: AccountId,
    /// Native balance; never drops below the store's minimum reserve.
    pub balance: i64,
    pub master_weight: u8,
    pub low_threshold: u8,
    pub medium_threshold: u8,
    pub high_threshold: u8,
}

impl AccountEntry {
    /// New account with default signing attributes (master weight 1,
    /// thresholds 0).
    pub fn new(id: AccountId, balance: i64) -> Self {
        AccountEntry {
            id,
            balance,
            master_weight: 1,
            low_threshold: 0,
            medium_threshold: 0,
            high_threshold: 0,
        }
    }

    /// Apply a signed balance change. Returns `false` without mutating if
    /// the result would overflow `i64` or drop below `min_balance`.
    pub fn add_balance(&mut self, delta: i64, min_balance: i64) -> bool {
        match self.balance.checked_add(delta) {
            Some(next) if next >= min_balance => {
                self.balance = next;
                true
            }
            _ => false,
        }
    }
}

/// A holder's line to an issued asset: balance, limit, authorization.
///
/// Invariant: `0 <= balance <= limit`, `limit > 0`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustLineEntry {
    pub holder: AccountId,
    pub asset: Asset,
    pub balance: i64,
    pub limit: i64,
    pub authorized: bool,
}

impl TrustLineEntry {
    /// New authorized line with zero balance.
    pub fn new(holder: AccountId, asset: Asset, limit: i64) -> Self {
        debug_assert!(!asset.is_native(), "trustlines carry issued assets only");
        debug_assert!(limit > 0, "trustline limit must be > 0");
        TrustLineEntry {
            holder,
            asset,
            balance: 0,
            limit,
            authorized: true,
        }
    }

    /// Apply a signed balance change. Returns `false` without mutating on
    /// underflow below zero, overflow, or a result above the limit.
    pub fn add_balance(&mut self, delta: i64) -> bool {
        match self.balance.checked_add(delta) {
            Some(next) if (0..=self.limit).contains(&next) => {
                self.balance = next;
                true
            }
            _ => false,
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized
    }

    /// How much more of the asset this line can hold.
    pub fn max_amount_receive(&self) -> i64 {
        self.limit - self.balance
    }
}

/// Identity of a ledger entry, the staging and storage map key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntryKey {
    Account(AccountId),
    TrustLine(AccountId, Asset),
}

/// A staged or stored ledger entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEntry {
    Account(AccountEntry),
    TrustLine(TrustLineEntry),
}

impl LedgerEntry {
    pub fn key(&self) -> EntryKey {
        match self {
            LedgerEntry::Account(account) => EntryKey::Account(account.id.clone()),
            LedgerEntry::TrustLine(line) => {
                EntryKey::TrustLine(line.holder.clone(), line.asset.clone())
            }
        }
    }
}
