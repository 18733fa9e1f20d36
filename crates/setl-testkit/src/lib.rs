//! World-building helpers for settlement scenario tests: a seeded store
//! with a configured settlement account, deterministic account keys, and
//! a one-call settle runner that drives check → apply the way the
//! surrounding transaction machinery does.

use setl_config::Config;
use setl_ledger::{AccountEntry, LedgerDelta, LedgerStore, TrustLineEntry};
use setl_schemas::{AccountId, Asset, MatchedOrder, SettlementOp};
use setl_settlement::{MetricsRegistry, SettlementRun};

/// Ledger version handed to `check_valid`; nothing gates on it today.
pub const TEST_LEDGER_VERSION: u32 = 4;

/// Deterministic syntactically-valid node key: `Q`, the upper-cased tag,
/// padded with `Z` to the key length. Tags must be short base-32 text.
pub fn account_id(tag: &str) -> AccountId {
    let mut key = String::from("Q");
    key.push_str(&tag.to_uppercase());
    while key.len() < setl_schemas::KEY_LEN {
        key.push('Z');
    }
    AccountId::new(key)
}

/// An issued asset under a test issuer.
pub fn asset(code: &str, issuer: &AccountId) -> Asset {
    Asset::issued(code, issuer.clone())
}

/// A seeded ledger world with its settlement configuration and metrics.
pub struct TestLedger {
    pub store: LedgerStore,
    pub config: Config,
    pub metrics: MetricsRegistry,
    pub source: AccountId,
}

impl TestLedger {
    /// Empty world whose configured settlement account is
    /// `account_id("SETTLE")`, created and funded.
    pub fn new() -> Self {
        let source = account_id("SETTLE");
        let mut store = LedgerStore::new();
        store.put_account(AccountEntry::new(source.clone(), 1_000_000_000));
        let config = Config {
            settlement_acc_id: Some(source.clone()),
            validator_names: Default::default(),
        };
        TestLedger {
            store,
            config,
            metrics: MetricsRegistry::new(),
            source,
        }
    }

    pub fn add_account(&mut self, id: &AccountId, balance: i64) -> &mut Self {
        self.store.put_account(AccountEntry::new(id.clone(), balance));
        self
    }

    pub fn add_trustline(
        &mut self,
        holder: &AccountId,
        asset: &Asset,
        balance: i64,
        limit: i64,
    ) -> &mut Self {
        let mut line = TrustLineEntry::new(holder.clone(), asset.clone(), limit);
        assert!(line.add_balance(balance), "seed balance within limit");
        self.store.put_trustline(line);
        self
    }

    /// Run a settlement from the configured source: check, then apply if
    /// the operation was accepted.
    pub fn settle(&mut self, matched_orders: Vec<MatchedOrder>) -> SettlementRun {
        self.settle_from(self.source.clone(), matched_orders)
    }

    /// Run a settlement from an explicit source account.
    pub fn settle_from(
        &mut self,
        source: AccountId,
        matched_orders: Vec<MatchedOrder>,
    ) -> SettlementRun {
        let mut run = SettlementRun::new(SettlementOp {
            source,
            matched_orders,
        });
        if run.check_valid(&self.config, TEST_LEDGER_VERSION, &mut self.metrics) {
            let mut delta = LedgerDelta::new();
            run.apply(&mut self.store, &mut delta, &mut self.metrics);
        }
        run
    }

    pub fn line_balance(&self, holder: &AccountId, asset: &Asset) -> i64 {
        self.store
            .trustline(holder, asset)
            .map(|line| line.balance)
            .unwrap_or(0)
    }

    pub fn native_balance(&self, id: &AccountId) -> i64 {
        self.store.account(id).map(|acc| acc.balance).unwrap_or(0)
    }
}

impl Default for TestLedger {
    fn default() -> Self {
        TestLedger::new()
    }
}
