use std::collections::BTreeMap;

use tracing::{debug, info};

use setl_ledger::{
    AccountEntry, EntryKey, LedgerDelta, LedgerEntry, LedgerStore, StoreTransaction,
    TrustLineEntry,
};
use setl_schemas::{AccountId, Asset, MatchedOrder, SettlementResultCode};

use crate::metrics::{mark_failure, MetricsRegistry, SUCCESS_APPLY};
use crate::price::effective_price_string;
use crate::SettlementRun;

impl SettlementRun {
    /// Transactional execution of the pre-validated matched orders.
    ///
    /// Precondition: [`SettlementRun::check_valid`] accepted and populated
    /// the result vector.
    ///
    /// Opens a storage transaction and derives a child delta from the
    /// caller's. Orders run in input order; ones already marked failed are
    /// skipped. Each order's four balance moves are all-or-nothing: they
    /// run against working copies staged through a per-order delta that
    /// folds into the operation delta only when every move succeeded, so a
    /// failed order leaves no partial writes.
    ///
    /// Accounts and trustlines are resolved once into a handle map keyed
    /// by id and (id, asset) and retained across the loop — two orders
    /// touching the same line observe cumulative balances.
    ///
    /// Always commits the operation delta and the transaction, and returns
    /// operation success; per-order failures live in the result vector.
    pub fn apply(
        &mut self,
        store: &mut LedgerStore,
        delta: &mut LedgerDelta,
        metrics: &mut MetricsRegistry,
    ) -> bool {
        debug_assert_eq!(
            self.results.len(),
            self.op.matched_orders.len(),
            "check_valid populates the result vector"
        );

        let mut txn = store.begin();
        let mut operation_delta = LedgerDelta::derive(delta);
        let mut handles = Handles::default();

        for (index, order) in self.op.matched_orders.iter().enumerate() {
            if !self.results[index].is_success() {
                continue;
            }
            let code = apply_order(order, &mut txn, &mut operation_delta, &mut handles);
            if code.is_success() {
                debug!(
                    index,
                    amount_buy = order.amount_buy,
                    amount_sell = order.amount_sell,
                    price = effective_price_string(order.amount_sell, order.amount_buy)
                        .as_deref(),
                    "matched order settled"
                );
            } else {
                self.results[index] = code;
                mark_failure(metrics, code);
                debug!(index, ?code, "matched order failed");
            }
        }

        operation_delta.commit_into(delta);
        txn.commit();
        metrics.mark(SUCCESS_APPLY);
        info!(
            orders = self.op.matched_orders.len(),
            settled = self.results.iter().filter(|c| c.is_success()).count(),
            "settlement applied"
        );
        true
    }
}

// ---------------------------------------------------------------------------
// Handle map
// ---------------------------------------------------------------------------

/// Mutable views of every account and trustline touched by the operation,
/// loaded once and reused across matched orders so staged balance changes
/// compound instead of being re-read from storage.
#[derive(Debug, Default)]
struct Handles {
    accounts: BTreeMap<AccountId, AccountEntry>,
    lines: BTreeMap<(AccountId, Asset), TrustLineEntry>,
}

impl Handles {
    /// Resolve an account into the map; `false` if it does not exist.
    fn ensure_account(
        &mut self,
        txn: &StoreTransaction<'_>,
        delta: &LedgerDelta,
        id: &AccountId,
    ) -> bool {
        if self.accounts.contains_key(id) {
            return true;
        }
        match txn.load_account(delta, id) {
            Some(account) => {
                self.accounts.insert(id.clone(), account);
                true
            }
            None => false,
        }
    }

    fn line(&self, holder: &AccountId, asset: &Asset) -> Option<&TrustLineEntry> {
        self.lines.get(&(holder.clone(), asset.clone()))
    }

    /// Working copy of the entry a balance leg lands on: the holder's
    /// account for the native asset, the holder's trustline otherwise.
    /// The entry is present by the time legs run — accounts are ensured in
    /// step 2 and trustlines resolved in step 3.
    fn balance_entry(&self, holder: &AccountId, asset: &Asset) -> LedgerEntry {
        if asset.is_native() {
            let account = self
                .accounts
                .get(holder)
                .expect("accounts are resolved before balance moves");
            LedgerEntry::Account(account.clone())
        } else {
            let line = self
                .line(holder, asset)
                .expect("trustlines are resolved before balance moves");
            LedgerEntry::TrustLine(line.clone())
        }
    }

    /// Write a settled entry back so later orders observe it.
    fn absorb(&mut self, entry: &LedgerEntry) {
        match entry {
            LedgerEntry::Account(account) => {
                self.accounts.insert(account.id.clone(), account.clone());
            }
            LedgerEntry::TrustLine(line) => {
                self.lines
                    .insert((line.holder.clone(), line.asset.clone()), line.clone());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Per-order execution
// ---------------------------------------------------------------------------

fn apply_order(
    order: &MatchedOrder,
    txn: &mut StoreTransaction<'_>,
    operation_delta: &mut LedgerDelta,
    handles: &mut Handles,
) -> SettlementResultCode {
    use SettlementResultCode::*;

    // Buyer and seller must exist.
    if !handles.ensure_account(txn, operation_delta, &order.buyer) {
        return BuyerAccountInvalid;
    }
    if !handles.ensure_account(txn, operation_delta, &order.seller) {
        return SellerAccountInvalid;
    }

    // Trustlines for both parties, buyer first.
    let code = validate_trustlines(
        handles,
        txn,
        operation_delta,
        &order.buyer,
        &order.asset_buy,
        &order.asset_sell,
    );
    if !code.is_success() {
        return code;
    }
    let code = validate_trustlines(
        handles,
        txn,
        operation_delta,
        &order.seller,
        &order.asset_buy,
        &order.asset_sell,
    );
    if !code.is_success() {
        return code;
    }

    // Receive caps before any mutation.
    if receive_cap(handles, &order.buyer, &order.asset_buy) < order.amount_buy {
        return LineFull;
    }
    if receive_cap(handles, &order.seller, &order.asset_sell) < order.amount_sell {
        return SellerLineFull;
    }

    // The four balance moves, fixed order: buyer-gain, buyer-loss,
    // seller-loss, seller-gain. Amounts are non-negative after
    // check_valid, so the leg sign tells adds from subtracts.
    let legs: [(&AccountId, &Asset, i64); 4] = [
        (&order.buyer, &order.asset_buy, order.amount_buy),
        (&order.buyer, &order.asset_sell, -order.amount_sell),
        (&order.seller, &order.asset_buy, -order.amount_buy),
        (&order.seller, &order.asset_sell, order.amount_sell),
    ];

    let min_balance = txn.min_balance();
    let mut working: Vec<LedgerEntry> = Vec::with_capacity(4);
    for (holder, asset, amount) in legs {
        let key = balance_key(holder, asset);
        if !working.iter().any(|entry| entry.key() == key) {
            working.push(handles.balance_entry(holder, asset));
        }
        let moved = working
            .iter_mut()
            .find(|entry| entry.key() == key)
            .map(|entry| match entry {
                LedgerEntry::Account(account) => account.add_balance(amount, min_balance),
                LedgerEntry::TrustLine(line) => line.add_balance(amount),
            })
            .unwrap_or(false);
        if !moved {
            return if amount >= 0 { BuyOverLimit } else { SellOverBalance };
        }
    }

    // Every move succeeded: stage the order through its own delta and fold
    // it into the operation delta, making the order visible to its
    // successors and durable with the transaction.
    let mut order_delta = LedgerDelta::derive(operation_delta);
    for entry in working {
        handles.absorb(&entry);
        txn.store_change(&mut order_delta, entry);
    }
    order_delta.commit_into(operation_delta);
    Success
}

fn balance_key(holder: &AccountId, asset: &Asset) -> EntryKey {
    if asset.is_native() {
        EntryKey::Account(holder.clone())
    } else {
        EntryKey::TrustLine(holder.clone(), asset.clone())
    }
}

/// How much of `asset` the holder can still receive: unbounded for the
/// native asset, the trustline headroom otherwise.
fn receive_cap(handles: &Handles, holder: &AccountId, asset: &Asset) -> i64 {
    if asset.is_native() {
        i64::MAX
    } else {
        handles
            .line(holder, asset)
            .map(|line| line.max_amount_receive())
            .unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Trustline resolution
// ---------------------------------------------------------------------------

#[derive(Copy, Clone)]
enum LineSide {
    Sell,
    Buy,
}

impl LineSide {
    fn no_issuer(self) -> SettlementResultCode {
        match self {
            LineSide::Sell => SettlementResultCode::SellNoIssuer,
            LineSide::Buy => SettlementResultCode::BuyNoIssuer,
        }
    }

    fn no_trust(self) -> SettlementResultCode {
        match self {
            LineSide::Sell => SettlementResultCode::SellNoTrust,
            LineSide::Buy => SettlementResultCode::BuyNoTrust,
        }
    }

    fn not_authorized(self) -> SettlementResultCode {
        match self {
            LineSide::Sell => SettlementResultCode::SellNotAuthorized,
            LineSide::Buy => SettlementResultCode::BuyNotAuthorized,
        }
    }
}

/// Resolve one account's trustlines for both legs of an order, sell side
/// before buy side. For each non-native asset: the issuer account must
/// exist, the holder must have a line, and the line must be authorized.
/// The first failure wins.
fn validate_trustlines(
    handles: &mut Handles,
    txn: &StoreTransaction<'_>,
    delta: &LedgerDelta,
    account: &AccountId,
    asset_buy: &Asset,
    asset_sell: &Asset,
) -> SettlementResultCode {
    if let Some(code) = resolve_line(handles, txn, delta, account, asset_sell, LineSide::Sell) {
        return code;
    }
    if let Some(code) = resolve_line(handles, txn, delta, account, asset_buy, LineSide::Buy) {
        return code;
    }
    SettlementResultCode::Success
}

fn resolve_line(
    handles: &mut Handles,
    txn: &StoreTransaction<'_>,
    delta: &LedgerDelta,
    account: &AccountId,
    asset: &Asset,
    side: LineSide,
) -> Option<SettlementResultCode> {
    if asset.is_native() {
        return None;
    }
    if handles.line(account, asset).is_none() {
        let (line, issuer_exists) = txn.load_trustline_by_issuer(delta, account, asset);
        if !issuer_exists {
            return Some(side.no_issuer());
        }
        let line = match line {
            Some(line) => line,
            None => return Some(side.no_trust()),
        };
        handles
            .lines
            .insert((account.clone(), asset.clone()), line);
    }
    match handles.line(account, asset) {
        Some(line) if !line.is_authorized() => Some(side.not_authorized()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
