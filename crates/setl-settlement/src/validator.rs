use tracing::debug;

use setl_config::Config;
use setl_schemas::{MatchedOrder, SettlementResultCode};

use crate::metrics::{mark_failure, MetricsRegistry};
use crate::SettlementRun;

impl SettlementRun {
    /// Pure per-order pre-checks.
    ///
    /// Sizes the result vector to the matched-order count, then:
    ///
    /// - rejects the whole operation with `SourceAccountInvalid` at index
    ///   0 when the source differs from the configured settlement account
    ///   (the rest of the vector is unspecified);
    /// - otherwise writes exactly one structural code per order, first
    ///   failing check wins: `InvalidAsset`, `AssetsIdentical`,
    ///   `NegativeAmount`, `CrossSelf`, else `Success`.
    ///
    /// Returns accept/reject for the operation as a whole. The ledger
    /// version parameter is kept for the retired protocol gate that
    /// `NotSupportedYet` belongs to; no version currently rejects.
    pub fn check_valid(
        &mut self,
        config: &Config,
        _ledger_version: u32,
        metrics: &mut MetricsRegistry,
    ) -> bool {
        self.results.clear();
        self.results
            .resize(self.op.matched_orders.len(), SettlementResultCode::Success);

        if config.settlement_acc_id.as_ref() != Some(&self.op.source) {
            let code = SettlementResultCode::SourceAccountInvalid;
            if self.results.is_empty() {
                self.results.push(code);
            } else {
                self.results[0] = code;
            }
            mark_failure(metrics, code);
            debug!(source = %self.op.source, "settlement source is not the configured settlement account");
            return false;
        }

        for (index, order) in self.op.matched_orders.iter().enumerate() {
            let code = pre_check_order(order);
            self.results[index] = code;
            if !code.is_success() {
                mark_failure(metrics, code);
                debug!(index, ?code, "matched order rejected by pre-check");
            }
        }
        true
    }
}

/// First failing structural check determines the code.
fn pre_check_order(order: &MatchedOrder) -> SettlementResultCode {
    if !order.asset_buy.is_well_formed() || !order.asset_sell.is_well_formed() {
        return SettlementResultCode::InvalidAsset;
    }
    if order.asset_buy == order.asset_sell {
        return SettlementResultCode::AssetsIdentical;
    }
    if order.amount_buy < 0 || order.amount_sell < 0 {
        return SettlementResultCode::NegativeAmount;
    }
    if order.buyer == order.seller {
        return SettlementResultCode::CrossSelf;
    }
    SettlementResultCode::Success
}
