use std::collections::BTreeMap;

use setl_schemas::SettlementResultCode;

/// Counter marked once per completed apply.
pub const SUCCESS_APPLY: &str = "op-settlement.success.apply";

/// Deterministic in-process counter registry.
///
/// Counter names are dotted paths (`op-settlement.invalid.<cause>`);
/// iteration order is the name order, so snapshots are reproducible.
#[derive(Clone, Debug, Default)]
pub struct MetricsRegistry {
    counters: BTreeMap<String, u64>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        MetricsRegistry::default()
    }

    /// Increment a named counter.
    pub fn mark(&mut self, name: &str) {
        *self.counters.entry(name.to_string()).or_insert(0) += 1;
    }

    /// Current value of a counter; 0 if never marked.
    pub fn count(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    /// All counters in name order.
    pub fn counters(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counters.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

/// Mark the `op-settlement.invalid.<cause>` counter for a failure code.
pub(crate) fn mark_failure(metrics: &mut MetricsRegistry, code: SettlementResultCode) {
    if let Some(cause) = code.metric_cause() {
        metrics.mark(&format!("op-settlement.invalid.{cause}"));
    }
}
