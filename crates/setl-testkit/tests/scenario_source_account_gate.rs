use setl_schemas::{MatchedOrder, SettlementResultCode};
use setl_testkit::{account_id, asset, TestLedger};

#[test]
fn scenario_source_account_gate() {
    let issuer = account_id("GATE");
    let idr = asset("IDR", &issuer);
    let usd = asset("USD", &issuer);
    let buyer = account_id("BUYER");
    let seller = account_id("SELLER");

    let mut world = TestLedger::new();
    world
        .add_account(&issuer, 1_000_000_000)
        .add_account(&buyer, 1_000_000)
        .add_account(&seller, 1_000_000)
        .add_trustline(&buyer, &idr, 100_000, i64::MAX)
        .add_trustline(&buyer, &usd, 100_000, i64::MAX)
        .add_trustline(&seller, &idr, 100_000, i64::MAX)
        .add_trustline(&seller, &usd, 100_000, i64::MAX);

    // A perfectly good matched order from the wrong source account.
    let intruder = account_id("INTRUDER");
    let run = world.settle_from(
        intruder,
        vec![MatchedOrder {
            buyer: buyer.clone(),
            seller: seller.clone(),
            amount_buy: 25_000,
            amount_sell: 15_000,
            asset_buy: idr.clone(),
            asset_sell: usd.clone(),
        }],
    );

    // Rejected at the gate: apply never ran and no balance changed.
    assert_eq!(run.results()[0], SettlementResultCode::SourceAccountInvalid);
    assert_eq!(world.line_balance(&buyer, &idr), 100_000);
    assert_eq!(world.line_balance(&buyer, &usd), 100_000);
    assert_eq!(world.line_balance(&seller, &idr), 100_000);
    assert_eq!(world.line_balance(&seller, &usd), 100_000);

    assert_eq!(world.metrics.count("op-settlement.invalid.source-account"), 1);
    assert_eq!(world.metrics.count("op-settlement.success.apply"), 0);
}
