use setl_schemas::{MatchedOrder, SettlementResultCode};
use setl_testkit::{account_id, asset, TestLedger};

#[test]
fn scenario_invalid_buyer_skips_middle_order() {
    let issuer = account_id("GATE");
    let idr = asset("IDR", &issuer);
    let usd = asset("USD", &issuer);
    let buyer = account_id("BUYER");
    let seller = account_id("SELLER");
    let ghost = account_id("GHOST"); // never created

    let mut world = TestLedger::new();
    world
        .add_account(&issuer, 1_000_000_000)
        .add_account(&buyer, 1_000_000)
        .add_account(&seller, 1_000_000)
        .add_trustline(&buyer, &idr, 100_000, i64::MAX)
        .add_trustline(&buyer, &usd, 100_000, i64::MAX)
        .add_trustline(&seller, &idr, 100_000, i64::MAX)
        .add_trustline(&seller, &usd, 100_000, i64::MAX);

    let order = |amount_buy: i64, amount_sell: i64| MatchedOrder {
        buyer: buyer.clone(),
        seller: seller.clone(),
        amount_buy,
        amount_sell,
        asset_buy: idr.clone(),
        asset_sell: usd.clone(),
    };
    let mut middle = order(7_000, 9_000);
    middle.buyer = ghost;

    let run = world.settle(vec![order(1_000, 2_000), middle, order(3_000, 4_000)]);

    assert_eq!(
        run.results(),
        [
            SettlementResultCode::Success,
            SettlementResultCode::BuyerAccountInvalid,
            SettlementResultCode::Success,
        ]
    );

    // Balances moved by the sum of the first and third orders only.
    assert_eq!(world.line_balance(&buyer, &idr), 104_000);
    assert_eq!(world.line_balance(&buyer, &usd), 94_000);
    assert_eq!(world.line_balance(&seller, &idr), 96_000);
    assert_eq!(world.line_balance(&seller, &usd), 106_000);

    assert_eq!(
        world.metrics.count("op-settlement.invalid.no-buyer-account"),
        1
    );
    assert_eq!(world.metrics.count("op-settlement.success.apply"), 1);
}
