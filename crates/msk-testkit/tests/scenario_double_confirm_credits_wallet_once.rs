//! Two operators deliver the same order concurrently. Each gateway has its
//! own confirm guard, so both requests reach the repository, which honors
//! exactly one and answers the loser with a conflict. The wallet is credited
//! exactly once.

use msk_reconcile::plan_delivery;
use msk_testkit::{admin, pending_order, priced_line, product, staff, Harness};
use msk_orders::{DeliveryError, RepoError};
use rust_decimal::Decimal;

#[tokio::test]
async fn scenario_double_confirm_credits_wallet_once() {
    let h = Harness::new();
    let curd = product("p-curd", "Curd 500g", 10, 5);
    let order = pending_order("ord-1", "dist-1", vec![priced_line(&curd, 3)]);
    h.repo.seed_order(order.clone());

    let other = h.second_operator();
    let plan_a = plan_delivery(&order, &[]).unwrap();
    let plan_b = plan_a.clone();

    let (a, b) = tokio::join!(
        h.gateway.deliver(&order, &plan_a, None, admin()),
        other.deliver(&order, &plan_b, None, staff()),
    );

    let succeeded = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(succeeded, 1, "exactly one delivery may be honored");

    let loser = if a.is_ok() { b } else { a };
    match loser.unwrap_err() {
        DeliveryError::Repo(RepoError::Conflict { message }) => {
            assert!(message.contains("already been delivered"));
        }
        other => panic!("loser must surface the server conflict, got {other:?}"),
    }

    // Credited exactly once: 3 tubs * 5 packets * 10 = 150.
    assert_eq!(h.repo.wallet_balance("dist-1"), Decimal::from(150));
    assert_eq!(h.repo.calls().deliver_order, 2, "both reached the repository");
}
