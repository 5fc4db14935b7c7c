//! The reference delivery scenario end to end: qty 3, 5 packets/tub @ 10,
//! 6 damaged packets => final bill 90.00, wallet +90.00, order delivered,
//! locked, damage recorded with the actor stamp.

use msk_orders::DamageAck;
use msk_reconcile::{plan_delivery, DamageEntry};
use msk_schemas::OrderStatus;
use msk_testkit::{admin, pending_order, priced_line, product, Harness};
use rust_decimal::Decimal;

#[tokio::test]
async fn scenario_full_delivery_flow_credits_wallet_and_locks_order() {
    let h = Harness::new();
    let milk = product("p-milk", "Milk 1L", 10, 5);
    h.repo.seed_product(milk.clone());
    let order = pending_order("ord-1", "dist-1", vec![priced_line(&milk, 3)]);
    h.repo.seed_order(order.clone());
    h.repo.set_wallet("dist-1", Decimal::from(40));

    let plan = plan_delivery(&order, &[DamageEntry::new("p-milk", 6)]).unwrap();
    assert_eq!(plan.total_bill, Decimal::from(150));
    assert_eq!(plan.final_bill, Decimal::from(90));

    let ack = DamageAck::acknowledge(&plan);
    let resp = h
        .gateway
        .deliver(&order, &plan, Some(&ack), admin())
        .await
        .unwrap();

    assert!(resp.bill_generated);
    assert_eq!(resp.credited_amount, Decimal::from(90));
    assert_eq!(resp.wallet_balance, Decimal::from(130));

    let stored = h.repo.order("ord-1").unwrap();
    assert_eq!(stored.status, OrderStatus::Delivered);
    assert!(stored.locked);
    assert_eq!(stored.damaged_products.len(), 1);
    assert_eq!(stored.damaged_products[0].product_id, "p-milk");
    assert_eq!(stored.damaged_products[0].damaged_packets, 6);
    assert_eq!(stored.updated_by.as_ref().unwrap().id, "u-admin");

    assert_eq!(h.repo.wallet_balance("dist-1"), Decimal::from(130));
    assert_eq!(h.repo.bill_for("ord-1"), Some(Decimal::from(90)));
}

#[tokio::test]
async fn scenario_damage_without_acknowledgement_is_refused_locally() {
    let h = Harness::new();
    let milk = product("p-milk", "Milk 1L", 10, 5);
    let order = pending_order("ord-1", "dist-1", vec![priced_line(&milk, 3)]);
    h.repo.seed_order(order.clone());

    let plan = plan_delivery(&order, &[DamageEntry::new("p-milk", 2)]).unwrap();
    let err = h.gateway.deliver(&order, &plan, None, admin()).await;
    assert!(err.is_err());
    assert_eq!(
        h.repo.calls().deliver_order,
        0,
        "unacknowledged damage must never reach the repository"
    );
}
