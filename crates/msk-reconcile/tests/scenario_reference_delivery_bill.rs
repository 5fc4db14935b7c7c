use chrono::NaiveDate;
use msk_reconcile::{plan_delivery, to_money, DamageEntry};
use msk_schemas::{Order, OrderLineItem, OrderStatus};
use rust_decimal::Decimal;

// qty 3, 5 packets/tub @ 10 => price_per_tub 50, bill 150;
// 6 damaged packets => 60 off => final 90.00.
#[test]
fn scenario_reference_delivery_bill_matches_contract() {
    let order = Order {
        id: "ord-ref".to_string(),
        distributor_id: "dist-1".to_string(),
        order_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        items: vec![OrderLineItem {
            product_id: "p-1".to_string(),
            product_name: "Milk 1L".to_string(),
            quantity: 3,
            unit: "tub".to_string(),
            cost_per_packet: Some(Decimal::from(10)),
            packets_per_tub: Some(5),
            cost_per_tub: None,
        }],
        status: OrderStatus::Pending,
        locked: false,
        damaged_products: Vec::new(),
        updated_by: None,
    };

    let plan = plan_delivery(&order, &[DamageEntry::new("p-1", 6)]).unwrap();
    assert_eq!(plan.total_bill, Decimal::from(150));
    assert_eq!(plan.total_damaged_cost, Decimal::from(60));
    assert_eq!(to_money(plan.final_bill), Decimal::from(90));
    assert_eq!(plan.summary(), "1 damaged line(s), damaged cost 60.00; bill 150.00 -> 90.00");
}
