use std::collections::BTreeMap;

use msk_schemas::{DamageRecord, Order};
use rust_decimal::Decimal;

use crate::pricing::resolve_line_pricing;
use crate::{ClampReport, DamageEntry, DeliveryPlan, ReconcileError};

/// Build the delivery plan for a pending order and a set of operator-entered
/// damage entries.
///
/// - Rejects the whole plan if the order is not pending/unlocked or any entry
///   names a product with no line on the order.
/// - Clamps each entry into `[0, quantity * packets_per_tub]`; clamps are
///   reported, never rejected.
/// - Drops zero-damage entries from the submitted list.
/// - Accumulates all money in full-precision `Decimal`; no per-line rounding.
///
/// For duplicate entries on the same product the last entry wins.
pub fn plan_delivery(order: &Order, entries: &[DamageEntry]) -> Result<DeliveryPlan, ReconcileError> {
    if order.is_locked() {
        return Err(ReconcileError::OrderNotPending {
            order_id: order.id.clone(),
        });
    }

    let mut damage_by_product: BTreeMap<&str, u32> = BTreeMap::new();
    for entry in entries {
        if order.line(&entry.product_id).is_none() {
            return Err(ReconcileError::UnknownProduct {
                product_id: entry.product_id.clone(),
            });
        }
        damage_by_product.insert(&entry.product_id, entry.damaged_packets);
    }

    let mut total_bill = Decimal::ZERO;
    let mut total_damaged_cost = Decimal::ZERO;
    let mut damaged_products = Vec::new();
    let mut clamps = Vec::new();
    let mut pricing_gaps = Vec::new();

    for line in &order.items {
        let (pricing, gaps) = resolve_line_pricing(line);
        pricing_gaps.extend(gaps);

        total_bill += Decimal::from(line.quantity) * pricing.price_per_tub;

        if let Some(&entered) = damage_by_product.get(line.product_id.as_str()) {
            let max = line.ordered_packets();
            let damaged = entered.min(max);
            if entered > max {
                clamps.push(ClampReport {
                    product_id: line.product_id.clone(),
                    entered,
                    clamped_to: max,
                });
            }
            if damaged > 0 {
                total_damaged_cost += Decimal::from(damaged) * pricing.cost_per_packet;
                damaged_products.push(DamageRecord {
                    product_id: line.product_id.clone(),
                    product_name: line.product_name.clone(),
                    damaged_packets: damaged,
                });
            }
        }
    }

    Ok(DeliveryPlan {
        order_id: order.id.clone(),
        damaged_products,
        final_bill: total_bill - total_damaged_cost,
        total_bill,
        total_damaged_cost,
        clamps,
        pricing_gaps,
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
