use crate::pricing::{to_money, PricingGap};
use msk_schemas::DamageRecord;
use rust_decimal::Decimal;

/// Operator-entered damage for one order line, in packets. Planner input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DamageEntry {
    pub product_id: String,
    pub damaged_packets: u32,
}

impl DamageEntry {
    pub fn new(product_id: impl Into<String>, damaged_packets: u32) -> Self {
        Self {
            product_id: product_id.into(),
            damaged_packets,
        }
    }
}

/// Evidence that an over-range entry was clamped down to the line maximum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClampReport {
    pub product_id: String,
    /// Packets the operator entered.
    pub entered: u32,
    /// `quantity * packets_per_tub` for the line.
    pub clamped_to: u32,
}

/// Why a delivery plan could not be built at all.
///
/// Clamping and unpriced lines are NOT errors; they are carried on the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// A damage entry referenced a product with no line on the order.
    /// The whole reconciliation is rejected.
    UnknownProduct { product_id: String },
    /// The order has already left `Pending` (or carries the lock flag).
    OrderNotPending { order_id: String },
}

impl std::fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileError::UnknownProduct { product_id } => {
                write!(f, "damage entry for product {product_id} not on the order")
            }
            ReconcileError::OrderNotPending { order_id } => {
                write!(f, "order {order_id} is not pending; delivery refused")
            }
        }
    }
}

impl std::error::Error for ReconcileError {}

/// Planner output: everything needed to show the confirmation summary and
/// submit the delivery. Monetary fields are full precision; round with
/// [`to_money`] only when displaying or putting them on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryPlan {
    pub order_id: String,
    /// Filtered, clamped damage list: only nonzero entries, in line order.
    pub damaged_products: Vec<DamageRecord>,
    pub total_bill: Decimal,
    pub total_damaged_cost: Decimal,
    pub final_bill: Decimal,
    /// Over-range entries that were clamped down.
    pub clamps: Vec<ClampReport>,
    /// Lines whose pricing fell back to zero; shown to the operator.
    pub pricing_gaps: Vec<PricingGap>,
}

impl DeliveryPlan {
    pub fn has_damage(&self) -> bool {
        !self.damaged_products.is_empty()
    }

    pub fn damaged_line_count(&self) -> usize {
        self.damaged_products.len()
    }

    /// Human-readable confirmation summary: damaged line count, damaged cost,
    /// bill before and after. Shown to the operator before submission.
    pub fn summary(&self) -> String {
        format!(
            "{} damaged line(s), damaged cost {:.2}; bill {:.2} -> {:.2}",
            self.damaged_line_count(),
            to_money(self.total_damaged_cost),
            to_money(self.total_bill),
            to_money(self.final_bill),
        )
    }
}
