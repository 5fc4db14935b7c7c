//! msk-schemas
//!
//! Shared wire and domain types for the MilkSync delivery core.
//! Everything here is `Serialize + Deserialize` so it can be JSON-encoded for
//! the REST backend and decoded by tests. No business logic lives here; the
//! only methods are cheap shape queries.
//!
//! Wire field names are the backend's camelCase; Rust fields are snake_case.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default display unit for a freshly added order line.
pub const DEFAULT_UNIT: &str = "tub";

// ---------------------------------------------------------------------------
// Order lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle state of an order.
///
/// Reconciliation only ever moves `Pending -> Delivered`; `Cancelled` exists
/// on the wire but takes no part in the delivery flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Returns `true` if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

// ---------------------------------------------------------------------------
// Actor stamp
// ---------------------------------------------------------------------------

/// Role of the operator performing a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Admin,
    Staff,
}

/// Who performed a delivery or edit. Attached to every mutating request so
/// the backend can audit the acting operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorStamp {
    pub role: ActorRole,
    pub id: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// One order line. Quantity is expressed in tubs; `unit` is a display label
/// only and never drives pricing. Pricing fields are populated by the backend
/// when the order is returned with product data joined in; any of them may be
/// absent on a sparsely populated payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub product_id: String,
    #[serde(default)]
    pub product_name: String,
    pub quantity: u32,
    pub unit: String,
    #[serde(default)]
    pub cost_per_packet: Option<Decimal>,
    #[serde(default)]
    pub packets_per_tub: Option<u32>,
    #[serde(default)]
    pub cost_per_tub: Option<Decimal>,
}

impl OrderLineItem {
    /// Total packets this line represents (tubs x packets per tub).
    /// Zero when the packet count is not populated.
    pub fn ordered_packets(&self) -> u32 {
        self.quantity * self.packets_per_tub.unwrap_or(0)
    }
}

/// Damage recorded against one order line at delivery time, in packets.
/// `product_name` is denormalized for receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageRecord {
    pub product_id: String,
    pub product_name: String,
    pub damaged_packets: u32,
}

/// A distributor order as held by the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub distributor_id: String,
    pub order_date: NaiveDate,
    pub items: Vec<OrderLineItem>,
    pub status: OrderStatus,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub damaged_products: Vec<DamageRecord>,
    #[serde(default)]
    pub updated_by: Option<ActorStamp>,
}

impl Order {
    /// True once the order must refuse every item mutation: either the lock
    /// flag is set or the status has left `Pending`.
    pub fn is_locked(&self) -> bool {
        self.locked || self.status != OrderStatus::Pending
    }

    /// Find a line by product id.
    pub fn line(&self, product_id: &str) -> Option<&OrderLineItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }
}

// ---------------------------------------------------------------------------
// Products (read-only to the delivery flow)
// ---------------------------------------------------------------------------

/// A product as returned by the company-scoped picker endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub company_name: String,
    #[serde(default)]
    pub cost_per_packet: Option<Decimal>,
    #[serde(default)]
    pub packets_per_tub: Option<u32>,
    #[serde(default)]
    pub cost_per_tub: Option<Decimal>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl Product {
    /// Display unit for a new line of this product.
    pub fn default_unit(&self) -> &str {
        self.unit.as_deref().unwrap_or(DEFAULT_UNIT)
    }
}

// ---------------------------------------------------------------------------
// Requests / responses
// ---------------------------------------------------------------------------

/// One line of an order-edit payload: only the fields the operator may change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemPatch {
    pub product_id: String,
    pub quantity: u32,
    pub unit: String,
}

/// Minimal payload for `PUT /orders/:id`. The repository owns every derived
/// field; the editor submits only what the operator changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub order_date: NaiveDate,
    pub items: Vec<OrderItemPatch>,
}

/// Payload for `POST /orders/:id/deliver`. `damaged_products` is omitted
/// entirely when no line carries damage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverOrderRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damaged_products: Option<Vec<DamageRecord>>,
    pub updated_by: ActorStamp,
}

/// Response of `POST /orders/:id/deliver`: the delivery side effects plus the
/// updated order flattened into the same object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverOrderResponse {
    pub bill_generated: bool,
    pub credited_amount: Decimal,
    pub wallet_balance: Decimal,
    #[serde(flatten)]
    pub order: Order,
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
