//! Pre-delivery order editing.
//!
//! `OrderDraft` is the editable projection of a pending order. All mutation
//! rules live here; nothing touches the network. The repository stays the
//! source of truth for derived fields, so a successful save replaces the
//! caller's order wholesale with the repository's response.

use chrono::NaiveDate;
use msk_schemas::{Order, OrderItemPatch, Product, UpdateOrderRequest};

// ---------------------------------------------------------------------------
// EditError
// ---------------------------------------------------------------------------

/// Client-side editing refusals. None of these reach the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// The order is delivered or locked; no edit may even start.
    OrderLocked { order_id: String },
    /// Raw quantity input did not parse to an integer >= 1. The draft is left
    /// unchanged rather than coerced to a default.
    InvalidQuantity { raw: String },
    /// The product already has a line; at most one line per product.
    DuplicateProduct { product_id: String },
    /// No line with this product id in the draft.
    UnknownLine { product_id: String },
}

impl std::fmt::Display for EditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditError::OrderLocked { order_id } => {
                write!(f, "order {order_id} is locked; editing refused")
            }
            EditError::InvalidQuantity { raw } => {
                write!(f, "invalid quantity {raw:?}: expected an integer >= 1")
            }
            EditError::DuplicateProduct { product_id } => {
                write!(f, "product {product_id} already has a line on this order")
            }
            EditError::UnknownLine { product_id } => {
                write!(f, "no line for product {product_id} on this order")
            }
        }
    }
}

impl std::error::Error for EditError {}

// ---------------------------------------------------------------------------
// OrderDraft
// ---------------------------------------------------------------------------

/// One editable line of a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit: String,
}

/// In-progress edit of a pending order's line items and date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    order_id: String,
    order_date: NaiveDate,
    items: Vec<DraftItem>,
}

impl OrderDraft {
    /// Start editing an order. Refused outright when the order is
    /// delivered/locked; the lock is terminal.
    pub fn from_order(order: &Order) -> Result<Self, EditError> {
        if order.is_locked() {
            return Err(EditError::OrderLocked {
                order_id: order.id.clone(),
            });
        }
        Ok(Self {
            order_id: order.id.clone(),
            order_date: order.order_date,
            items: order
                .items
                .iter()
                .map(|i| DraftItem {
                    product_id: i.product_id.clone(),
                    product_name: i.product_name.clone(),
                    quantity: i.quantity,
                    unit: i.unit.clone(),
                })
                .collect(),
        })
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn order_date(&self) -> NaiveDate {
        self.order_date
    }

    pub fn items(&self) -> &[DraftItem] {
        &self.items
    }

    pub fn set_order_date(&mut self, date: NaiveDate) {
        self.order_date = date;
    }

    /// Increment/decrement a line's quantity. The result is clamped to a
    /// floor of 1: removal is a separate explicit action, never reached by
    /// decrementing. Returns the new quantity.
    pub fn change_quantity(&mut self, product_id: &str, delta: i64) -> Result<u32, EditError> {
        let item = self.item_mut(product_id)?;
        let next = (i64::from(item.quantity) + delta).max(1);
        item.quantity = u32::try_from(next).unwrap_or(u32::MAX);
        Ok(item.quantity)
    }

    /// Set a line's quantity from raw operator input. Parse failure or a
    /// value below 1 refuses the change and leaves the draft untouched.
    pub fn set_quantity(&mut self, product_id: &str, raw: &str) -> Result<u32, EditError> {
        let parsed: u32 = raw
            .trim()
            .parse()
            .map_err(|_| EditError::InvalidQuantity {
                raw: raw.to_string(),
            })?;
        if parsed < 1 {
            return Err(EditError::InvalidQuantity {
                raw: raw.to_string(),
            });
        }
        let item = self.item_mut(product_id)?;
        item.quantity = parsed;
        Ok(parsed)
    }

    /// Pure label change; unit never drives pricing.
    pub fn change_unit(&mut self, product_id: &str, unit: impl Into<String>) -> Result<(), EditError> {
        let item = self.item_mut(product_id)?;
        item.unit = unit.into();
        Ok(())
    }

    /// Delete a line entirely.
    pub fn remove_item(&mut self, product_id: &str) -> Result<(), EditError> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        if self.items.len() == before {
            return Err(EditError::UnknownLine {
                product_id: product_id.to_string(),
            });
        }
        Ok(())
    }

    /// Append a new line with quantity 1 and the product's default unit.
    /// Refused when the product already has a line.
    pub fn add_item(&mut self, product: &Product) -> Result<(), EditError> {
        if self.items.iter().any(|i| i.product_id == product.id) {
            return Err(EditError::DuplicateProduct {
                product_id: product.id.clone(),
            });
        }
        self.items.push(DraftItem {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity: 1,
            unit: product.default_unit().to_string(),
        });
        Ok(())
    }

    /// The picker list: catalog products that do not already have a line in
    /// this draft.
    pub fn remaining_products<'a>(&self, catalog: &'a [Product]) -> Vec<&'a Product> {
        catalog
            .iter()
            .filter(|p| !self.items.iter().any(|i| i.product_id == p.id))
            .collect()
    }

    /// Minimal payload for `PUT /orders/:id`.
    pub fn save_payload(&self) -> UpdateOrderRequest {
        UpdateOrderRequest {
            order_date: self.order_date,
            items: self
                .items
                .iter()
                .map(|i| OrderItemPatch {
                    product_id: i.product_id.clone(),
                    quantity: i.quantity,
                    unit: i.unit.clone(),
                })
                .collect(),
        }
    }

    fn item_mut(&mut self, product_id: &str) -> Result<&mut DraftItem, EditError> {
        self.items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or_else(|| EditError::UnknownLine {
                product_id: product_id.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use msk_schemas::{OrderLineItem, OrderStatus};

    fn order() -> Order {
        Order {
            id: "ord-1".to_string(),
            distributor_id: "dist-1".to_string(),
            order_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            items: vec![OrderLineItem {
                product_id: "p-1".to_string(),
                product_name: "Milk 1L".to_string(),
                quantity: 3,
                unit: "tub".to_string(),
                cost_per_packet: None,
                packets_per_tub: None,
                cost_per_tub: None,
            }],
            status: OrderStatus::Pending,
            locked: false,
            damaged_products: Vec::new(),
            updated_by: None,
        }
    }

    fn product(id: &str) -> Product {
        Product {
            id: id.to_string(),
            name: format!("{id} name"),
            company_name: "CreamyLand".to_string(),
            cost_per_packet: None,
            packets_per_tub: None,
            cost_per_tub: None,
            unit: None,
        }
    }

    #[test]
    fn quantity_floor_survives_any_decrement_sequence() {
        let mut draft = OrderDraft::from_order(&order()).unwrap();
        for _ in 0..10 {
            draft.change_quantity("p-1", -1).unwrap();
        }
        assert_eq!(draft.items()[0].quantity, 1);
        draft.change_quantity("p-1", -100).unwrap();
        assert_eq!(draft.items()[0].quantity, 1);
    }

    #[test]
    fn set_quantity_refuses_garbage_and_keeps_draft() {
        let mut draft = OrderDraft::from_order(&order()).unwrap();
        assert!(draft.set_quantity("p-1", "abc").is_err());
        assert!(draft.set_quantity("p-1", "0").is_err());
        assert!(draft.set_quantity("p-1", "-4").is_err());
        assert_eq!(draft.items()[0].quantity, 3, "draft must be unchanged");
        assert_eq!(draft.set_quantity("p-1", " 7 ").unwrap(), 7);
    }

    #[test]
    fn add_item_is_guarded_against_duplicates() {
        let mut draft = OrderDraft::from_order(&order()).unwrap();
        draft.add_item(&product("p-2")).unwrap();
        let err = draft.add_item(&product("p-2")).unwrap_err();
        assert_eq!(
            err,
            EditError::DuplicateProduct {
                product_id: "p-2".to_string()
            }
        );
        let lines: Vec<_> = draft
            .items()
            .iter()
            .filter(|i| i.product_id == "p-2")
            .collect();
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn remaining_products_excludes_current_lines() {
        let mut draft = OrderDraft::from_order(&order()).unwrap();
        let catalog = vec![product("p-1"), product("p-2"), product("p-3")];
        let remaining = draft.remaining_products(&catalog);
        assert_eq!(
            remaining.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
            vec!["p-2", "p-3"]
        );
        draft.add_item(&product("p-2")).unwrap();
        assert_eq!(draft.remaining_products(&catalog).len(), 1);
    }

    #[test]
    fn remove_then_unit_change_on_missing_line_refused() {
        let mut draft = OrderDraft::from_order(&order()).unwrap();
        draft.remove_item("p-1").unwrap();
        assert!(matches!(
            draft.change_unit("p-1", "kg"),
            Err(EditError::UnknownLine { .. })
        ));
    }

    #[test]
    fn locked_order_cannot_even_open_a_draft() {
        let mut o = order();
        o.locked = true;
        assert!(matches!(
            OrderDraft::from_order(&o),
            Err(EditError::OrderLocked { .. })
        ));
        let mut o = order();
        o.status = OrderStatus::Delivered;
        assert!(OrderDraft::from_order(&o).is_err());
    }

    #[test]
    fn save_payload_is_minimal() {
        let mut draft = OrderDraft::from_order(&order()).unwrap();
        draft.change_unit("p-1", "bucket").unwrap();
        let payload = draft.save_payload();
        assert_eq!(payload.items.len(), 1);
        assert_eq!(payload.items[0].unit, "bucket");
        assert_eq!(payload.items[0].quantity, 3);
    }
}
