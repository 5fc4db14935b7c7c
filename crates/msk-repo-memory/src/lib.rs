//! Deterministic in-memory repository adapter.
//!
//! Design decisions (kept intentionally simple/deterministic):
//! - Storage is `BTreeMap`s, so listing order is stable.
//! - No randomness. No wall-clock.
//! - The delivery side effects are computed with the same pricing engine the
//!   client uses (`msk-reconcile`), so credited amounts line up with plans.
//! - `deliver_order` on an already-delivered/locked order returns `Conflict`
//!   so this adapter is the authoritative at-most-once point in tests, exactly
//!   like the real backend.
//! - Mutating-call counts are observable, so scenario tests can assert
//!   "no network call was made".
//!
//! `OrderScope` is advisory here: there is no authenticated caller, so every
//! scope returns the full order set.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use msk_orders::{OrderRepository, OrderScope, RepoError};
use msk_reconcile::{plan_delivery, to_money, DamageEntry};
use msk_schemas::{
    DeliverOrderRequest, DeliverOrderResponse, Order, OrderLineItem, OrderStatus, Product,
    UpdateOrderRequest,
};
use rust_decimal::Decimal;

/// Observable counts of mutating calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub update_order: u32,
    pub deliver_order: u32,
    pub delete_order: u32,
}

#[derive(Default)]
struct Inner {
    orders: BTreeMap<String, Order>,
    products: BTreeMap<String, Product>,
    /// distributor_id -> wallet balance
    wallets: BTreeMap<String, Decimal>,
    /// order_id -> auto-generated bill amount
    bills: BTreeMap<String, Decimal>,
    calls: CallCounts,
}

/// In-memory stand-in for the order backend.
#[derive(Default)]
pub struct MemoryRepo {
    inner: Mutex<Inner>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    // Poison-tolerant: a panicking test thread must not wedge the double.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // -- seeding -----------------------------------------------------------

    pub fn seed_order(&self, order: Order) {
        self.lock().orders.insert(order.id.clone(), order);
    }

    pub fn seed_product(&self, product: Product) {
        self.lock().products.insert(product.id.clone(), product);
    }

    pub fn set_wallet(&self, distributor_id: impl Into<String>, balance: Decimal) {
        self.lock().wallets.insert(distributor_id.into(), balance);
    }

    // -- observers ---------------------------------------------------------

    pub fn order(&self, id: &str) -> Option<Order> {
        self.lock().orders.get(id).cloned()
    }

    pub fn wallet_balance(&self, distributor_id: &str) -> Decimal {
        self.lock()
            .wallets
            .get(distributor_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn bill_for(&self, order_id: &str) -> Option<Decimal> {
        self.lock().bills.get(order_id).copied()
    }

    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }
}

fn not_found(id: &str) -> RepoError {
    RepoError::Api {
        status: 404,
        message: format!("order {id} not found"),
    }
}

#[async_trait]
impl OrderRepository for MemoryRepo {
    async fn list_orders(&self, _scope: OrderScope) -> Result<Vec<Order>, RepoError> {
        Ok(self.lock().orders.values().cloned().collect())
    }

    async fn get_order(&self, id: &str) -> Result<Order, RepoError> {
        self.lock().orders.get(id).cloned().ok_or_else(|| not_found(id))
    }

    async fn update_order(&self, id: &str, req: &UpdateOrderRequest) -> Result<Order, RepoError> {
        let mut inner = self.lock();
        inner.calls.update_order += 1;

        for patch in &req.items {
            if patch.quantity < 1 {
                return Err(RepoError::Api {
                    status: 400,
                    message: format!("quantity must be at least 1 for {}", patch.product_id),
                });
            }
        }

        // Repopulate derived fields from the catalog: the repository owns them.
        let items: Vec<OrderLineItem> = req
            .items
            .iter()
            .map(|patch| {
                let product = inner.products.get(&patch.product_id);
                OrderLineItem {
                    product_id: patch.product_id.clone(),
                    product_name: product.map(|p| p.name.clone()).unwrap_or_default(),
                    quantity: patch.quantity,
                    unit: patch.unit.clone(),
                    cost_per_packet: product.and_then(|p| p.cost_per_packet),
                    packets_per_tub: product.and_then(|p| p.packets_per_tub),
                    cost_per_tub: product.and_then(|p| p.cost_per_tub),
                }
            })
            .collect();

        let order = inner.orders.get_mut(id).ok_or_else(|| not_found(id))?;
        if order.is_locked() {
            return Err(RepoError::Conflict {
                message: "Order is locked and can no longer be edited".to_string(),
            });
        }
        order.order_date = req.order_date;
        order.items = items;
        Ok(order.clone())
    }

    async fn deliver_order(
        &self,
        id: &str,
        req: &DeliverOrderRequest,
    ) -> Result<DeliverOrderResponse, RepoError> {
        let mut inner = self.lock();
        inner.calls.deliver_order += 1;

        let mut order = inner.orders.get(id).cloned().ok_or_else(|| not_found(id))?;
        if order.is_locked() {
            return Err(RepoError::Conflict {
                message: "Order has already been delivered".to_string(),
            });
        }

        // Recompute the bill server-side with the same pricing engine; the
        // submitted damage list is re-clamped rather than trusted.
        let entries: Vec<DamageEntry> = req
            .damaged_products
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|d| DamageEntry::new(d.product_id.clone(), d.damaged_packets))
            .collect();
        let plan = plan_delivery(&order, &entries).map_err(|e| RepoError::Api {
            status: 400,
            message: e.to_string(),
        })?;

        let credited = to_money(plan.final_bill);
        let balance = inner
            .wallets
            .entry(order.distributor_id.clone())
            .or_insert(Decimal::ZERO);
        *balance += credited;
        let wallet_balance = *balance;

        order.status = OrderStatus::Delivered;
        order.locked = true;
        order.damaged_products = plan.damaged_products;
        order.updated_by = Some(req.updated_by.clone());

        inner.bills.insert(order.id.clone(), credited);
        inner.orders.insert(order.id.clone(), order.clone());

        Ok(DeliverOrderResponse {
            bill_generated: true,
            credited_amount: credited,
            wallet_balance,
            order,
        })
    }

    async fn delete_order(&self, id: &str) -> Result<(), RepoError> {
        let mut inner = self.lock();
        inner.calls.delete_order += 1;

        let order = inner.orders.get(id).ok_or_else(|| not_found(id))?;
        if order.is_locked() {
            return Err(RepoError::Conflict {
                message: "Order has already been delivered".to_string(),
            });
        }
        inner.orders.remove(id);
        Ok(())
    }

    async fn products_for_company(&self, company: &str) -> Result<Vec<Product>, RepoError> {
        Ok(self
            .lock()
            .products
            .values()
            .filter(|p| p.company_name == company)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use msk_schemas::{ActorRole, ActorStamp, OrderItemPatch};

    fn actor() -> ActorStamp {
        ActorStamp {
            role: ActorRole::Staff,
            id: "u-9".to_string(),
            name: "Ravi".to_string(),
        }
    }

    fn seeded() -> MemoryRepo {
        let repo = MemoryRepo::new();
        repo.seed_product(Product {
            id: "p-1".to_string(),
            name: "Milk 1L".to_string(),
            company_name: "CreamyLand".to_string(),
            cost_per_packet: Some(Decimal::from(10)),
            packets_per_tub: Some(5),
            cost_per_tub: None,
            unit: Some("tub".to_string()),
        });
        repo.seed_order(Order {
            id: "ord-1".to_string(),
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
        });
        repo
    }

    #[tokio::test]
    async fn second_delivery_conflicts_and_credits_once() {
        let repo = seeded();
        repo.set_wallet("dist-1", Decimal::from(100));
        let req = DeliverOrderRequest {
            damaged_products: None,
            updated_by: actor(),
        };

        let resp = repo.deliver_order("ord-1", &req).await.unwrap();
        assert!(resp.bill_generated);
        assert_eq!(resp.credited_amount, Decimal::from(150));
        assert_eq!(resp.wallet_balance, Decimal::from(250));

        let err = repo.deliver_order("ord-1", &req).await.unwrap_err();
        assert!(matches!(err, RepoError::Conflict { .. }));
        assert_eq!(repo.wallet_balance("dist-1"), Decimal::from(250));
    }

    #[tokio::test]
    async fn update_repopulates_derived_fields_from_catalog() {
        let repo = seeded();
        let req = UpdateOrderRequest {
            order_date: NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
            items: vec![OrderItemPatch {
                product_id: "p-1".to_string(),
                quantity: 5,
                unit: "bucket".to_string(),
            }],
        };
        let updated = repo.update_order("ord-1", &req).await.unwrap();
        assert_eq!(updated.items[0].quantity, 5);
        assert_eq!(updated.items[0].cost_per_packet, Some(Decimal::from(10)));
        assert_eq!(updated.items[0].product_name, "Milk 1L");
    }

    #[tokio::test]
    async fn delivered_order_refuses_edits_and_deletes() {
        let repo = seeded();
        let req = DeliverOrderRequest {
            damaged_products: None,
            updated_by: actor(),
        };
        repo.deliver_order("ord-1", &req).await.unwrap();

        let update = UpdateOrderRequest {
            order_date: NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
            items: Vec::new(),
        };
        assert!(matches!(
            repo.update_order("ord-1", &update).await,
            Err(RepoError::Conflict { .. })
        ));
        assert!(matches!(
            repo.delete_order("ord-1").await,
            Err(RepoError::Conflict { .. })
        ));
    }
}
