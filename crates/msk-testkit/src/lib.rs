//! msk-testkit
//!
//! Builders and wiring for end-to-end delivery scenarios: a seeded
//! [`MemoryRepo`] behind a [`DeliveryGateway`], plus order/product
//! constructors with sensible defaults. Scenario tests under `tests/` wire
//! the editor, the reconciler and the repository exactly the way the
//! operator console does.

use std::sync::Arc;

use chrono::NaiveDate;
use msk_orders::DeliveryGateway;
use msk_repo_memory::MemoryRepo;
use msk_schemas::{
    ActorRole, ActorStamp, Order, OrderLineItem, OrderStatus, Product,
};
use rust_decimal::Decimal;

pub const COMPANY: &str = "CreamyLand";

pub fn admin() -> ActorStamp {
    ActorStamp {
        role: ActorRole::Admin,
        id: "u-admin".to_string(),
        name: "Asha".to_string(),
    }
}

pub fn staff() -> ActorStamp {
    ActorStamp {
        role: ActorRole::Staff,
        id: "u-staff".to_string(),
        name: "Ravi".to_string(),
    }
}

/// A fully priced product of the default company.
pub fn product(id: &str, name: &str, cost_per_packet: i64, packets_per_tub: u32) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        company_name: COMPANY.to_string(),
        cost_per_packet: Some(Decimal::from(cost_per_packet)),
        packets_per_tub: Some(packets_per_tub),
        cost_per_tub: None,
        unit: Some("tub".to_string()),
    }
}

/// An order line carrying the product's pricing, as the backend populates it.
pub fn priced_line(product: &Product, quantity: u32) -> OrderLineItem {
    OrderLineItem {
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        quantity,
        unit: product.default_unit().to_string(),
        cost_per_packet: product.cost_per_packet,
        packets_per_tub: product.packets_per_tub,
        cost_per_tub: product.cost_per_tub,
    }
}

pub fn pending_order(id: &str, distributor_id: &str, items: Vec<OrderLineItem>) -> Order {
    Order {
        id: id.to_string(),
        distributor_id: distributor_id.to_string(),
        order_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        items,
        status: OrderStatus::Pending,
        locked: false,
        damaged_products: Vec::new(),
        updated_by: None,
    }
}

/// One seeded repository behind a gateway, the way the console wires them.
pub struct Harness {
    pub repo: Arc<MemoryRepo>,
    pub gateway: DeliveryGateway<Arc<MemoryRepo>>,
}

impl Harness {
    pub fn new() -> Self {
        let repo = Arc::new(MemoryRepo::new());
        Self {
            gateway: DeliveryGateway::new(repo.clone()),
            repo,
        }
    }

    /// A second gateway over the same repository: a second operator's
    /// screen. Each gateway has its own confirm guard, so races between them
    /// are resolved by the repository, not the client.
    pub fn second_operator(&self) -> DeliveryGateway<Arc<MemoryRepo>> {
        DeliveryGateway::new(self.repo.clone())
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
