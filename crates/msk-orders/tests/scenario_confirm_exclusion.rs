//! A second confirm while one is in flight must be refused locally, with no
//! second network call. The repository here never resolves until the test
//! releases it, holding the first confirm in flight deterministically.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use msk_orders::{
    DeliveryError, DeliveryGateway, GateRefusal, OrderRepository, OrderScope, RepoError,
};
use msk_reconcile::plan_delivery;
use msk_schemas::{
    ActorRole, ActorStamp, DeliverOrderRequest, DeliverOrderResponse, Order, OrderLineItem,
    OrderStatus, Product, UpdateOrderRequest,
};
use rust_decimal::Decimal;
use tokio::sync::Notify;

struct SlowRepo {
    release: Notify,
    deliver_calls: AtomicU32,
}

impl SlowRepo {
    fn new() -> Self {
        Self {
            release: Notify::new(),
            deliver_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl OrderRepository for SlowRepo {
    async fn list_orders(&self, _scope: OrderScope) -> Result<Vec<Order>, RepoError> {
        Err(RepoError::Api {
            status: 500,
            message: "not wired".to_string(),
        })
    }

    async fn get_order(&self, _id: &str) -> Result<Order, RepoError> {
        Err(RepoError::Api {
            status: 500,
            message: "not wired".to_string(),
        })
    }

    async fn update_order(&self, _id: &str, _req: &UpdateOrderRequest) -> Result<Order, RepoError> {
        Err(RepoError::Api {
            status: 500,
            message: "not wired".to_string(),
        })
    }

    async fn deliver_order(
        &self,
        _id: &str,
        req: &DeliverOrderRequest,
    ) -> Result<DeliverOrderResponse, RepoError> {
        self.deliver_calls.fetch_add(1, Ordering::SeqCst);
        self.release.notified().await;
        Ok(DeliverOrderResponse {
            bill_generated: true,
            credited_amount: Decimal::from(150),
            wallet_balance: Decimal::from(150),
            order: Order {
                id: "ord-1".to_string(),
                distributor_id: "dist-1".to_string(),
                order_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                items: Vec::new(),
                status: OrderStatus::Delivered,
                locked: true,
                damaged_products: Vec::new(),
                updated_by: Some(req.updated_by.clone()),
            },
        })
    }

    async fn delete_order(&self, _id: &str) -> Result<(), RepoError> {
        Err(RepoError::Api {
            status: 500,
            message: "not wired".to_string(),
        })
    }

    async fn products_for_company(&self, _company: &str) -> Result<Vec<Product>, RepoError> {
        Err(RepoError::Api {
            status: 500,
            message: "not wired".to_string(),
        })
    }
}

fn pending_order() -> Order {
    Order {
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
    }
}

fn actor() -> ActorStamp {
    ActorStamp {
        role: ActorRole::Admin,
        id: "u-1".to_string(),
        name: "Asha".to_string(),
    }
}

#[tokio::test]
async fn scenario_second_confirm_refused_while_first_in_flight() {
    let repo = Arc::new(SlowRepo::new());
    let gateway = Arc::new(DeliveryGateway::new(repo.clone()));

    let order = pending_order();
    let plan = plan_delivery(&order, &[]).unwrap();

    let first = {
        let gateway = gateway.clone();
        let order = order.clone();
        let plan = plan.clone();
        tokio::spawn(async move { gateway.deliver(&order, &plan, None, actor()).await })
    };

    // Let the first confirm reach the repository and park there.
    while repo.deliver_calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    let second = gateway.deliver(&order, &plan, None, actor()).await;
    assert!(matches!(
        second,
        Err(DeliveryError::Refused(GateRefusal::ConfirmInFlight))
    ));

    repo.release.notify_one();
    let first = first.await.unwrap();
    assert!(first.is_ok());
    assert_eq!(
        repo.deliver_calls.load(Ordering::SeqCst),
        1,
        "the refused confirm must not have reached the repository"
    );
}
