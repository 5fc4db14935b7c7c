//! Repository port.
//!
//! The REST backend owns persisted order state; everything the delivery core
//! needs from it sits behind [`OrderRepository`]. Adapters implement the
//! trait (live HTTP, deterministic in-memory); routing always flows through
//! [`crate::DeliveryGateway`] for mutations.

use async_trait::async_trait;
use msk_schemas::{
    DeliverOrderRequest, DeliverOrderResponse, Order, Product, UpdateOrderRequest,
};

/// Which listing endpoint to hit. Scope varies by caller role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    /// `GET /orders`
    Default,
    /// `GET /orders/my-orders`
    Mine,
    /// `GET /orders/all`
    All,
}

// ---------------------------------------------------------------------------
// RepoError
// ---------------------------------------------------------------------------

/// Failure taxonomy for repository calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    /// The server rejected the mutation: order already delivered/locked, or a
    /// competing operator won. The server's message is carried verbatim.
    Conflict { message: String },
    /// Network failure or timeout. Never retried automatically; the operator
    /// re-triggers the action.
    Transport { message: String },
    /// Any other server-reported failure.
    Api { status: u16, message: String },
    /// A 2xx response whose body did not match the expected shape.
    Decode { message: String },
}

impl std::fmt::Display for RepoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Verbatim: the UI shows exactly what the server said.
            RepoError::Conflict { message } => write!(f, "{message}"),
            RepoError::Transport { message } => {
                write!(f, "network failure ({message}); the action was not retried")
            }
            RepoError::Api { status, message } => write!(f, "server error {status}: {message}"),
            RepoError::Decode { message } => write!(f, "malformed response: {message}"),
        }
    }
}

impl std::error::Error for RepoError {}

// ---------------------------------------------------------------------------
// OrderRepository
// ---------------------------------------------------------------------------

/// Port to the order backend.
///
/// The repository is the source of truth for computed/derived fields: every
/// successful mutation returns the updated order, and callers replace their
/// local copy wholesale.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn list_orders(&self, scope: OrderScope) -> Result<Vec<Order>, RepoError>;

    async fn get_order(&self, id: &str) -> Result<Order, RepoError>;

    /// `PUT /orders/:id`. Rejected server-side when the order is
    /// locked/delivered, independent of the client-side guard.
    async fn update_order(&self, id: &str, req: &UpdateOrderRequest) -> Result<Order, RepoError>;

    /// `POST /orders/:id/deliver`. The authoritative at-most-once point: a
    /// second delivery of the same order must come back as `Conflict`.
    async fn deliver_order(
        &self,
        id: &str,
        req: &DeliverOrderRequest,
    ) -> Result<DeliverOrderResponse, RepoError>;

    /// `DELETE /orders/:id`: remove a pending order.
    async fn delete_order(&self, id: &str) -> Result<(), RepoError>;

    /// `GET /products/company/:companyName`: addable products for the
    /// editor's picker.
    async fn products_for_company(&self, company: &str) -> Result<Vec<Product>, RepoError>;
}

// Shared handles delegate, so one adapter can back several gateways.
#[async_trait]
impl<R: OrderRepository + ?Sized> OrderRepository for std::sync::Arc<R> {
    async fn list_orders(&self, scope: OrderScope) -> Result<Vec<Order>, RepoError> {
        (**self).list_orders(scope).await
    }

    async fn get_order(&self, id: &str) -> Result<Order, RepoError> {
        (**self).get_order(id).await
    }

    async fn update_order(&self, id: &str, req: &UpdateOrderRequest) -> Result<Order, RepoError> {
        (**self).update_order(id, req).await
    }

    async fn deliver_order(
        &self,
        id: &str,
        req: &DeliverOrderRequest,
    ) -> Result<DeliverOrderResponse, RepoError> {
        (**self).deliver_order(id, req).await
    }

    async fn delete_order(&self, id: &str) -> Result<(), RepoError> {
        (**self).delete_order(id).await
    }

    async fn products_for_company(&self, company: &str) -> Result<Vec<Product>, RepoError> {
        (**self).products_for_company(company).await
    }
}
