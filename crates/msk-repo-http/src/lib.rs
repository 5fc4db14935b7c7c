//! Live REST repository adapter.
//!
//! This crate IS the HTTP adapter for the order backend: it owns URL
//! construction, bearer authorization and the mapping from transport/HTTP
//! failures onto [`RepoError`]. No business rules live here: gates and
//! validation sit in `msk-orders`/`msk-reconcile`, and the backend itself is
//! an external collaborator.
//!
//! Error mapping contract:
//! - connect/timeout/body failures => `Transport` (never retried here)
//! - 409, and 400 bodies that read as an already-delivered/locked rejection
//!   => `Conflict` carrying the server message verbatim
//! - any other non-2xx => `Api { status, message }`
//! - a 2xx body that fails to decode => `Decode`

use async_trait::async_trait;
use msk_orders::{OrderRepository, OrderScope, RepoError};
use msk_schemas::{
    DeliverOrderRequest, DeliverOrderResponse, Order, Product, UpdateOrderRequest,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// `OrderRepository` over HTTPS + JSON.
pub struct HttpOrderRepository {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpOrderRepository {
    /// `base_url` is the API root (e.g. `https://api.example.com/api`);
    /// `token` is the bearer token resolved at startup.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Reuse an externally configured client (custom TLS, proxies).
    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send, enforce status mapping, hand back the successful response.
    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, RepoError> {
        let resp = req
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(map_failure(status.as_u16(), &body))
    }

    async fn recv_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, RepoError> {
        let resp = self.send(req).await?;
        resp.json::<T>().await.map_err(|e| RepoError::Decode {
            message: e.to_string(),
        })
    }

    async fn recv_unit(&self, req: reqwest::RequestBuilder) -> Result<(), RepoError> {
        self.send(req).await.map(|_| ())
    }
}

#[async_trait]
impl OrderRepository for HttpOrderRepository {
    async fn list_orders(&self, scope: OrderScope) -> Result<Vec<Order>, RepoError> {
        let path = match scope {
            OrderScope::Default => "/orders",
            OrderScope::Mine => "/orders/my-orders",
            OrderScope::All => "/orders/all",
        };
        tracing::debug!(path, "listing orders");
        self.recv_json(self.http.get(self.url(path))).await
    }

    async fn get_order(&self, id: &str) -> Result<Order, RepoError> {
        self.recv_json(self.http.get(self.url(&format!("/orders/{id}"))))
            .await
    }

    async fn update_order(&self, id: &str, req: &UpdateOrderRequest) -> Result<Order, RepoError> {
        tracing::debug!(order_id = id, items = req.items.len(), "updating order");
        self.recv_json(self.http.put(self.url(&format!("/orders/{id}"))).json(req))
            .await
    }

    async fn deliver_order(
        &self,
        id: &str,
        req: &DeliverOrderRequest,
    ) -> Result<DeliverOrderResponse, RepoError> {
        tracing::debug!(
            order_id = id,
            damaged_lines = req.damaged_products.as_ref().map_or(0, Vec::len),
            "delivering order"
        );
        self.recv_json(
            self.http
                .post(self.url(&format!("/orders/{id}/deliver")))
                .json(req),
        )
        .await
    }

    async fn delete_order(&self, id: &str) -> Result<(), RepoError> {
        tracing::debug!(order_id = id, "deleting order");
        self.recv_unit(self.http.delete(self.url(&format!("/orders/{id}"))))
            .await
    }

    async fn products_for_company(&self, company: &str) -> Result<Vec<Product>, RepoError> {
        let path = format!("/products/company/{}", urlencoding::encode(company));
        self.recv_json(self.http.get(self.url(&path))).await
    }
}

// ---------------------------------------------------------------------------
// Failure mapping
// ---------------------------------------------------------------------------

fn transport(e: reqwest::Error) -> RepoError {
    RepoError::Transport {
        message: e.to_string(),
    }
}

/// Map a non-2xx response onto the error taxonomy. Public so the mapping is a
/// testable unit without a live server.
pub fn map_failure(status: u16, body: &str) -> RepoError {
    let message = extract_message(body).unwrap_or_else(|| format!("HTTP {status}"));
    if status == 409 || (status == 400 && is_lock_message(&message)) {
        return RepoError::Conflict { message };
    }
    RepoError::Api { status, message }
}

/// Pull the human-readable message out of an error body. The backend nests it
/// under `message`; some middlewares use `error`.
fn extract_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrBody {
        message: Option<String>,
        error: Option<String>,
    }
    serde_json::from_str::<ErrBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.is_empty())
}

fn is_lock_message(message: &str) -> bool {
    let m = message.to_ascii_lowercase();
    m.contains("already") && (m.contains("delivered") || m.contains("locked"))
        || m.contains("locked")
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
