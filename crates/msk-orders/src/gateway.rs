//! Delivery gateway: the single choke-point for mutating repository calls.
//!
//! # Gate order for `deliver`
//!
//! 1. **Lock gate**: the order must still be pending and unlocked. UI state
//!    can race server state, so the check runs immediately before dispatch.
//! 2. **Damage gate**: a plan carrying nonzero damage requires an explicit
//!    [`DamageAck`], obtainable only from the plan itself after its summary
//!    could be shown to the operator.
//! 3. **Confirm gate**: [`ConfirmGuard`] hands out at most one permit;
//!    a second confirm while one is in flight is refused locally.
//!
//! The client-side gates are a convenience. The repository remains the
//! authoritative at-most-once enforcement; its refusal is surfaced verbatim
//! and local state is never mutated optimistically.

use msk_reconcile::DeliveryPlan;
use msk_schemas::{ActorStamp, DeliverOrderRequest, DeliverOrderResponse, Order};

use crate::confirm::{ConfirmGuard, ConfirmState};
use crate::draft::OrderDraft;
use crate::repository::{OrderRepository, RepoError};

// ---------------------------------------------------------------------------
// GateRefusal
// ---------------------------------------------------------------------------

/// The reason a mutating operation was refused at the gateway, before any
/// network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateRefusal {
    OrderLocked,
    ConfirmInFlight,
    ConfirmSettled,
    DamageUnconfirmed,
}

impl std::fmt::Display for GateRefusal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateRefusal::OrderLocked => {
                write!(f, "GATE_REFUSED: order is delivered or locked")
            }
            GateRefusal::ConfirmInFlight => {
                write!(f, "GATE_REFUSED: a confirm is already in flight")
            }
            GateRefusal::ConfirmSettled => {
                write!(f, "GATE_REFUSED: delivery already succeeded here")
            }
            GateRefusal::DamageUnconfirmed => {
                write!(f, "GATE_REFUSED: damage summary not acknowledged")
            }
        }
    }
}

impl std::error::Error for GateRefusal {}

// ---------------------------------------------------------------------------
// DamageAck
// ---------------------------------------------------------------------------

/// Operator acknowledgement of a delivery plan that carries damage.
///
/// Obtainable only via [`DamageAck::acknowledge`], which takes the plan, so
/// callers therefore had the plan (and its summary) in hand before
/// confirming. The gateway cross-checks the acknowledged order id, so an ack
/// minted for one order cannot confirm another.
#[derive(Debug, Clone)]
pub struct DamageAck {
    order_id: String,
}

impl DamageAck {
    /// Acknowledge the plan's damage summary on behalf of the operator.
    pub fn acknowledge(plan: &DeliveryPlan) -> Self {
        Self {
            order_id: plan.order_id.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// DeliveryError
// ---------------------------------------------------------------------------

/// Error surface of the gateway: a local gate refusal or a repository error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    Refused(GateRefusal),
    Repo(RepoError),
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::Refused(e) => e.fmt(f),
            DeliveryError::Repo(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for DeliveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DeliveryError::Refused(e) => Some(e),
            DeliveryError::Repo(e) => Some(e),
        }
    }
}

impl From<GateRefusal> for DeliveryError {
    fn from(e: GateRefusal) -> Self {
        DeliveryError::Refused(e)
    }
}

impl From<RepoError> for DeliveryError {
    fn from(e: RepoError) -> Self {
        DeliveryError::Repo(e)
    }
}

// ---------------------------------------------------------------------------
// DeliveryGateway
// ---------------------------------------------------------------------------

/// The single path to mutating repository calls for one order screen.
///
/// Holds the repository adapter and the confirm guard; read-only calls may go
/// to the repository directly via [`DeliveryGateway::repository`].
pub struct DeliveryGateway<R: OrderRepository> {
    repo: R,
    confirm: ConfirmGuard,
}

impl<R: OrderRepository> DeliveryGateway<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            confirm: ConfirmGuard::new(),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn confirm_state(&self) -> ConfirmState {
        self.confirm.state()
    }

    /// Save pre-delivery edits.
    ///
    /// The lock gate re-checks `order` here even though the draft refused to
    /// open on a locked order: the server may have delivered it since. A
    /// refusal makes **no network call**.
    pub async fn save_edits(
        &self,
        order: &Order,
        draft: &OrderDraft,
    ) -> Result<Order, DeliveryError> {
        if order.is_locked() {
            return Err(GateRefusal::OrderLocked.into());
        }
        debug_assert_eq!(draft.order_id(), order.id);
        let req = draft.save_payload();
        Ok(self.repo.update_order(&order.id, &req).await?)
    }

    /// Submit a delivery.
    ///
    /// On success the caller receives the repository response (side effects
    /// plus the updated order) and must replace its local copy. On failure
    /// local state stays `pending`/unlocked and the confirm guard returns to
    /// idle so the operator can retry.
    pub async fn deliver(
        &self,
        order: &Order,
        plan: &DeliveryPlan,
        ack: Option<&DamageAck>,
        actor: ActorStamp,
    ) -> Result<DeliverOrderResponse, DeliveryError> {
        if order.is_locked() {
            return Err(GateRefusal::OrderLocked.into());
        }
        debug_assert_eq!(plan.order_id, order.id);

        if plan.has_damage() {
            match ack {
                Some(a) if a.order_id == plan.order_id => {}
                _ => return Err(GateRefusal::DamageUnconfirmed.into()),
            }
        }

        let permit = self.confirm.begin()?;

        let req = DeliverOrderRequest {
            damaged_products: if plan.damaged_products.is_empty() {
                None
            } else {
                Some(plan.damaged_products.clone())
            },
            updated_by: actor,
        };

        match self.repo.deliver_order(&order.id, &req).await {
            Ok(resp) => {
                permit.settle_success();
                Ok(resp)
            }
            // Permit drops here: guard returns to idle, retry is possible.
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a pending order. Refused locally once locked/delivered.
    pub async fn delete_order(&self, order: &Order) -> Result<(), DeliveryError> {
        if order.is_locked() {
            return Err(GateRefusal::OrderLocked.into());
        }
        Ok(self.repo.delete_order(&order.id).await?)
    }
}
