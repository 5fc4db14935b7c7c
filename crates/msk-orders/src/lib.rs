//! msk-orders
//!
//! Order Editor and the delivery gateway.
//!
//! - `OrderDraft` holds the pre-delivery editing rules: quantity floor of 1,
//!   at most one line per product, parse-or-refuse quantity input.
//! - `OrderRepository` is the port to the REST backend (an external
//!   collaborator); adapters live in `msk-repo-http` and `msk-repo-memory`.
//! - `DeliveryGateway` is the single choke-point for mutating repository
//!   calls: lock gate, confirm gate (explicit Idle -> InFlight -> Settled
//!   machine) and the damage-acknowledgement gate run before every dispatch.

mod confirm;
mod draft;
mod gateway;
mod repository;

pub use confirm::{ConfirmGuard, ConfirmPermit, ConfirmState};
pub use draft::{DraftItem, EditError, OrderDraft};
pub use gateway::{DamageAck, DeliveryError, DeliveryGateway, GateRefusal};
pub use repository::{OrderRepository, OrderScope, RepoError};
