//! msk-reconcile
//!
//! Delivery reconciliation engine.
//!
//! Architectural decisions:
//! - Pricing resolution is a first-class unit with a documented fallback order
//! - Over-range damage entries are clamped, never rejected
//! - Zero-damage entries are dropped from the submitted list
//! - A damage entry for a product not on the order rejects the whole plan
//! - Unpriced lines resolve to zero and are flagged, so the rest of the order
//!   still reconciles
//!
//! Deterministic, pure logic. No IO. No repository calls.

mod engine;
mod pricing;
mod types;

pub use engine::plan_delivery;
pub use pricing::{resolve_line_pricing, to_money, LinePricing, PricingGap};
pub use types::*;
