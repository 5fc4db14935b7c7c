//! Pricing resolution with an explicit fallback order.
//!
//! The backend populates pricing on order lines unevenly: some lines carry
//! `cost_per_tub`, some only `cost_per_packet` plus `packets_per_tub`, some
//! nothing at all. Rather than scattering `or`-chains across call sites, every
//! consumer resolves a line through this module.
//!
//! Fallback order:
//! 1. `price_per_tub`   = `cost_per_tub`, else `cost_per_packet * packets_per_tub`
//! 2. `cost_per_packet` = `cost_per_packet`, else `price_per_tub / packets_per_tub`
//!
//! A component that cannot be resolved falls back to **zero** and the line is
//! flagged, so reconciliation of the remaining lines proceeds while the
//! operator can see the gap.

use msk_schemas::OrderLineItem;
use rust_decimal::{Decimal, RoundingStrategy};

/// Resolved per-line pricing, full precision. Never rounded here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinePricing {
    pub price_per_tub: Decimal,
    pub cost_per_packet: Decimal,
}

/// A pricing component that could not be resolved and fell back to zero.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum PricingGap {
    /// No tub price: `cost_per_tub` absent and the packet fallback impossible.
    TubPrice { product_id: String },
    /// No packet cost: `cost_per_packet` absent and the tub fallback impossible.
    PacketCost { product_id: String },
}

impl PricingGap {
    pub fn product_id(&self) -> &str {
        match self {
            PricingGap::TubPrice { product_id } | PricingGap::PacketCost { product_id } => {
                product_id
            }
        }
    }
}

impl std::fmt::Display for PricingGap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PricingGap::TubPrice { product_id } => {
                write!(f, "line {product_id} has no resolvable tub price; billed as zero")
            }
            PricingGap::PacketCost { product_id } => {
                write!(f, "line {product_id} has no resolvable packet cost; damage billed as zero")
            }
        }
    }
}

/// Resolve the pricing for one order line.
///
/// Returns the resolved pricing plus the gaps (if any) where a component fell
/// back to zero. `packets_per_tub == 0` is treated the same as absent: it can
/// drive neither fallback.
pub fn resolve_line_pricing(item: &OrderLineItem) -> (LinePricing, Vec<PricingGap>) {
    let packets = item
        .packets_per_tub
        .filter(|n| *n > 0)
        .map(Decimal::from);

    let price_per_tub = match (item.cost_per_tub, item.cost_per_packet, packets) {
        (Some(tub), _, _) => Some(tub),
        (None, Some(packet), Some(n)) => Some(packet * n),
        _ => None,
    };

    let cost_per_packet = match (item.cost_per_packet, price_per_tub, packets) {
        (Some(packet), _, _) => Some(packet),
        (None, Some(tub), Some(n)) => Some(tub / n),
        _ => None,
    };

    let mut gaps = Vec::new();
    if price_per_tub.is_none() {
        gaps.push(PricingGap::TubPrice {
            product_id: item.product_id.clone(),
        });
    }
    if cost_per_packet.is_none() {
        gaps.push(PricingGap::PacketCost {
            product_id: item.product_id.clone(),
        });
    }

    (
        LinePricing {
            price_per_tub: price_per_tub.unwrap_or(Decimal::ZERO),
            cost_per_packet: cost_per_packet.unwrap_or(Decimal::ZERO),
        },
        gaps,
    )
}

/// Round a monetary value for display or the wire (2 dp, midpoint away from
/// zero). Internal accumulation never rounds; call this only at the boundary.
pub fn to_money(v: Decimal) -> Decimal {
    v.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
