//! Order commands: list/show/edit/deliver/delete.
//!
//! `deliver` carries the deliberate friction point: when any line has
//! damage, the summary is printed and the command refuses to submit unless
//! `--yes` acknowledged it.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use msk_audit::{EVENT_ORDER_DELETE, EVENT_ORDER_DELIVER, EVENT_ORDER_EDIT};
use msk_orders::{DamageAck, OrderDraft, OrderRepository, OrderScope};
use msk_reconcile::{plan_delivery, to_money, DamageEntry};
use msk_schemas::Order;
use serde_json::json;

use super::Console;

/// Journal appends are auxiliary: the mutation already succeeded, so a
/// journal failure degrades to a warning instead of failing the command.
fn journal_event(console: &Console, order_id: &str, event_type: &str, payload: serde_json::Value) {
    let outcome = console
        .journal()
        .and_then(|mut j| j.append(order_id, &console.actor, event_type, payload));
    if let Err(e) = outcome {
        tracing::warn!(order_id, event_type, error = %e, "journal append failed");
    }
}

// ---------------------------------------------------------------------------
// Flag parsing ("PRODUCT=VALUE")
// ---------------------------------------------------------------------------

fn parse_scope(s: &str) -> Result<OrderScope> {
    match s {
        "default" => Ok(OrderScope::Default),
        "mine" => Ok(OrderScope::Mine),
        "all" => Ok(OrderScope::All),
        other => bail!("unknown scope {other:?}: expected default | mine | all"),
    }
}

fn split_spec(spec: &str) -> Result<(&str, &str)> {
    spec.split_once('=')
        .filter(|(p, v)| !p.is_empty() && !v.is_empty())
        .with_context(|| format!("bad spec {spec:?}: expected PRODUCT=VALUE"))
}

fn parse_damage_spec(spec: &str) -> Result<DamageEntry> {
    let (product, packets) = split_spec(spec)?;
    let packets: u32 = packets
        .parse()
        .with_context(|| format!("bad packet count in {spec:?}"))?;
    Ok(DamageEntry::new(product, packets))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("bad date {raw:?}: expected YYYY-MM-DD"))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn print_order_row(order: &Order) {
    let lock = if order.is_locked() { " [locked]" } else { "" };
    println!(
        "{}  {}  {:?}{}  {} line(s)",
        order.id,
        order.order_date,
        order.status,
        lock,
        order.items.len()
    );
}

pub async fn list(console: &Console, scope: &str) -> Result<()> {
    let scope = parse_scope(scope)?;
    let orders = console.gateway.repository().list_orders(scope).await?;
    if orders.is_empty() {
        println!("no orders");
        return Ok(());
    }
    for order in &orders {
        print_order_row(order);
    }
    Ok(())
}

pub async fn show(console: &Console, id: &str) -> Result<()> {
    let order = console.gateway.repository().get_order(id).await?;
    print_order_row(&order);
    for item in &order.items {
        println!(
            "  {} x{} {}  ({})",
            item.product_id, item.quantity, item.unit, item.product_name
        );
    }
    for d in &order.damaged_products {
        println!("  damaged: {} {} packet(s)", d.product_id, d.damaged_packets);
    }
    if let Some(actor) = &order.updated_by {
        println!("  delivered by {} ({:?})", actor.name, actor.role);
    }
    // Bill preview only makes sense while the order is still pending.
    if let Ok(plan) = plan_delivery(&order, &[]) {
        println!("  current bill: {:.2}", to_money(plan.total_bill));
        for gap in &plan.pricing_gaps {
            println!("  warning: {gap}");
        }
    }
    Ok(())
}

pub struct EditArgs {
    pub id: String,
    pub set_qty: Vec<String>,
    pub bump_qty: Vec<String>,
    pub unit: Vec<String>,
    pub add: Vec<String>,
    pub remove: Vec<String>,
    pub company: Option<String>,
    pub date: Option<String>,
}

pub async fn edit(console: &Console, args: EditArgs) -> Result<()> {
    let repo = console.gateway.repository();
    let order = repo.get_order(&args.id).await?;
    let mut draft = OrderDraft::from_order(&order)?;

    if let Some(raw) = &args.date {
        draft.set_order_date(parse_date(raw)?);
    }
    for spec in &args.set_qty {
        let (product, value) = split_spec(spec)?;
        draft.set_quantity(product, value)?;
    }
    for spec in &args.bump_qty {
        let (product, delta) = split_spec(spec)?;
        let delta: i64 = delta
            .parse()
            .with_context(|| format!("bad delta in {spec:?}"))?;
        draft.change_quantity(product, delta)?;
    }
    for spec in &args.unit {
        let (product, unit) = split_spec(spec)?;
        draft.change_unit(product, unit)?;
    }
    for product in &args.remove {
        draft.remove_item(product)?;
    }
    if !args.add.is_empty() {
        let company = args
            .company
            .as_deref()
            .context("--add needs --company for the catalog lookup")?;
        let catalog = repo.products_for_company(company).await?;
        for pid in &args.add {
            let product = catalog.iter().find(|p| &p.id == pid).with_context(|| {
                let addable: Vec<&str> = draft
                    .remaining_products(&catalog)
                    .into_iter()
                    .map(|p| p.id.as_str())
                    .collect();
                format!("product {pid} not in {company}'s catalog; addable: {addable:?}")
            })?;
            draft.add_item(product)?;
        }
    }

    // The gateway re-checks the lock before the network call.
    let updated = console.gateway.save_edits(&order, &draft).await?;
    tracing::info!(order_id = %updated.id, items = updated.items.len(), "order saved");
    println!(
        "saved order {}: {} line(s), dated {}",
        updated.id,
        updated.items.len(),
        updated.order_date
    );

    journal_event(
        console,
        &updated.id,
        EVENT_ORDER_EDIT,
        json!({
            "items": updated.items.len(),
            "orderDate": updated.order_date,
            "configHash": console.config_hash,
        }),
    );
    Ok(())
}

pub async fn deliver(console: &Console, id: &str, damage_specs: &[String], yes: bool) -> Result<()> {
    let repo = console.gateway.repository();
    let order = repo.get_order(id).await?;

    let entries = damage_specs
        .iter()
        .map(|s| parse_damage_spec(s))
        .collect::<Result<Vec<_>>>()?;
    let plan = plan_delivery(&order, &entries)?;

    for gap in &plan.pricing_gaps {
        println!("warning: {gap}");
    }
    for clamp in &plan.clamps {
        println!(
            "note: damage for {} clamped {} -> {} packet(s)",
            clamp.product_id, clamp.entered, clamp.clamped_to
        );
    }
    println!("{}", plan.summary());

    let ack = if plan.has_damage() {
        if !yes {
            bail!("damage present: re-run with --yes to acknowledge the summary above");
        }
        Some(DamageAck::acknowledge(&plan))
    } else {
        None
    };

    let resp = console
        .gateway
        .deliver(&order, &plan, ack.as_ref(), console.actor.clone())
        .await?;

    tracing::info!(
        order_id = %resp.order.id,
        credited = %resp.credited_amount,
        "order delivered"
    );
    println!(
        "delivered {}: credited {:.2}, wallet {:.2}, bill generated: {}",
        resp.order.id, resp.credited_amount, resp.wallet_balance, resp.bill_generated
    );

    journal_event(
        console,
        &resp.order.id,
        EVENT_ORDER_DELIVER,
        json!({
            "creditedAmount": resp.credited_amount,
            "walletBalance": resp.wallet_balance,
            "billGenerated": resp.bill_generated,
            "damagedLines": plan.damaged_line_count(),
            "configHash": console.config_hash,
        }),
    );
    Ok(())
}

pub async fn delete(console: &Console, id: &str) -> Result<()> {
    let order = console.gateway.repository().get_order(id).await?;
    console.gateway.delete_order(&order).await?;
    println!("deleted order {id}");

    journal_event(
        console,
        id,
        EVENT_ORDER_DELETE,
        json!({ "configHash": console.config_hash }),
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
