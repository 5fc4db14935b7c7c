use anyhow::Result;
use msk_orders::OrderRepository;

use super::Console;

pub async fn list(console: &Console, company: &str) -> Result<()> {
    let products = console
        .gateway
        .repository()
        .products_for_company(company)
        .await?;

    if products.is_empty() {
        println!("no products for company {company:?}");
        return Ok(());
    }
    for p in products {
        let packets = p
            .packets_per_tub
            .map(|n| n.to_string())
            .unwrap_or_else(|| "?".to_string());
        let cost = p
            .cost_per_packet
            .map(|c| format!("{c:.2}"))
            .unwrap_or_else(|| "?".to_string());
        println!("{}  {}  {packets} pkt/tub @ {cost}", p.id, p.name);
    }
    Ok(())
}
