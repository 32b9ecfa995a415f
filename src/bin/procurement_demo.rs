//! Procurement demo
//!
//! Runs one RFQ through quotation, comparison, acceptance, settlement and a
//! partial refund against a seeded catalog.
//!
//! ```text
//! procurement-demo [--config <PATH>]
//! ```
//!
//! With `database.url` configured the run uses PostgreSQL (migrations are
//! applied first), otherwise everything stays in memory.

use anyhow::Context;
use clap::Parser;
use procurement_engine::application::dto::{NewQuotation, NewRfq};
use procurement_engine::application::ProcurementEngine;
use procurement_engine::config::EngineConfig;
use procurement_engine::domain::entities::quotation::QuotationItemSpec;
use procurement_engine::domain::entities::reference::{
    Category, Company, DiscountKind, Product, ProductDiscount, Supplier,
};
use procurement_engine::domain::entities::rfq::RfqItemSpec;
use procurement_engine::domain::value_objects::{ItemDiscount, Price, Quantity, RfqType};
use procurement_engine::infrastructure::persistence::{EventStore, postgres};
use procurement_engine::infrastructure::reference_data::InMemoryReferenceData;
use procurement_engine::telemetry;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

/// Procurement demo CLI
#[derive(Debug, Parser)]
#[command(name = "procurement-demo")]
#[command(about = "Runs one RFQ from publication to refund", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "PROCUREMENT_CONFIG")]
    config: Option<String>,
}

fn seed_catalog() -> anyhow::Result<InMemoryReferenceData> {
    Ok(InMemoryReferenceData::new()
        .with_company(Company::new("acme", "Acme Corp"))
        .with_supplier(Supplier::new("globex", "Globex"))
        .with_supplier(Supplier::new("initech", "Initech"))
        .with_category(Category::new("office", "Office supplies"))
        .with_product(Product::new("globex-pen", "globex", "office", "Ballpoint pen, blue"))
        .with_product(Product::new("initech-pen", "initech", "office", "Gel pen, blue"))
        .with_discount(ProductDiscount::new(
            "globex-bulk-500",
            "globex-pen",
            DiscountKind::Percentage,
            Decimal::new(5, 0),
            Decimal::new(500, 0),
        )?))
}

fn money(value: &str) -> anyhow::Result<Price> {
    value.parse().with_context(|| format!("invalid amount {value}"))
}

async fn build_engine(
    config: &EngineConfig,
    catalog: Arc<InMemoryReferenceData>,
) -> anyhow::Result<ProcurementEngine> {
    if config.database.url.is_none() {
        info!("no database configured, running in memory");
        return Ok(ProcurementEngine::in_memory(config, catalog));
    }
    let pool = postgres::connect(&config.database).await?;
    postgres::run_migrations(&pool).await?;
    Ok(ProcurementEngine::postgres(config, &pool, catalog))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = EngineConfig::load(cli.config.as_deref()).context("loading configuration")?;
    telemetry::init_tracing(&config.logging).context("installing tracing subscriber")?;

    let catalog = Arc::new(seed_catalog()?);
    let engine = build_engine(&config, catalog).await?;

    // Company side: an invitation-only RFQ for 1000 pens.
    let rfq = engine
        .rfqs()
        .create(
            NewRfq::new("acme", "Pens for Q3")
                .description("Blue ballpoint or gel pens")
                .rfq_type(RfqType::Invited),
        )
        .await?;
    let pens = engine
        .rfqs()
        .add_item(
            rfq.id(),
            RfqItemSpec::new("office", Quantity::from_units(1_000)?, "piece")
                .with_target_price(money("0.50")?),
        )
        .await?;
    engine.rfqs().publish(rfq.id()).await?;
    engine
        .rfqs()
        .invite_bulk(rfq.id(), vec!["globex".into(), "initech".into()])
        .await?;

    // Supplier side: two competing quotations.
    let globex = engine
        .quotations()
        .create(
            rfq.id(),
            "globex".into(),
            NewQuotation::new().notes("Ships in 5 days").item(
                QuotationItemSpec::new(pens, money("0.48")?, Quantity::from_units(1_000)?)
                    .with_product("globex-pen"),
            ),
        )
        .await?;
    engine.quotations().submit(globex.id()).await?;

    let initech = engine
        .quotations()
        .create(
            rfq.id(),
            "initech".into(),
            NewQuotation::new().item(
                QuotationItemSpec::new(pens, money("0.50")?, Quantity::from_units(1_000)?)
                    .with_product("initech-pen")
                    .with_discount(ItemDiscount::percentage(Decimal::new(2, 0))?),
            ),
        )
        .await?;
    engine.quotations().submit(initech.id()).await?;

    // Company side: compare, review and accept the best offer.
    let table = engine.comparison().compare(rfq.id()).await?;
    for ranked in &table.quotations {
        info!(%ranked, "ranked quotation");
    }
    let best = table.best().context("no quotation to accept")?;
    engine.quotations().begin_review(best.quotation_id).await?;
    let (accepted, payment) = engine.quotations().accept(best.quotation_id).await?;
    info!(
        quotation_id = %accepted.id(),
        supplier_id = %accepted.supplier_id(),
        amount = %payment.amount(),
        "order placed"
    );
    engine.rfqs().close(rfq.id()).await?;

    // Settlement.
    engine.payments().mark_processing(payment.id(), "txn-demo-001").await?;
    engine.payments().confirm(payment.id(), "txn-demo-001").await?;
    let refunded = engine
        .payments()
        .refund(payment.id(), money("45.60")?, "one box arrived damaged")
        .await?;
    info!(status = %refunded.status(), refund = ?refunded.refund_amount(), "payment settled");

    info!(events = engine.events().count().await?, "demo finished");
    Ok(())
}
