//! Comparison engine benchmarks.

#![allow(clippy::unwrap_used, missing_docs)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use procurement_engine::application::services::{ComparisonEngine, LowestTotalStrategy};
use procurement_engine::domain::entities::quotation::{Quotation, QuotationItemSpec};
use procurement_engine::domain::entities::rfq::{Rfq, RfqItemSpec};
use procurement_engine::domain::services::PricingCalculator;
use procurement_engine::domain::value_objects::{CompanyId, Price, Quantity, RfqType, SupplierId};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::hint::black_box;

fn rfq_with_items(items: usize) -> Rfq {
    let mut rfq = Rfq::new(CompanyId::new("acme"), "Bench", "", RfqType::Open, None).unwrap();
    for _ in 0..items {
        rfq.add_item(RfqItemSpec::new("office", Quantity::from_units(100).unwrap(), "box"))
            .unwrap();
    }
    rfq.publish().unwrap();
    rfq
}

fn submitted_quotations(rfq: &Rfq, suppliers: usize) -> Vec<Quotation> {
    let calc = PricingCalculator::default();
    (0..suppliers)
        .map(|s| {
            let mut q = Quotation::start(rfq, SupplierId::new(format!("s-{s}")), "").unwrap();
            for (i, item) in rfq.items().iter().enumerate() {
                let cents = 1_000 + i64::try_from((s * 37 + i * 11) % 500).unwrap();
                let spec = QuotationItemSpec::new(
                    item.id(),
                    Price::new(Decimal::new(cents, 2)).unwrap(),
                    item.quantity(),
                );
                q.add_item(rfq, spec, None, &calc, &[]).unwrap();
            }
            q.submit(rfq, &calc, &HashMap::new()).unwrap();
            q
        })
        .collect()
}

fn build_table_benchmark(c: &mut Criterion) {
    let calc = PricingCalculator::default();
    let strategy = LowestTotalStrategy::new();
    let mut group = c.benchmark_group("comparison_build_table");

    for (suppliers, items) in [(5, 10), (20, 25), (50, 50)] {
        let rfq = rfq_with_items(items);
        let quotations = submitted_quotations(&rfq, suppliers);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{suppliers}x{items}")),
            &quotations,
            |b, quotations| {
                b.iter(|| {
                    ComparisonEngine::build_table(
                        black_box(&calc),
                        &strategy,
                        black_box(&rfq),
                        black_box(quotations),
                    )
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, build_table_benchmark);
criterion_main!(benches);
