//! Benchmarks for the validation engine
//!
//! Cover metadata construction, flat bean validation and cascading through
//! larger object graphs.
//!
//! Copyright (c) 2025 Stipulate Team
//! Licensed under the Apache-2.0 license

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use stipulate_core::metadata::ContainerElementDeclaration;
use stipulate_core::{
    Bean, ConstraintDeclaration, Declarations, DynamicBean, PropertyDeclaration, TypeDeclaration, ValidatorFactory,
    Value,
};

fn declarations() -> Declarations {
    Declarations::new()
        .with_type(
            TypeDeclaration::new("Order")
                .property(
                    PropertyDeclaration::new("reference")
                        .constraint(ConstraintDeclaration::not_blank())
                        .constraint(ConstraintDeclaration::pattern("[A-Z]{3}-[0-9]{4}")),
                )
                .property(
                    PropertyDeclaration::new("lines")
                        .declared_type("List")
                        .container_element(ContainerElementDeclaration::new(0).element_type("Line").valid()),
                ),
        )
        .with_type(
            TypeDeclaration::new("Line")
                .property(PropertyDeclaration::new("sku").constraint(ConstraintDeclaration::size(4, 12)))
                .property(
                    PropertyDeclaration::new("quantity")
                        .constraint(ConstraintDeclaration::min(1))
                        .constraint(ConstraintDeclaration::max(100)),
                ),
        )
}

fn order(lines: usize) -> Arc<dyn Bean> {
    let lines = (0..lines)
        .map(|i| {
            Value::Bean(
                DynamicBean::new("Line")
                    .with("sku", format!("SKU-{}", i))
                    .with("quantity", (i % 120) as i64)
                    .into_arc(),
            )
        })
        .collect();
    DynamicBean::new("Order")
        .with("reference", "ABC-1234")
        .with("lines", Value::List(lines))
        .into_arc()
}

fn bench_metadata(c: &mut Criterion) {
    let mut group = c.benchmark_group("metadata");

    group.bench_function("build_cold", |b| {
        let factory = ValidatorFactory::new(Arc::new(declarations()));
        b.iter(|| {
            factory.clear_metadata();
            black_box(factory.bean_metadata("Order").unwrap())
        })
    });

    group.bench_function("lookup_cached", |b| {
        let factory = ValidatorFactory::new(Arc::new(declarations()));
        factory.bean_metadata("Order").unwrap();
        b.iter(|| black_box(factory.bean_metadata("Order").unwrap()))
    });

    group.finish();
}

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation");
    let factory = ValidatorFactory::new(Arc::new(declarations()));
    let validator = factory.validator();

    for lines in [1, 10, 100, 1000] {
        let bean = order(lines);
        group.bench_with_input(BenchmarkId::new("graph", lines), &bean, |b, bean| {
            b.iter(|| black_box(validator.validate(bean, &[]).unwrap()))
        });
    }

    let bean = order(100);
    group.bench_function("fail_fast", |b| {
        let fail_fast = validator.clone().with_fail_fast(true);
        b.iter(|| black_box(fail_fast.validate(&bean, &[]).unwrap()))
    });

    group.bench_function("validate_value", |b| {
        b.iter(|| {
            black_box(
                validator
                    .validate_value("Order", "lines[3].quantity", Value::Int(0), &[])
                    .unwrap(),
            )
        })
    });

    group.finish();
}

criterion_group!(benches, bench_metadata, bench_validation);
criterion_main!(benches);
