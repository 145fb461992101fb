use criterion::{black_box, criterion_group, criterion_main, Criterion};

use plotspan_interop::{
    hook, unpivot, AnimTarget, AnimationContext, ConfigDelta, DataPayload, Dimension, Measure,
    PivotData, PluginRegistry, Stage,
};

fn cube(rows: usize) -> DataPayload {
    DataPayload {
        dimensions: Some(vec![Dimension {
            name: "Year".into(),
            categories: (0..rows).map(|i| (2000 + i).to_string()).collect(),
        }]),
        measures: Some(vec![Measure {
            name: "Sales".into(),
            unit: None,
            values: (0..rows).map(|i| i as f64).collect(),
        }]),
        ..DataPayload::default()
    }
}

fn bench_unpivot(c: &mut Criterion) {
    let payload = cube(1000);
    c.bench_function("unpivot_1000_rows", |b| {
        b.iter(|| unpivot(black_box(&payload)).unwrap())
    });
}

fn bench_hook_chain(c: &mut Criterion) {
    let mut registry = PluginRegistry::new();
    registry.register(Box::new(PivotData)).unwrap();
    for i in 0..8 {
        registry
            .register(Box::new(hook(
                format!("noop{i}"),
                Stage::PrepareAnimation,
                |_, cont| {
                    cont.proceed();
                    Ok(())
                },
            )))
            .unwrap();
    }
    c.bench_function("prepare_stage_8_hooks", |b| {
        b.iter(|| {
            let mut ctx = AnimationContext::single(AnimTarget::config(ConfigDelta {
                data: Some(cube(16)),
                ..ConfigDelta::default()
            }));
            registry
                .run_stage(Stage::PrepareAnimation, black_box(&mut ctx))
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_unpivot, bench_hook_chain);
criterion_main!(benches);
