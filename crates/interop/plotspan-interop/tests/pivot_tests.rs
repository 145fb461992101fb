use plotspan_interop::{
    AnimTarget, AnimationContext, Cell, ChainOutcome, ConfigDelta, DataPayload, Dimension,
    InteropError, Measure, PivotData, PluginRegistry, Stage, TargetKind,
};
use plotspan_test_fixtures::{conflicting_payload, cube_payload, records_payload, MockEngine};

fn registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    registry.register(Box::new(PivotData)).unwrap();
    registry
}

fn data_of(ctx: &AnimationContext, i: usize) -> &DataPayload {
    match &ctx.targets[i].target {
        TargetKind::Config(delta) => delta.data.as_ref().unwrap(),
        TargetKind::Snapshot(_) => panic!("expected config target"),
    }
}

fn ctx_with(data: DataPayload) -> AnimationContext {
    AnimationContext::single(AnimTarget::config(ConfigDelta {
        data: Some(data),
        ..ConfigDelta::default()
    }))
}

#[test]
fn cube_payload_unpivots_to_records() {
    let mut registry = registry();
    let mut ctx = ctx_with(cube_payload());

    let outcome = registry.run_stage(Stage::PrepareAnimation, &mut ctx).unwrap();
    assert_eq!(outcome, ChainOutcome::Completed);

    let data = data_of(&ctx, 0);
    assert!(data.dimensions.is_none());
    assert!(data.measures.is_none());
    let records = data.records.as_ref().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["Year"], Cell::Text("2020".into()));
    assert_eq!(records[0]["Sales"], Cell::Number(10.0));
    assert_eq!(records[1]["Year"], Cell::Text("2021".into()));
    assert_eq!(records[1]["Sales"], Cell::Number(20.0));
}

#[test]
fn normalization_is_idempotent() {
    let mut registry = registry();
    let mut ctx = ctx_with(cube_payload());
    registry.run_stage(Stage::PrepareAnimation, &mut ctx).unwrap();
    let once = data_of(&ctx, 0).clone();

    registry.run_stage(Stage::PrepareAnimation, &mut ctx).unwrap();
    assert_eq!(data_of(&ctx, 0), &once);

    // A payload that is already record-shaped passes through untouched.
    let mut ctx = ctx_with(records_payload());
    registry.run_stage(Stage::PrepareAnimation, &mut ctx).unwrap();
    assert_eq!(data_of(&ctx, 0), &records_payload());
}

#[test]
fn conflicting_shapes_are_rejected_without_rewrite() {
    let mut registry = registry();
    let mut ctx = ctx_with(conflicting_payload());

    assert!(matches!(
        registry.run_stage(Stage::PrepareAnimation, &mut ctx),
        Err(InteropError::ShapeConflict)
    ));
    // No partial rewrite: both marker sets are still present.
    let data = data_of(&ctx, 0);
    assert!(data.is_cube());
    assert!(data.is_set());
}

#[test]
fn unequal_column_lengths_are_fatal() {
    let mut registry = registry();
    let mut ctx = ctx_with(DataPayload {
        dimensions: Some(vec![Dimension {
            name: "Year".into(),
            categories: vec!["2020".into(), "2021".into(), "2022".into()],
        }]),
        measures: Some(vec![Measure {
            name: "Sales".into(),
            unit: None,
            values: vec![10.0, 20.0],
        }]),
        ..DataPayload::default()
    });

    match registry.run_stage(Stage::PrepareAnimation, &mut ctx) {
        Err(InteropError::ColumnLength {
            column,
            len,
            expected,
        }) => {
            assert_eq!(column, "Sales");
            assert_eq!(len, 2);
            assert_eq!(expected, 3);
        }
        other => panic!("expected column length error, got {other:?}"),
    }
}

#[test]
fn every_target_of_a_multi_phase_request_is_normalized() {
    let mut registry = registry();
    let mut ctx = AnimationContext::phases(vec![
        AnimTarget::config(ConfigDelta {
            data: Some(cube_payload()),
            ..ConfigDelta::default()
        }),
        AnimTarget::config(ConfigDelta::default()),
        AnimTarget::config(ConfigDelta {
            data: Some(cube_payload()),
            ..ConfigDelta::default()
        }),
    ]);

    registry.run_stage(Stage::PrepareAnimation, &mut ctx).unwrap();
    assert!(data_of(&ctx, 0).records.is_some());
    assert!(data_of(&ctx, 2).records.is_some());
}

#[test]
fn snapshot_targets_are_skipped() {
    use plotspan_interop::Bridge;

    let engine = MockEngine::new();
    let mut bridge = Bridge::new(engine.boxed());
    let chart = bridge.create_chart().unwrap();
    let snapshot = bridge.store_state(chart).unwrap();

    let mut registry = registry();
    let mut ctx = AnimationContext::phases(vec![
        AnimTarget::snapshot(snapshot),
        AnimTarget::config(ConfigDelta {
            data: Some(cube_payload()),
            ..ConfigDelta::default()
        }),
    ]);
    let outcome = registry.run_stage(Stage::PrepareAnimation, &mut ctx).unwrap();
    assert_eq!(outcome, ChainOutcome::Completed);
    assert!(data_of(&ctx, 1).records.is_some());
}
