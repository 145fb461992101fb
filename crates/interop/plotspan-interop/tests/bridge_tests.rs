use std::cell::Cell;
use std::rc::Rc;

use plotspan_interop::abi::{type_ids, AbiValue};
use plotspan_interop::slot::SlotResponse;
use plotspan_interop::{Bridge, InteropError, NativeErrorKind, SurfaceRenderer};
use plotspan_test_fixtures::{Call, MockEngine};

fn bridge() -> (MockEngine, Bridge) {
    let engine = MockEngine::new();
    let bridge = Bridge::new(engine.boxed());
    (engine, bridge)
}

#[test]
fn handle_release_is_exactly_once() {
    let (engine, mut bridge) = bridge();
    let chart = bridge.create_chart().unwrap();

    bridge.release(chart).unwrap();
    assert!(engine
        .calls()
        .iter()
        .any(|c| matches!(c, Call::ObjectFree(_))));

    // The second release must never reach the native layer.
    let frees_before = engine.calls_matching(|c| matches!(c, Call::ObjectFree(_))).len();
    assert!(matches!(
        bridge.release(chart),
        Err(InteropError::DoubleRelease { .. })
    ));
    let frees_after = engine.calls_matching(|c| matches!(c, Call::ObjectFree(_))).len();
    assert_eq!(frees_before, frees_after);
}

#[test]
fn released_handle_is_rejected_at_the_boundary() {
    let (engine, mut bridge) = bridge();
    let chart = bridge.create_chart().unwrap();
    let canvas = bridge.create_canvas().unwrap();
    bridge.release(chart).unwrap();

    let before = engine.calls().len();
    assert!(matches!(
        bridge.pointer_move(chart, canvas, 1, 0.0, 0.0),
        Err(InteropError::UseAfterRelease { .. })
    ));
    assert_eq!(engine.calls().len(), before);
}

#[test]
fn callback_slots_pair_register_with_unregister() {
    let (_engine, mut bridge) = bridge();
    let hits = Rc::new(Cell::new(0));
    let hits2 = hits.clone();
    let slot = bridge
        .register_callback(
            Box::new(move |_| {
                hits2.set(hits2.get() + 1);
                SlotResponse::default()
            }),
            "vi",
        )
        .unwrap();

    bridge.invoke_slot(slot, &[AbiValue::I32(1)]).unwrap();
    assert_eq!(hits.get(), 1);

    bridge.unregister_callback(slot).unwrap();
    assert!(matches!(
        bridge.invoke_slot(slot, &[]),
        Err(InteropError::StaleSlot { .. })
    ));
    // No invocation happened after the unregister.
    assert_eq!(hits.get(), 1);
    assert!(matches!(
        bridge.unregister_callback(slot),
        Err(InteropError::StaleSlot { .. })
    ));
}

#[test]
fn completion_slots_are_one_shot() {
    let (_engine, mut bridge) = bridge();
    let done = Rc::new(Cell::new(false));
    let done2 = done.clone();
    let slot = bridge
        .register_completion(Box::new(move |ok| done2.set(ok)))
        .unwrap();

    bridge.invoke_slot(slot, &[AbiValue::Bool(true)]).unwrap();
    assert!(done.get());
    assert!(!bridge.slot_registered(slot));
}

#[test]
fn native_failure_translates_through_exception_introspection() {
    let (engine, mut bridge) = bridge();
    let chart = bridge.create_chart().unwrap();

    engine.fail_next(type_ids::RUNTIME_ERROR, "invalid channel");
    match bridge.set_value(chart, "channels.x.set", "Year") {
        Err(InteropError::Native { kind, message }) => {
            assert_eq!(kind, NativeErrorKind::Runtime);
            assert_eq!(message, "invalid channel");
        }
        other => panic!("expected native error, got {other:?}"),
    }

    engine.fail_next(type_ids::BAD_ALLOC, "out of memory");
    match bridge.create_chart() {
        Err(InteropError::Native { kind, .. }) => {
            assert_eq!(kind, NativeErrorKind::OutOfMemory)
        }
        other => panic!("expected fatal allocation error, got {other:?}"),
    }
}

#[test]
fn unknown_discriminator_maps_to_unknown_kind() {
    let (engine, mut bridge) = bridge();
    let chart = bridge.create_chart().unwrap();
    engine.fail_next(77, "weird");
    match bridge.set_keyframe(chart) {
        Err(InteropError::Native { kind, .. }) => assert_eq!(kind, NativeErrorKind::Unknown),
        other => panic!("expected native error, got {other:?}"),
    }
}

#[test]
fn snapshots_and_keyframes_round_trip_handles() {
    let (engine, mut bridge) = bridge();
    let chart = bridge.create_chart().unwrap();

    let snapshot = bridge.store_state(chart).unwrap();
    bridge.restore_state(chart, snapshot).unwrap();
    assert!(engine
        .calls()
        .iter()
        .any(|c| matches!(c, Call::ChartRestore { .. })));

    let anim = bridge.store_keyframe(chart).unwrap();
    bridge.restore_keyframe(chart, anim).unwrap();
    assert!(engine
        .calls()
        .iter()
        .any(|c| matches!(c, Call::AnimRestore { .. })));

    // Snapshots are handles too: released exactly once.
    bridge.release(snapshot).unwrap();
    assert!(matches!(
        bridge.restore_state(chart, snapshot),
        Err(InteropError::UseAfterRelease { .. })
    ));
}

struct NullRenderer;
impl SurfaceRenderer for NullRenderer {}

#[test]
fn renderer_registry_holds_one_renderer_per_surface() {
    let (_engine, mut bridge) = bridge();
    let canvas = bridge.create_canvas().unwrap();

    bridge.attach_renderer(canvas, Box::new(NullRenderer)).unwrap();
    assert!(matches!(
        bridge.attach_renderer(canvas, Box::new(NullRenderer)),
        Err(InteropError::RendererBound { .. })
    ));

    bridge.detach_renderer(canvas).unwrap();
    assert!(matches!(
        bridge.detach_renderer(canvas),
        Err(InteropError::RendererNotBound { .. })
    ));
}

#[test]
fn releasing_a_surface_drops_its_renderer_registration() {
    let (_engine, mut bridge) = bridge();
    let canvas = bridge.create_canvas().unwrap();
    bridge.attach_renderer(canvas, Box::new(NullRenderer)).unwrap();

    bridge.release(canvas).unwrap();
    assert!(matches!(
        bridge.renderer_mut(canvas),
        Err(InteropError::RendererNotBound { .. })
    ));
}

#[test]
fn misc_entry_points_pass_through() {
    let (engine, mut bridge) = bridge();
    assert_eq!(bridge.version().unwrap(), "0.1.0-mock");
    bridge.set_logging(true).unwrap();
    assert!(engine.calls().contains(&Call::SetLogging(true)));
}
