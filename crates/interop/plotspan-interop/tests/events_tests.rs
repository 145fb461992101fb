use std::cell::Cell as StdCell;
use std::rc::Rc;

use plotspan_interop::abi::{AbiValue, RawPtr};
use plotspan_interop::{Chart, InteropError, SlotId};
use plotspan_test_fixtures::{Call, MockEngine};

fn chart() -> (MockEngine, Chart) {
    let engine = MockEngine::new();
    let chart = Chart::new(engine.boxed()).unwrap();
    (engine, chart)
}

fn bound_slot(engine: &MockEngine, name: &str) -> SlotId {
    let listeners = engine.listeners();
    let (_, _, slot) = listeners
        .iter()
        .find(|(_, n, _)| n == name)
        .expect("listener should be bound engine-side");
    SlotId(*slot)
}

#[test]
fn subscribe_binds_listener_and_delivers_events() {
    let (engine, mut chart) = chart();
    let seen = Rc::new(StdCell::new(0));
    let seen2 = seen.clone();
    chart
        .on(
            "plot-axis-label-draw",
            Box::new(move |_detail| seen2.set(seen2.get() + 1)),
        )
        .unwrap();

    let slot = bound_slot(&engine, "plot-axis-label-draw");
    chart
        .bridge_mut()
        .invoke_slot(slot, &[AbiValue::Ptr(RawPtr(0x77))])
        .unwrap();
    chart
        .bridge_mut()
        .invoke_slot(slot, &[AbiValue::Ptr(RawPtr(0x78))])
        .unwrap();
    assert_eq!(seen.get(), 2);
}

#[test]
fn prevent_default_suppresses_one_occurrence_only() {
    let (engine, mut chart) = chart();
    let first = Rc::new(StdCell::new(true));
    let first2 = first.clone();
    chart
        .on(
            "plot-axis-label-draw",
            Box::new(move |detail| {
                if first2.get() {
                    detail.prevent_default();
                    first2.set(false);
                }
            }),
        )
        .unwrap();
    let slot = bound_slot(&engine, "plot-axis-label-draw");

    chart
        .bridge_mut()
        .invoke_slot(slot, &[AbiValue::Ptr(RawPtr(0x77))])
        .unwrap();
    assert_eq!(
        engine.calls_matching(|c| matches!(c, Call::PreventDefault(0x77))).len(),
        1
    );

    // The next occurrence is not affected.
    chart
        .bridge_mut()
        .invoke_slot(slot, &[AbiValue::Ptr(RawPtr(0x78))])
        .unwrap();
    assert_eq!(
        engine.calls_matching(|c| matches!(c, Call::PreventDefault(_))).len(),
        1
    );
}

#[test]
fn unsubscribe_removes_binding_and_backing_slot() {
    let (engine, mut chart) = chart();
    let sub = chart.on("draw-complete", Box::new(|_| {})).unwrap();
    let slot = bound_slot(&engine, "draw-complete");

    chart.off(sub).unwrap();
    assert!(engine.listeners().is_empty());
    assert!(engine
        .calls()
        .iter()
        .any(|c| matches!(c, Call::RemoveEventListener { .. })));

    // The backing slot is gone: a stray delivery is rejected, not forwarded.
    assert!(matches!(
        chart.bridge_mut().invoke_slot(slot, &[AbiValue::Ptr(RawPtr(1))]),
        Err(InteropError::StaleSlot { .. })
    ));
    assert!(matches!(
        chart.off(sub),
        Err(InteropError::UnknownSubscription { .. })
    ));
}

#[test]
fn listeners_on_the_same_event_are_independent() {
    let (engine, mut chart) = chart();
    let a = Rc::new(StdCell::new(0));
    let b = Rc::new(StdCell::new(0));
    let a2 = a.clone();
    let b2 = b.clone();
    chart
        .on("click", Box::new(move |detail| {
            a2.set(a2.get() + 1);
            detail.prevent_default();
        }))
        .unwrap();
    chart
        .on("click", Box::new(move |_| b2.set(b2.get() + 1)))
        .unwrap();

    // Cancelling in one listener does not abort dispatch to the other.
    let listeners = engine.listeners();
    assert_eq!(listeners.len(), 2);
    for (_, _, slot) in &listeners {
        chart
            .bridge_mut()
            .invoke_slot(SlotId(*slot), &[AbiValue::Ptr(RawPtr(0x90))])
            .unwrap();
    }
    assert_eq!(a.get(), 1);
    assert_eq!(b.get(), 1);
}

#[test]
fn closing_the_chart_tears_down_subscriptions_and_handles() {
    let (engine, mut chart) = chart();
    chart.on("click", Box::new(|_| {})).unwrap();
    chart.on("draw-complete", Box::new(|_| {})).unwrap();
    assert_eq!(chart.subscription_count(), 2);

    chart.close().unwrap();
    assert!(engine.listeners().is_empty());
    // Canvas and chart handles each released exactly once.
    assert_eq!(
        engine.calls_matching(|c| matches!(c, Call::ObjectFree(_))).len(),
        2
    );
}
