//! Inbound engine-event dispatch with cancellation support.
//!
//! A subscription pairs a named engine event on one chart with a host
//! listener, backed by exactly one callback slot. The engine delivers an
//! opaque event handle; the listener may cancel that occurrence's built-in
//! native handling once. Unsubscription tears down both the engine-side
//! binding and the slot, so no dangling slot survives.

use crate::abi::AbiValue;
use crate::bridge::Bridge;
use crate::error::InteropError;
use crate::handle::{ChartHandle, EventHandle};
use crate::slot::{SlotId, SlotResponse};

/// One delivered event occurrence, valid only inside the listener's
/// invocation window.
#[derive(Debug)]
pub struct EventDetail {
    handle: EventHandle,
    prevented: bool,
}

impl EventDetail {
    pub fn handle(&self) -> EventHandle {
        self.handle
    }

    /// Cancel this occurrence's default native handling. Honored at most
    /// once per delivery; later occurrences of the same event are
    /// unaffected.
    pub fn prevent_default(&mut self) {
        self.prevented = true;
    }

    pub fn is_prevented(&self) -> bool {
        self.prevented
    }
}

pub type EventListener = Box<dyn FnMut(&mut EventDetail)>;

/// Token identifying one live subscription.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SubscriptionId(u32);

#[derive(Debug)]
struct SubEntry {
    id: SubscriptionId,
    chart: ChartHandle,
    name: String,
    slot: SlotId,
}

/// Registry of named-event subscriptions across charts.
#[derive(Default)]
pub struct EventDispatch {
    subs: Vec<SubEntry>,
    next: u32,
}

impl EventDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a listener to a named engine event on one chart. Registers
    /// the backing callback slot and binds it engine-side.
    pub fn subscribe(
        &mut self,
        bridge: &mut Bridge,
        chart: ChartHandle,
        name: &str,
        mut listener: EventListener,
    ) -> Result<SubscriptionId, InteropError> {
        let slot = bridge.register_callback(
            Box::new(move |args| {
                let Some(AbiValue::Ptr(ptr)) = args.first() else {
                    // Delivery without an event handle carries nothing to
                    // cancel; still a listener invocation.
                    return SlotResponse::default();
                };
                let mut detail = EventDetail {
                    handle: EventHandle(*ptr),
                    prevented: false,
                };
                listener(&mut detail);
                SlotResponse {
                    prevent_default: detail.prevented.then_some(*ptr),
                }
            }),
            "vp",
        )?;
        if let Err(e) = bridge.add_event_listener(chart, name, slot) {
            // Binding failed: do not leak the slot.
            let _ = bridge.unregister_callback(slot);
            return Err(e);
        }
        let id = SubscriptionId(self.next);
        self.next = self.next.wrapping_add(1);
        self.subs.push(SubEntry {
            id,
            chart,
            name: name.to_owned(),
            slot,
        });
        log::debug!("subscribed to '{name}' (sub {})", id.0);
        Ok(id)
    }

    /// Remove one subscription: unbinds engine-side and unregisters the
    /// backing slot.
    pub fn unsubscribe(
        &mut self,
        bridge: &mut Bridge,
        id: SubscriptionId,
    ) -> Result<(), InteropError> {
        let pos = self
            .subs
            .iter()
            .position(|s| s.id == id)
            .ok_or(InteropError::UnknownSubscription { id: id.0 })?;
        let entry = self.subs.remove(pos);
        bridge.remove_event_listener(entry.chart, &entry.name, entry.slot)?;
        bridge.unregister_callback(entry.slot)
    }

    /// Tear down every subscription owned by a chart. Called before the
    /// chart handle is released; the engine-side bindings die with the
    /// chart, so only the slots need unregistering after that point — but
    /// while the chart is live both sides are removed.
    pub fn release_chart(
        &mut self,
        bridge: &mut Bridge,
        chart: ChartHandle,
    ) -> Result<(), InteropError> {
        let mut i = 0;
        while i < self.subs.len() {
            if self.subs[i].chart == chart {
                let entry = self.subs.remove(i);
                bridge.remove_event_listener(entry.chart, &entry.name, entry.slot)?;
                bridge.unregister_callback(entry.slot)?;
            } else {
                i += 1;
            }
        }
        Ok(())
    }

    pub fn subscription_count(&self) -> usize {
        self.subs.len()
    }
}
