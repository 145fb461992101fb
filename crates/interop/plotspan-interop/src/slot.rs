//! Callback slot table: host closures exposed to the engine by token.
//!
//! The engine never holds a host function pointer directly. Registration
//! yields a [`SlotId`] the engine can be handed; invocation always resolves
//! through the table, so a call after unregistration surfaces as a tracked
//! error instead of a dangling-pointer jump.

use hashbrown::HashMap;

use crate::abi::{AbiValue, RawPtr};
use crate::error::InteropError;

/// Registration token for a host callback exposed to the engine.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SlotId(pub u32);

/// What the bridge should do after a slot invocation returns.
#[derive(Default, Debug, PartialEq)]
pub struct SlotResponse {
    /// Event handle whose default native handling the listener cancelled.
    pub prevent_default: Option<RawPtr>,
}

pub type SlotFn = Box<dyn FnMut(&[AbiValue]) -> SlotResponse>;

struct SlotEntry {
    func: SlotFn,
    signature: String,
    /// One-shot slots unregister themselves after the first invocation
    /// (animation completion callbacks).
    one_shot: bool,
}

/// Table of registered callback slots, keyed by registration token.
#[derive(Default)]
pub struct SlotTable {
    entries: HashMap<u32, SlotEntry>,
    next: u32,
}

impl SlotTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback under a declared signature string (emscripten
    /// style: return type first, then argument types, from `v i d p`).
    pub fn register(
        &mut self,
        func: SlotFn,
        signature: &str,
        one_shot: bool,
    ) -> Result<SlotId, InteropError> {
        if signature.is_empty() || !signature.chars().all(|c| "vidp".contains(c)) {
            return Err(InteropError::BadSignature {
                signature: signature.to_owned(),
            });
        }
        let id = SlotId(self.next);
        self.next = self.next.wrapping_add(1);
        self.entries.insert(
            id.0,
            SlotEntry {
                func,
                signature: signature.to_owned(),
                one_shot,
            },
        );
        log::trace!("slot {} registered (sig {signature})", id.0);
        Ok(id)
    }

    /// Remove a slot. Every register must be paired with exactly one
    /// unregister; a second unregister is a stale-slot error.
    pub fn unregister(&mut self, slot: SlotId) -> Result<(), InteropError> {
        self.entries
            .remove(&slot.0)
            .map(|_| log::trace!("slot {} unregistered", slot.0))
            .ok_or(InteropError::StaleSlot { slot: slot.0 })
    }

    /// Invoke a slot through the table. Stale tokens are rejected, never
    /// forwarded. Returns the response plus whether the slot was one-shot
    /// and has been removed.
    pub fn invoke(
        &mut self,
        slot: SlotId,
        args: &[AbiValue],
    ) -> Result<SlotResponse, InteropError> {
        let entry = self
            .entries
            .get_mut(&slot.0)
            .ok_or(InteropError::StaleSlot { slot: slot.0 })?;
        let response = (entry.func)(args);
        if entry.one_shot {
            self.entries.remove(&slot.0);
            log::trace!("one-shot slot {} consumed", slot.0);
        }
        Ok(response)
    }

    pub fn signature(&self, slot: SlotId) -> Option<&str> {
        self.entries.get(&slot.0).map(|e| e.signature.as_str())
    }

    pub fn is_registered(&self, slot: SlotId) -> bool {
        self.entries.contains_key(&slot.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_slot_is_never_invoked() {
        let mut table = SlotTable::new();
        let slot = table
            .register(Box::new(|_| SlotResponse::default()), "vi", false)
            .unwrap();
        assert!(table.invoke(slot, &[]).is_ok());
        table.unregister(slot).unwrap();
        assert!(matches!(
            table.invoke(slot, &[]),
            Err(InteropError::StaleSlot { .. })
        ));
        assert!(matches!(
            table.unregister(slot),
            Err(InteropError::StaleSlot { .. })
        ));
    }

    #[test]
    fn one_shot_slot_consumes_itself() {
        let mut table = SlotTable::new();
        let slot = table
            .register(Box::new(|_| SlotResponse::default()), "vi", true)
            .unwrap();
        assert!(table.invoke(slot, &[AbiValue::Bool(true)]).is_ok());
        assert!(!table.is_registered(slot));
    }

    #[test]
    fn signature_alphabet_is_checked() {
        let mut table = SlotTable::new();
        assert!(matches!(
            table.register(Box::new(|_| SlotResponse::default()), "vx", false),
            Err(InteropError::BadSignature { .. })
        ));
    }
}
