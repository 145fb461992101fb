//! Typed handles and the ownership-tracking arena behind them.
//!
//! The native engine has no visibility into host object lifetime, so every
//! engine-issued token is tracked here with a liveness flag. Release is
//! explicit and exactly-once: a second release is a hard error rather than a
//! silent no-op, because the native side treats a double free as undefined
//! behavior.

use hashbrown::HashMap;

use crate::abi::RawPtr;
use crate::error::InteropError;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum HandleKind {
    Chart,
    Canvas,
    Snapshot,
    Animation,
}

/// Engine-owned object reference tracked by the bridge.
pub trait EngineObject: Copy {
    fn raw(self) -> RawPtr;
    fn kind() -> HandleKind;
}

macro_rules! handle_type {
    ($(#[$doc:meta])* $name:ident, $kind:ident) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub struct $name(pub(crate) RawPtr);

        impl EngineObject for $name {
            fn raw(self) -> RawPtr {
                self.0
            }
            fn kind() -> HandleKind {
                HandleKind::$kind
            }
        }
    };
}

handle_type!(
    /// A live chart instance inside the engine.
    ChartHandle,
    Chart
);
handle_type!(
    /// A render surface inside the engine.
    CanvasHandle,
    Canvas
);
handle_type!(
    /// A stored chart configuration snapshot.
    SnapshotHandle,
    Snapshot
);
handle_type!(
    /// A stored animation keyframe capture.
    AnimHandle,
    Animation
);

/// An engine-raised event occurrence. Only valid inside the listener's
/// invocation window; never tracked by the registry.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EventHandle(pub(crate) RawPtr);

#[derive(Debug)]
struct Entry {
    kind: HandleKind,
    live: bool,
}

/// Arena mapping raw engine tokens to kind + liveness.
///
/// Released entries are kept (dead) so a double release can be told apart
/// from a token this bridge never issued.
#[derive(Default, Debug)]
pub struct HandleRegistry {
    entries: HashMap<u32, Entry>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, raw: RawPtr, kind: HandleKind) {
        self.entries.insert(raw.0, Entry { kind, live: true });
    }

    pub fn ensure_live(&self, raw: RawPtr) -> Result<(), InteropError> {
        match self.entries.get(&raw.0) {
            Some(e) if e.live => Ok(()),
            Some(_) => Err(InteropError::UseAfterRelease { handle: raw.0 }),
            None => Err(InteropError::UnknownHandle { handle: raw.0 }),
        }
    }

    /// Mark a handle released. Exactly one call per handle succeeds.
    pub fn mark_released(&mut self, raw: RawPtr) -> Result<HandleKind, InteropError> {
        match self.entries.get_mut(&raw.0) {
            Some(e) if e.live => {
                e.live = false;
                Ok(e.kind)
            }
            Some(_) => Err(InteropError::DoubleRelease { handle: raw.0 }),
            None => Err(InteropError::UnknownHandle { handle: raw.0 }),
        }
    }

    pub fn kind_of(&self, raw: RawPtr) -> Option<HandleKind> {
        self.entries.get(&raw.0).map(|e| e.kind)
    }

    pub fn live_count(&self) -> usize {
        self.entries.values().filter(|e| e.live).count()
    }
}
