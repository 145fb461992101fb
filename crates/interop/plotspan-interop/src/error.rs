//! Error taxonomy for the interop layer.
//!
//! Four classes: structural input errors (caught before the native layer),
//! native call failures (decoded via exception translation), lifecycle
//! discipline errors (handle/slot misuse), and precondition errors. None of
//! them is retried or silently patched anywhere in this crate.

use thiserror::Error;

use crate::abi::{type_ids, TypeId};

/// Closed set of native exception kinds.
///
/// The engine signals failure with an opaque exception pointer; the bridge
/// maps its runtime type discriminator onto this enumeration so downstream
/// code matches on a finite set instead of inspecting raw pointers.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NativeErrorKind {
    /// Precondition violated inside the engine (std::logic_error family).
    Logic,
    /// Runtime failure inside the engine (std::runtime_error family).
    Runtime,
    /// Native allocation failure. Fatal: creation entry points never fail
    /// recoverably.
    OutOfMemory,
    /// Discriminator outside the published set.
    Unknown,
}

impl NativeErrorKind {
    pub fn from_discriminator(type_id: TypeId) -> Self {
        match type_id.0 {
            type_ids::LOGIC_ERROR => NativeErrorKind::Logic,
            type_ids::RUNTIME_ERROR => NativeErrorKind::Runtime,
            type_ids::BAD_ALLOC => NativeErrorKind::OutOfMemory,
            _ => NativeErrorKind::Unknown,
        }
    }
}

#[derive(Debug, Error)]
pub enum InteropError {
    // Structural input errors.
    #[error("inconsistent data form: series/records and dimensions/measures are both set")]
    ShapeConflict,
    #[error("data column '{column}' has {len} values, expected {expected}")]
    ColumnLength {
        column: String,
        len: usize,
        expected: usize,
    },

    // Native call failures.
    #[error("native error ({kind:?}): {message}")]
    Native {
        kind: NativeErrorKind,
        message: String,
    },

    // Lifecycle discipline errors.
    #[error("handle {handle:#x} was already released")]
    DoubleRelease { handle: u32 },
    #[error("use of released handle {handle:#x}")]
    UseAfterRelease { handle: u32 },
    #[error("handle {handle:#x} is not tracked by this bridge")]
    UnknownHandle { handle: u32 },
    #[error("callback slot {slot} is not registered (or already unregistered)")]
    StaleSlot { slot: u32 },
    #[error("event subscription {id} is not active")]
    UnknownSubscription { id: u32 },
    #[error("invalid callback signature '{signature}'")]
    BadSignature { signature: String },
    #[error("plugin '{name}' is already registered")]
    DuplicatePlugin { name: String },
    #[error("plugin '{name}' is not registered")]
    UnknownPlugin { name: String },
    #[error("surface {canvas:#x} already has a renderer bound")]
    RendererBound { canvas: u32 },
    #[error("surface {canvas:#x} has no renderer bound")]
    RendererNotBound { canvas: u32 },

    // Precondition errors.
    #[error("component used before initialization: {what}")]
    NotInitialized { what: &'static str },
}
