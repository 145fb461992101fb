//! plotspan-interop: control layer between the declarative chart-animation
//! API and the native rendering/layout engine.
//!
//! Four concerns live here: the handle/callback bridge to the engine's
//! pointer-based ABI, the ordered plugin hook chain every animation request
//! passes through, pointer/event dispatch in both directions, and the
//! cube → record data-shape normalizer. The engine itself is consumed as an
//! opaque black box behind [`abi::EngineAbi`].
//!
//! The whole layer assumes a single logical thread of control: native
//! re-entry is synchronous, stage order is registration order, and the
//! registries carry no internal locking.

pub mod abi;
pub mod bridge;
pub mod chart;
pub mod data;
pub mod error;
pub mod events;
pub mod handle;
pub mod pipeline;
pub mod pivot;
pub mod pointer;
pub mod render;
pub mod request;
pub mod slot;

// Re-exports for consumers (hosts and plugins)
pub use abi::{AbiResult, AbiValue, EngineAbi, ExceptionPtr, RawPtr, TypeId};
pub use bridge::Bridge;
pub use chart::{flatten_config, Chart, CompletionFn};
pub use data::{unpivot, Cell, DataPayload, Dimension, Measure, Record, Series};
pub use error::{InteropError, NativeErrorKind};
pub use events::{EventDetail, EventDispatch, EventListener, SubscriptionId};
pub use handle::{
    AnimHandle, CanvasHandle, ChartHandle, EngineObject, EventHandle, HandleKind, HandleRegistry,
    SnapshotHandle,
};
pub use pipeline::{hook, ChainOutcome, Continuation, Plugin, PluginRegistry, Stage};
pub use pivot::{PivotData, PIVOT_PLUGIN_NAME};
pub use pointer::{
    PointerEvents, PointerInput, PointerKind, PointerSource, SurfaceTransform, ALL_POINTER_KINDS,
};
pub use render::SurfaceRenderer;
pub use request::{AnimOptions, AnimTarget, AnimationContext, ConfigDelta, TargetKind, Timing};
pub use slot::{SlotFn, SlotId, SlotResponse, SlotTable};
