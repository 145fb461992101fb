//! Native engine ABI: the pointer-based calling convention, by role.
//!
//! The rendering/layout/animation engine is an opaque black box. Everything it
//! hands out is a raw pointer-sized token, everything it takes back is one of
//! those tokens, and failure is signalled through an opaque exception pointer
//! that may only be interpreted via [`EngineAbi::exception_type`] and
//! [`EngineAbi::error_message`]. The [`crate::bridge::Bridge`] is the only
//! caller of this trait.

use crate::data::Cell;
use crate::slot::SlotId;

/// Opaque pointer-sized token issued by the native engine.
///
/// Has no meaning to the host beyond identity; it is only ever passed back to
/// the engine unchanged.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct RawPtr(pub u32);

/// Opaque exception pointer raised by a failed native call.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ExceptionPtr(pub RawPtr);

/// Runtime type discriminator extracted from an exception pointer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TypeId(pub u32);

/// Well-known exception type discriminators published by the engine ABI.
pub mod type_ids {
    pub const LOGIC_ERROR: u32 = 1;
    pub const RUNTIME_ERROR: u32 = 2;
    pub const BAD_ALLOC: u32 = 3;
}

/// Primitive value crossing the callback boundary engine → host.
#[derive(Clone, Debug, PartialEq)]
pub enum AbiValue {
    Ptr(RawPtr),
    I32(i32),
    F64(f64),
    Bool(bool),
}

/// Outcome of one native call: either the result or an exception pointer to
/// be translated by the bridge.
pub type AbiResult<T> = Result<T, ExceptionPtr>;

/// Entry points of the native engine, abstracted by role.
///
/// Pointer-typed arguments and results are opaque [`RawPtr`] tokens passed
/// through unchanged. String arguments are copied into engine-owned memory by
/// the implementation; string results are decoded out of engine-owned memory
/// without transferring ownership. Callbacks are referenced by [`SlotId`]
/// registration tokens, never by raw function pointers.
pub trait EngineAbi {
    // Constructors / destructor.
    fn create_chart(&mut self) -> AbiResult<RawPtr>;
    fn create_canvas(&mut self) -> AbiResult<RawPtr>;
    fn object_free(&mut self, handle: RawPtr) -> AbiResult<()>;

    // Pointer / wheel input forwarding. Coordinates are render-relative.
    fn pointer_down(&mut self, chart: RawPtr, canvas: RawPtr, id: i32, x: f64, y: f64)
        -> AbiResult<()>;
    fn pointer_up(&mut self, chart: RawPtr, canvas: RawPtr, id: i32, x: f64, y: f64)
        -> AbiResult<()>;
    fn pointer_move(&mut self, chart: RawPtr, canvas: RawPtr, id: i32, x: f64, y: f64)
        -> AbiResult<()>;
    fn pointer_leave(&mut self, chart: RawPtr, canvas: RawPtr, id: i32) -> AbiResult<()>;
    fn wheel(&mut self, chart: RawPtr, canvas: RawPtr, delta: f64) -> AbiResult<()>;

    // Chart state snapshots and animation keyframes.
    fn chart_store(&mut self, chart: RawPtr) -> AbiResult<RawPtr>;
    fn chart_restore(&mut self, chart: RawPtr, snapshot: RawPtr) -> AbiResult<()>;
    fn anim_store(&mut self, chart: RawPtr) -> AbiResult<RawPtr>;
    fn anim_restore(&mut self, chart: RawPtr, anim: RawPtr) -> AbiResult<()>;

    // Dotted-path property access; values are string-encoded.
    fn chart_set_value(&mut self, chart: RawPtr, path: &str, value: &str) -> AbiResult<()>;
    fn chart_get_value(&mut self, chart: RawPtr, path: &str) -> AbiResult<String>;
    fn style_set_value(&mut self, chart: RawPtr, path: &str, value: &str) -> AbiResult<()>;
    fn style_get_value(&mut self, chart: RawPtr, path: &str, computed: bool) -> AbiResult<String>;
    fn anim_set_value(&mut self, chart: RawPtr, path: &str, value: &str) -> AbiResult<()>;

    // Data ingestion: column registration and row records.
    fn add_dimension(&mut self, chart: RawPtr, name: &str, categories: &[String]) -> AbiResult<()>;
    fn add_measure(&mut self, chart: RawPtr, name: &str, unit: &str, values: &[f64])
        -> AbiResult<()>;
    fn add_record(&mut self, chart: RawPtr, cells: &[Cell]) -> AbiResult<()>;

    // Animation submission.
    fn set_keyframe(&mut self, chart: RawPtr) -> AbiResult<()>;
    fn animate(&mut self, chart: RawPtr, completion: SlotId) -> AbiResult<()>;

    // Engine-raised named events.
    fn add_event_listener(&mut self, chart: RawPtr, name: &str, callback: SlotId) -> AbiResult<()>;
    fn remove_event_listener(
        &mut self,
        chart: RawPtr,
        name: &str,
        callback: SlotId,
    ) -> AbiResult<()>;
    fn event_prevent_default(&mut self, event: RawPtr) -> AbiResult<()>;

    // Exception introspection: the only sanctioned reads of an exception
    // pointer.
    fn exception_type(&self, exception: ExceptionPtr) -> TypeId;
    fn error_message(&self, exception: ExceptionPtr, type_id: TypeId) -> String;

    // Misc engine surface.
    fn version(&mut self) -> AbiResult<String>;
    fn set_logging(&mut self, enabled: bool) -> AbiResult<()>;
}
