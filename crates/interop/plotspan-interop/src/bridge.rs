//! The bridge: single point of contact with the native engine.
//!
//! Owns the engine, the handle liveness arena, the callback slot table and
//! the render-surface registry. Every native call goes through a typed
//! wrapper here that (a) checks handle liveness first, (b) lifts an opaque
//! exception pointer into a typed [`InteropError`] via the sanctioned
//! introspection path, and (c) never retries.

use hashbrown::HashMap;

use crate::abi::{AbiResult, AbiValue, EngineAbi, ExceptionPtr, RawPtr};
use crate::data::{Cell, Record};
use crate::error::{InteropError, NativeErrorKind};
use crate::handle::{
    AnimHandle, CanvasHandle, ChartHandle, EngineObject, HandleKind, HandleRegistry,
    SnapshotHandle,
};
use crate::render::SurfaceRenderer;
use crate::slot::{SlotFn, SlotId, SlotResponse, SlotTable};

/// Lift an engine call result, translating an exception pointer. Split into
/// a macro so the engine borrow ends before translation needs `&self`.
macro_rules! native {
    ($self:ident, $call:expr) => {{
        let res: AbiResult<_> = $call;
        $self.lift(res)
    }};
}

pub struct Bridge {
    engine: Box<dyn EngineAbi>,
    handles: HandleRegistry,
    slots: SlotTable,
    renderers: HashMap<u32, Box<dyn SurfaceRenderer>>,
}

impl Bridge {
    pub fn new(engine: Box<dyn EngineAbi>) -> Self {
        Self {
            engine,
            handles: HandleRegistry::new(),
            slots: SlotTable::new(),
            renderers: HashMap::new(),
        }
    }

    fn lift<T>(&self, res: AbiResult<T>) -> Result<T, InteropError> {
        res.map_err(|ex| self.translate_exception(ex))
    }

    /// Decode a native failure signal. Extracts the runtime type
    /// discriminator, maps it onto the closed [`NativeErrorKind`] set and
    /// retrieves the human-readable message. This is the only sanctioned
    /// interpretation of an exception pointer.
    pub fn translate_exception(&self, exception: ExceptionPtr) -> InteropError {
        let type_id = self.engine.exception_type(exception);
        let kind = NativeErrorKind::from_discriminator(type_id);
        let message = self.engine.error_message(exception, type_id);
        InteropError::Native { kind, message }
    }

    fn live<H: EngineObject>(&self, handle: H) -> Result<RawPtr, InteropError> {
        let raw = handle.raw();
        self.handles.ensure_live(raw)?;
        Ok(raw)
    }

    // ---- object lifecycle -------------------------------------------------

    /// Request a new chart instance. Resource exhaustion surfaces as a
    /// fatal native error, never masked.
    pub fn create_chart(&mut self) -> Result<ChartHandle, InteropError> {
        let raw = native!(self, self.engine.create_chart())?;
        self.handles.track(raw, HandleKind::Chart);
        log::debug!("chart {:#x} created", raw.0);
        Ok(ChartHandle(raw))
    }

    pub fn create_canvas(&mut self) -> Result<CanvasHandle, InteropError> {
        let raw = native!(self, self.engine.create_canvas())?;
        self.handles.track(raw, HandleKind::Canvas);
        log::debug!("canvas {:#x} created", raw.0);
        Ok(CanvasHandle(raw))
    }

    /// Release an engine-owned object. Exactly one release per handle
    /// succeeds; a second release is a [`InteropError::DoubleRelease`] hard
    /// error (the native side gives no such guarantee, so the host tracks
    /// it). Releasing a canvas also drops its renderer registration.
    pub fn release<H: EngineObject>(&mut self, handle: H) -> Result<(), InteropError> {
        let raw = handle.raw();
        let kind = self.handles.mark_released(raw)?;
        if kind == HandleKind::Canvas {
            self.renderers.remove(&raw.0);
        }
        log::debug!("{kind:?} handle {:#x} released", raw.0);
        native!(self, self.engine.object_free(raw))
    }

    // ---- callback slots ---------------------------------------------------

    /// Expose a host callback to the engine under a declared signature.
    /// Must be paired with exactly one [`Bridge::unregister_callback`].
    pub fn register_callback(
        &mut self,
        func: SlotFn,
        signature: &str,
    ) -> Result<SlotId, InteropError> {
        self.slots.register(func, signature, false)
    }

    /// Register a one-shot completion callback (unregisters itself after its
    /// first invocation). The engine calls it with a single bool: whether
    /// the animation ran to completion.
    pub fn register_completion(
        &mut self,
        func: Box<dyn FnOnce(bool)>,
    ) -> Result<SlotId, InteropError> {
        let mut func = Some(func);
        self.slots.register(
            Box::new(move |args| {
                let ok = matches!(args.first(), Some(AbiValue::Bool(true)));
                if let Some(f) = func.take() {
                    f(ok);
                }
                SlotResponse::default()
            }),
            "vi",
            true,
        )
    }

    pub fn unregister_callback(&mut self, slot: SlotId) -> Result<(), InteropError> {
        self.slots.unregister(slot)
    }

    /// Entry point for engine-initiated callback invocation. Resolves the
    /// slot through the table (stale tokens rejected) and honors at most one
    /// prevent-default per delivery, forwarded before control returns to the
    /// engine.
    pub fn invoke_slot(&mut self, slot: SlotId, args: &[AbiValue]) -> Result<(), InteropError> {
        let response = self.slots.invoke(slot, args)?;
        if let Some(event) = response.prevent_default {
            native!(self, self.engine.event_prevent_default(event))?;
        }
        Ok(())
    }

    pub fn slot_registered(&self, slot: SlotId) -> bool {
        self.slots.is_registered(slot)
    }

    // ---- render surface registry ------------------------------------------

    /// Bind the renderer servicing drawing primitives for a surface. At most
    /// one renderer per surface; rebinding without detaching first is a
    /// caller error.
    pub fn attach_renderer(
        &mut self,
        canvas: CanvasHandle,
        renderer: Box<dyn SurfaceRenderer>,
    ) -> Result<(), InteropError> {
        let raw = self.live(canvas)?;
        if self.renderers.contains_key(&raw.0) {
            return Err(InteropError::RendererBound { canvas: raw.0 });
        }
        self.renderers.insert(raw.0, renderer);
        Ok(())
    }

    pub fn detach_renderer(
        &mut self,
        canvas: CanvasHandle,
    ) -> Result<Box<dyn SurfaceRenderer>, InteropError> {
        let raw = canvas.raw();
        self.renderers
            .remove(&raw.0)
            .ok_or(InteropError::RendererNotBound { canvas: raw.0 })
    }

    pub fn renderer_mut(
        &mut self,
        canvas: CanvasHandle,
    ) -> Result<&mut (dyn SurfaceRenderer + 'static), InteropError> {
        let raw = canvas.raw();
        self.renderers
            .get_mut(&raw.0)
            .map(|r| r.as_mut())
            .ok_or(InteropError::RendererNotBound { canvas: raw.0 })
    }

    // ---- pointer / wheel forwarding ---------------------------------------

    pub fn pointer_down(
        &mut self,
        chart: ChartHandle,
        canvas: CanvasHandle,
        id: i32,
        x: f64,
        y: f64,
    ) -> Result<(), InteropError> {
        let (c, s) = (self.live(chart)?, self.live(canvas)?);
        native!(self, self.engine.pointer_down(c, s, id, x, y))
    }

    pub fn pointer_up(
        &mut self,
        chart: ChartHandle,
        canvas: CanvasHandle,
        id: i32,
        x: f64,
        y: f64,
    ) -> Result<(), InteropError> {
        let (c, s) = (self.live(chart)?, self.live(canvas)?);
        native!(self, self.engine.pointer_up(c, s, id, x, y))
    }

    pub fn pointer_move(
        &mut self,
        chart: ChartHandle,
        canvas: CanvasHandle,
        id: i32,
        x: f64,
        y: f64,
    ) -> Result<(), InteropError> {
        let (c, s) = (self.live(chart)?, self.live(canvas)?);
        native!(self, self.engine.pointer_move(c, s, id, x, y))
    }

    pub fn pointer_leave(
        &mut self,
        chart: ChartHandle,
        canvas: CanvasHandle,
        id: i32,
    ) -> Result<(), InteropError> {
        let (c, s) = (self.live(chart)?, self.live(canvas)?);
        native!(self, self.engine.pointer_leave(c, s, id))
    }

    pub fn wheel(
        &mut self,
        chart: ChartHandle,
        canvas: CanvasHandle,
        delta: f64,
    ) -> Result<(), InteropError> {
        let (c, s) = (self.live(chart)?, self.live(canvas)?);
        native!(self, self.engine.wheel(c, s, delta))
    }

    // ---- snapshots and keyframes ------------------------------------------

    /// Capture the full chart configuration, independent of the animation
    /// clock.
    pub fn store_state(&mut self, chart: ChartHandle) -> Result<SnapshotHandle, InteropError> {
        let c = self.live(chart)?;
        let raw = native!(self, self.engine.chart_store(c))?;
        self.handles.track(raw, HandleKind::Snapshot);
        Ok(SnapshotHandle(raw))
    }

    /// Instantaneous state replacement; does not trigger a transition.
    pub fn restore_state(
        &mut self,
        chart: ChartHandle,
        snapshot: SnapshotHandle,
    ) -> Result<(), InteropError> {
        let (c, s) = (self.live(chart)?, self.live(snapshot)?);
        native!(self, self.engine.chart_restore(c, s))
    }

    pub fn store_keyframe(&mut self, chart: ChartHandle) -> Result<AnimHandle, InteropError> {
        let c = self.live(chart)?;
        let raw = native!(self, self.engine.anim_store(c))?;
        self.handles.track(raw, HandleKind::Animation);
        Ok(AnimHandle(raw))
    }

    pub fn restore_keyframe(
        &mut self,
        chart: ChartHandle,
        anim: AnimHandle,
    ) -> Result<(), InteropError> {
        let (c, a) = (self.live(chart)?, self.live(anim)?);
        native!(self, self.engine.anim_restore(c, a))
    }

    // ---- property, style and animation-option access ----------------------

    pub fn set_value(
        &mut self,
        chart: ChartHandle,
        path: &str,
        value: &str,
    ) -> Result<(), InteropError> {
        let c = self.live(chart)?;
        log::trace!("set {path} = {value}");
        native!(self, self.engine.chart_set_value(c, path, value))
    }

    pub fn get_value(&mut self, chart: ChartHandle, path: &str) -> Result<String, InteropError> {
        let c = self.live(chart)?;
        native!(self, self.engine.chart_get_value(c, path))
    }

    pub fn set_style(
        &mut self,
        chart: ChartHandle,
        path: &str,
        value: &str,
    ) -> Result<(), InteropError> {
        let c = self.live(chart)?;
        native!(self, self.engine.style_set_value(c, path, value))
    }

    pub fn get_style(
        &mut self,
        chart: ChartHandle,
        path: &str,
        computed: bool,
    ) -> Result<String, InteropError> {
        let c = self.live(chart)?;
        native!(self, self.engine.style_get_value(c, path, computed))
    }

    pub fn set_anim_value(
        &mut self,
        chart: ChartHandle,
        path: &str,
        value: &str,
    ) -> Result<(), InteropError> {
        let c = self.live(chart)?;
        native!(self, self.engine.anim_set_value(c, path, value))
    }

    // ---- data ingestion ---------------------------------------------------

    pub fn add_dimension(
        &mut self,
        chart: ChartHandle,
        name: &str,
        categories: &[String],
    ) -> Result<(), InteropError> {
        let c = self.live(chart)?;
        native!(self, self.engine.add_dimension(c, name, categories))
    }

    pub fn add_measure(
        &mut self,
        chart: ChartHandle,
        name: &str,
        unit: &str,
        values: &[f64],
    ) -> Result<(), InteropError> {
        let c = self.live(chart)?;
        native!(self, self.engine.add_measure(c, name, unit, values))
    }

    /// Push one row record; cell order must match the column registration
    /// order.
    pub fn add_record(&mut self, chart: ChartHandle, record: &Record) -> Result<(), InteropError> {
        let c = self.live(chart)?;
        let cells: Vec<Cell> = record.values().cloned().collect();
        native!(self, self.engine.add_record(c, &cells))
    }

    // ---- animation submission ---------------------------------------------

    pub fn set_keyframe(&mut self, chart: ChartHandle) -> Result<(), InteropError> {
        let c = self.live(chart)?;
        native!(self, self.engine.set_keyframe(c))
    }

    pub fn animate(&mut self, chart: ChartHandle, completion: SlotId) -> Result<(), InteropError> {
        let c = self.live(chart)?;
        if !self.slots.is_registered(completion) {
            return Err(InteropError::StaleSlot { slot: completion.0 });
        }
        native!(self, self.engine.animate(c, completion))
    }

    // ---- engine-raised events ---------------------------------------------

    pub fn add_event_listener(
        &mut self,
        chart: ChartHandle,
        name: &str,
        callback: SlotId,
    ) -> Result<(), InteropError> {
        let c = self.live(chart)?;
        if !self.slots.is_registered(callback) {
            return Err(InteropError::StaleSlot { slot: callback.0 });
        }
        native!(self, self.engine.add_event_listener(c, name, callback))
    }

    pub fn remove_event_listener(
        &mut self,
        chart: ChartHandle,
        name: &str,
        callback: SlotId,
    ) -> Result<(), InteropError> {
        let c = self.live(chart)?;
        native!(self, self.engine.remove_event_listener(c, name, callback))
    }

    // ---- misc -------------------------------------------------------------

    pub fn version(&mut self) -> Result<String, InteropError> {
        native!(self, self.engine.version())
    }

    pub fn set_logging(&mut self, enabled: bool) -> Result<(), InteropError> {
        native!(self, self.engine.set_logging(enabled))
    }

    pub fn handles(&self) -> &HandleRegistry {
        &self.handles
    }
}
