//! Host-facing chart front-end.
//!
//! Owns one chart/canvas handle pair, the plugin registry, the pointer
//! forwarder and the event dispatcher. `animate` is the single entry point
//! for animation requests: the hook chain runs first, and only a fully
//! continued chain reaches the engine.

use serde_json::Value as JsonValue;

use crate::abi::EngineAbi;
use crate::bridge::Bridge;
use crate::data::{Cell, DataPayload};
use crate::error::InteropError;
use crate::events::{EventDispatch, EventListener, SubscriptionId};
use crate::handle::{AnimHandle, CanvasHandle, ChartHandle, SnapshotHandle};
use crate::pipeline::{ChainOutcome, Plugin, PluginRegistry, Stage};
use crate::pivot::PivotData;
use crate::pointer::{PointerEvents, PointerInput, PointerSource, SurfaceTransform};
use crate::request::{AnimOptions, AnimationContext, TargetKind, Timing};

pub type CompletionFn = Box<dyn FnOnce(bool)>;

/// Flatten a JSON tree into dotted-path / string-encoded value pairs, the
/// form the engine's property entry points take. Arrays and nulls keep
/// their JSON encoding; scalars are encoded bare.
pub fn flatten_config(value: &JsonValue, out: &mut Vec<(String, String)>) {
    fn walk(prefix: &str, value: &JsonValue, out: &mut Vec<(String, String)>) {
        match value {
            JsonValue::Object(map) => {
                for (key, child) in map {
                    let path = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{prefix}.{key}")
                    };
                    walk(&path, child, out);
                }
            }
            JsonValue::String(s) => out.push((prefix.to_owned(), s.clone())),
            JsonValue::Number(n) => out.push((prefix.to_owned(), n.to_string())),
            JsonValue::Bool(b) => out.push((prefix.to_owned(), b.to_string())),
            other => out.push((prefix.to_owned(), other.to_string())),
        }
    }
    walk("", value, out);
}

pub struct Chart {
    bridge: Bridge,
    handle: ChartHandle,
    canvas: CanvasHandle,
    plugins: PluginRegistry,
    pointer: PointerEvents,
    events: EventDispatch,
}

impl Chart {
    /// Create a chart and its render surface against the given engine. The
    /// data normalizer plugin is installed by default.
    pub fn new(engine: Box<dyn EngineAbi>) -> Result<Self, InteropError> {
        let mut bridge = Bridge::new(engine);
        let handle = bridge.create_chart()?;
        let canvas = bridge.create_canvas()?;
        let mut plugins = PluginRegistry::new();
        plugins.register(Box::new(PivotData))?;
        Ok(Self {
            bridge,
            handle,
            canvas,
            plugins,
            pointer: PointerEvents::new(),
            events: EventDispatch::new(),
        })
    }

    pub fn handle(&self) -> ChartHandle {
        self.handle
    }

    pub fn canvas(&self) -> CanvasHandle {
        self.canvas
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut Bridge {
        &mut self.bridge
    }

    // ---- plugins ----------------------------------------------------------

    pub fn register_plugin(&mut self, plugin: Box<dyn Plugin>) -> Result<(), InteropError> {
        self.plugins.register(plugin)
    }

    pub fn unregister_plugin(&mut self, name: &str) -> Result<(), InteropError> {
        self.plugins.unregister(name).map(|_| ())
    }

    // ---- animation --------------------------------------------------------

    /// Submit an animation request. The `prepareAnimation` and
    /// `runAnimation` chains run first, in plugin registration order; a
    /// halted chain means the request never reaches the engine and the halt
    /// is reported in the outcome. Hook errors propagate unchanged.
    pub fn animate(
        &mut self,
        mut ctx: AnimationContext,
        on_complete: Option<CompletionFn>,
    ) -> Result<ChainOutcome, InteropError> {
        let outcome = self.plugins.run_stage(Stage::PrepareAnimation, &mut ctx)?;
        if let ChainOutcome::Halted { .. } = outcome {
            return Ok(outcome);
        }
        let outcome = self.plugins.run_stage(Stage::RunAnimation, &mut ctx)?;
        if let ChainOutcome::Halted { .. } = outcome {
            return Ok(outcome);
        }

        let multi_phase = ctx.targets.len() > 1;
        for target in &ctx.targets {
            match &target.target {
                TargetKind::Snapshot(snapshot) => {
                    self.bridge.restore_state(self.handle, *snapshot)?;
                }
                TargetKind::Config(delta) => {
                    if let Some(data) = &delta.data {
                        self.submit_data(data)?;
                    }
                    if let Some(config) = &delta.config {
                        let mut pairs = Vec::new();
                        flatten_config(config, &mut pairs);
                        for (path, value) in &pairs {
                            self.bridge.set_value(self.handle, path, value)?;
                        }
                    }
                    if let Some(style) = &delta.style {
                        let mut pairs = Vec::new();
                        flatten_config(style, &mut pairs);
                        for (path, value) in &pairs {
                            self.bridge.set_style(self.handle, path, value)?;
                        }
                    }
                }
            }
            if let Some(options) = &target.options {
                self.submit_options(options)?;
            }
            if multi_phase {
                self.bridge.set_keyframe(self.handle)?;
            }
        }

        let completion = self
            .bridge
            .register_completion(on_complete.unwrap_or_else(|| Box::new(|_| {})))?;
        self.bridge.animate(self.handle, completion)?;
        Ok(ChainOutcome::Completed)
    }

    fn submit_options(&mut self, options: &AnimOptions) -> Result<(), InteropError> {
        self.submit_timing("", &options.timing)?;
        for (channel, timing) in &options.channels {
            self.submit_timing(&format!("channels.{channel}."), timing)?;
        }
        Ok(())
    }

    fn submit_timing(&mut self, prefix: &str, timing: &Timing) -> Result<(), InteropError> {
        if let Some(duration) = &timing.duration {
            self.bridge
                .set_anim_value(self.handle, &format!("{prefix}duration"), duration)?;
        }
        if let Some(delay) = &timing.delay {
            self.bridge
                .set_anim_value(self.handle, &format!("{prefix}delay"), delay)?;
        }
        if let Some(easing) = &timing.easing {
            self.bridge
                .set_anim_value(self.handle, &format!("{prefix}easing"), easing)?;
        }
        Ok(())
    }

    /// Hand a record-shaped payload to the engine. Cube shapes must have
    /// been normalized by the pipeline before this point; explicit series
    /// become measure or dimension columns by value inspection.
    fn submit_data(&mut self, data: &DataPayload) -> Result<(), InteropError> {
        if let Some(dimensions) = &data.dimensions {
            for dim in dimensions {
                self.bridge
                    .add_dimension(self.handle, &dim.name, &dim.categories)?;
            }
        }
        if let Some(measures) = &data.measures {
            for measure in measures {
                self.bridge.add_measure(
                    self.handle,
                    &measure.name,
                    measure.unit.as_deref().unwrap_or(""),
                    &measure.values,
                )?;
            }
        }
        if let Some(series) = &data.series {
            for s in series {
                if s.is_measure() {
                    let values: Vec<f64> = s
                        .values
                        .iter()
                        .filter_map(|c| match c {
                            Cell::Number(n) => Some(*n),
                            Cell::Text(_) => None,
                        })
                        .collect();
                    self.bridge.add_measure(self.handle, &s.name, "", &values)?;
                } else {
                    let categories: Vec<String> = s
                        .values
                        .iter()
                        .map(|c| match c {
                            Cell::Text(t) => t.clone(),
                            Cell::Number(n) => n.to_string(),
                        })
                        .collect();
                    self.bridge
                        .add_dimension(self.handle, &s.name, &categories)?;
                }
            }
        }
        if let Some(records) = &data.records {
            for record in records {
                self.bridge.add_record(self.handle, record)?;
            }
        }
        Ok(())
    }

    // ---- snapshots / keyframes --------------------------------------------

    pub fn store(&mut self) -> Result<SnapshotHandle, InteropError> {
        self.bridge.store_state(self.handle)
    }

    pub fn restore(&mut self, snapshot: SnapshotHandle) -> Result<(), InteropError> {
        self.bridge.restore_state(self.handle, snapshot)
    }

    pub fn store_keyframe(&mut self) -> Result<AnimHandle, InteropError> {
        self.bridge.store_keyframe(self.handle)
    }

    pub fn restore_keyframe(&mut self, anim: AnimHandle) -> Result<(), InteropError> {
        self.bridge.restore_keyframe(self.handle, anim)
    }

    // ---- pointer forwarding -----------------------------------------------

    pub fn bind_pointer(&mut self, transform: SurfaceTransform) {
        self.pointer.bind(self.handle, self.canvas, transform);
    }

    pub fn enable_pointer(
        &mut self,
        source: &mut dyn PointerSource,
        enabled: bool,
    ) -> Result<(), InteropError> {
        self.pointer.enable(source, enabled)
    }

    pub fn forward_pointer(&mut self, input: PointerInput) -> Result<(), InteropError> {
        self.pointer.forward(&mut self.bridge, input)
    }

    pub fn set_pointer_transform(&mut self, transform: SurfaceTransform) -> Result<(), InteropError> {
        self.pointer.set_transform(transform)
    }

    // ---- engine events ----------------------------------------------------

    pub fn on(&mut self, name: &str, listener: EventListener) -> Result<SubscriptionId, InteropError> {
        self.events
            .subscribe(&mut self.bridge, self.handle, name, listener)
    }

    pub fn off(&mut self, id: SubscriptionId) -> Result<(), InteropError> {
        self.events.unsubscribe(&mut self.bridge, id)
    }

    pub fn subscription_count(&self) -> usize {
        self.events.subscription_count()
    }

    // ---- misc -------------------------------------------------------------

    pub fn config_value(&mut self, path: &str) -> Result<String, InteropError> {
        self.bridge.get_value(self.handle, path)
    }

    pub fn style_value(&mut self, path: &str, computed: bool) -> Result<String, InteropError> {
        self.bridge.get_style(self.handle, path, computed)
    }

    pub fn version(&mut self) -> Result<String, InteropError> {
        self.bridge.version()
    }

    pub fn set_logging(&mut self, enabled: bool) -> Result<(), InteropError> {
        self.bridge.set_logging(enabled)
    }

    /// Tear the chart down: every subscription first (bindings and slots),
    /// then the surface, then the chart handle itself. Handles are released
    /// exactly once; the engine never learns about host drops implicitly.
    pub fn close(mut self) -> Result<(), InteropError> {
        self.events.release_chart(&mut self.bridge, self.handle)?;
        self.bridge.release(self.canvas)?;
        self.bridge.release(self.handle)
    }
}
