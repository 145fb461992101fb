//! Plugin pipeline: ordered, named hook stages with explicit continuation.
//!
//! Every animation request passes through the registered hooks of a stage in
//! registration order. A hook hands control onward only by calling
//! [`Continuation::proceed`]; returning without it halts the chain and the
//! request is not submitted. A hook error aborts the whole chain and
//! propagates to the animate() caller — no partial submission occurs.

use std::cell::Cell;

use indexmap::IndexMap;

use crate::error::InteropError;
use crate::request::AnimationContext;

/// Stage identifiers of the hook chain.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Stage {
    /// Runs before submission; hooks may rewrite the context.
    PrepareAnimation,
    /// Runs immediately before the request is handed to the engine.
    RunAnimation,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum ChainState {
    Pending,
    Continued,
}

/// Continuation handed to each hook. The chain advances past a hook only if
/// it called [`Continuation::proceed`] before returning.
#[derive(Debug)]
pub struct Continuation {
    state: Cell<ChainState>,
}

impl Continuation {
    fn new() -> Self {
        Self {
            state: Cell::new(ChainState::Pending),
        }
    }

    pub fn proceed(&self) {
        self.state.set(ChainState::Continued);
    }

    fn continued(&self) -> bool {
        self.state.get() == ChainState::Continued
    }
}

/// Result of running one stage's chain to the end or to a halt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainOutcome {
    /// Every hook ran and proceeded.
    Completed,
    /// A hook returned without proceeding; nothing downstream ran.
    Halted { plugin: String },
}

/// An independently developed pipeline extension.
///
/// A plugin declares which stages it hooks and is called back in
/// registration order whenever one of those stages runs.
pub trait Plugin {
    fn name(&self) -> &str;

    /// Stages this plugin hooks. Empty means lifecycle-only.
    fn stages(&self) -> &[Stage] {
        &[]
    }

    fn run(
        &mut self,
        _stage: Stage,
        _ctx: &mut AnimationContext,
        cont: &Continuation,
    ) -> Result<(), InteropError> {
        cont.proceed();
        Ok(())
    }

    fn on_register(&mut self) {}
    fn on_unregister(&mut self) {}
}

/// Name-indexed plugin registry preserving registration order.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: IndexMap<String, Box<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, mut plugin: Box<dyn Plugin>) -> Result<(), InteropError> {
        let name = plugin.name().to_owned();
        if self.plugins.contains_key(&name) {
            return Err(InteropError::DuplicatePlugin { name });
        }
        plugin.on_register();
        log::debug!("plugin '{name}' registered");
        self.plugins.insert(name, plugin);
        Ok(())
    }

    pub fn unregister(&mut self, name: &str) -> Result<Box<dyn Plugin>, InteropError> {
        // shift_remove keeps the order of the remaining plugins intact.
        let mut plugin = self
            .plugins
            .shift_remove(name)
            .ok_or_else(|| InteropError::UnknownPlugin {
                name: name.to_owned(),
            })?;
        plugin.on_unregister();
        log::debug!("plugin '{name}' unregistered");
        Ok(plugin)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Run the hook chain of one stage over the context.
    pub fn run_stage(
        &mut self,
        stage: Stage,
        ctx: &mut AnimationContext,
    ) -> Result<ChainOutcome, InteropError> {
        for (name, plugin) in self.plugins.iter_mut() {
            if !plugin.stages().contains(&stage) {
                continue;
            }
            let cont = Continuation::new();
            plugin.run(stage, ctx, &cont)?;
            if !cont.continued() {
                log::debug!("stage {stage:?} halted by plugin '{name}'");
                return Ok(ChainOutcome::Halted {
                    plugin: name.clone(),
                });
            }
        }
        Ok(ChainOutcome::Completed)
    }
}

/// Adapter turning a closure into a single-stage plugin. Used by hosts and
/// tests for ad-hoc hooks.
pub struct HookPlugin<F> {
    name: String,
    stage: [Stage; 1],
    func: F,
}

pub fn hook<F>(name: impl Into<String>, stage: Stage, func: F) -> HookPlugin<F>
where
    F: FnMut(&mut AnimationContext, &Continuation) -> Result<(), InteropError>,
{
    HookPlugin {
        name: name.into(),
        stage: [stage],
        func,
    }
}

impl<F> Plugin for HookPlugin<F>
where
    F: FnMut(&mut AnimationContext, &Continuation) -> Result<(), InteropError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn stages(&self) -> &[Stage] {
        &self.stage
    }

    fn run(
        &mut self,
        _stage: Stage,
        ctx: &mut AnimationContext,
        cont: &Continuation,
    ) -> Result<(), InteropError> {
        (self.func)(ctx, cont)
    }
}
