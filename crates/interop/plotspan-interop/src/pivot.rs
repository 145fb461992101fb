//! Built-in `prepareAnimation` plugin that unpivots cube-shaped data.
//!
//! Runs before any other stage or the bridge inspects a payload's shape; the
//! rest of the system assumes row-oriented records exclusively.

use crate::data::unpivot;
use crate::error::InteropError;
use crate::pipeline::{Continuation, Plugin, Stage};
use crate::request::{AnimationContext, TargetKind};

#[derive(Default)]
pub struct PivotData;

pub const PIVOT_PLUGIN_NAME: &str = "pivotData";

impl Plugin for PivotData {
    fn name(&self) -> &str {
        PIVOT_PLUGIN_NAME
    }

    fn stages(&self) -> &[Stage] {
        &[Stage::PrepareAnimation]
    }

    fn run(
        &mut self,
        _stage: Stage,
        ctx: &mut AnimationContext,
        cont: &Continuation,
    ) -> Result<(), InteropError> {
        for target in ctx.targets.iter_mut() {
            let TargetKind::Config(delta) = &mut target.target else {
                continue;
            };
            let Some(data) = delta.data.as_mut() else {
                continue;
            };
            if data.is_cube() {
                if data.is_set() {
                    // Conflicting shape markers: refuse to guess precedence.
                    return Err(InteropError::ShapeConflict);
                }
                *data = unpivot(data)?;
            }
        }
        cont.proceed();
        Ok(())
    }
}
