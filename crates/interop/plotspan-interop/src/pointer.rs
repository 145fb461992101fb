//! Outbound pointer/wheel forwarding with coordinate translation.
//!
//! Raw platform input arrives in client space; the engine expects
//! render-relative coordinates. The component owns the binding to one
//! chart/surface pair plus the surface transform, and installs or removes
//! its full handler set atomically on enable/disable.

use crate::bridge::Bridge;
use crate::error::InteropError;
use crate::handle::{CanvasHandle, ChartHandle};

/// Raw platform pointer/wheel interaction, client-space coordinates.
/// Pointer-leave and wheel carry no coordinate pair.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PointerInput {
    Down { id: i32, x: f64, y: f64 },
    Up { id: i32, x: f64, y: f64 },
    Move { id: i32, x: f64, y: f64 },
    Leave { id: i32 },
    Wheel { delta: f64 },
}

/// Event kinds one handler each is registered for per surface.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PointerKind {
    Down,
    Up,
    Move,
    Leave,
    Wheel,
}

pub const ALL_POINTER_KINDS: [PointerKind; 5] = [
    PointerKind::Down,
    PointerKind::Up,
    PointerKind::Move,
    PointerKind::Leave,
    PointerKind::Wheel,
];

/// Platform event source the handler set is installed into (a canvas
/// element, a window, a test double). `attach` receives the complete kind
/// set in one call so partial registration is never an observable state.
pub trait PointerSource {
    fn attach(&mut self, kinds: &[PointerKind]);
    fn detach(&mut self);
}

/// Client-space → render-relative mapping for one surface: the surface
/// origin in client space plus the logical→device pixel scale factor.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SurfaceTransform {
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
}

impl Default for SurfaceTransform {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 1.0,
        }
    }
}

impl SurfaceTransform {
    pub fn client_to_render(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.offset_x) * self.scale, (y - self.offset_y) * self.scale)
    }
}

#[derive(Debug)]
struct Binding {
    chart: ChartHandle,
    canvas: CanvasHandle,
    transform: SurfaceTransform,
}

/// Pointer forwarding component for one chart/surface pair.
#[derive(Default, Debug)]
pub struct PointerEvents {
    binding: Option<Binding>,
    enabled: bool,
}

impl PointerEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the active chart/surface pair and its transform. Must happen
    /// before the component is enabled.
    pub fn bind(&mut self, chart: ChartHandle, canvas: CanvasHandle, transform: SurfaceTransform) {
        self.binding = Some(Binding {
            chart,
            canvas,
            transform,
        });
    }

    /// Update the transform (surface moved/resized, device pixel ratio
    /// changed).
    pub fn set_transform(&mut self, transform: SurfaceTransform) -> Result<(), InteropError> {
        let binding = self.binding.as_mut().ok_or(InteropError::NotInitialized {
            what: "pointer events: no surface bound",
        })?;
        binding.transform = transform;
        Ok(())
    }

    /// Enable or disable forwarding. Enabling installs the complete handler
    /// set in one `attach` call; disabling removes all of them in one
    /// `detach` call. Enabling before a surface is bound is a precondition
    /// error.
    pub fn enable(
        &mut self,
        source: &mut dyn PointerSource,
        enabled: bool,
    ) -> Result<(), InteropError> {
        if enabled && self.binding.is_none() {
            return Err(InteropError::NotInitialized {
                what: "pointer events: no surface bound",
            });
        }
        if enabled == self.enabled {
            return Ok(());
        }
        self.enabled = enabled;
        if enabled {
            source.attach(&ALL_POINTER_KINDS);
        } else {
            source.detach();
        }
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Translate one platform input and forward it through the bridge.
    /// Input arriving while disabled is dropped.
    pub fn forward(&mut self, bridge: &mut Bridge, input: PointerInput) -> Result<(), InteropError> {
        if !self.enabled {
            return Ok(());
        }
        let binding = self.binding.as_ref().ok_or(InteropError::NotInitialized {
            what: "pointer events: no surface bound",
        })?;
        let (chart, canvas) = (binding.chart, binding.canvas);
        match input {
            PointerInput::Down { id, x, y } => {
                let (rx, ry) = binding.transform.client_to_render(x, y);
                bridge.pointer_down(chart, canvas, id, rx, ry)
            }
            PointerInput::Up { id, x, y } => {
                let (rx, ry) = binding.transform.client_to_render(x, y);
                bridge.pointer_up(chart, canvas, id, rx, ry)
            }
            PointerInput::Move { id, x, y } => {
                let (rx, ry) = binding.transform.client_to_render(x, y);
                bridge.pointer_move(chart, canvas, id, rx, ry)
            }
            PointerInput::Leave { id } => bridge.pointer_leave(chart, canvas, id),
            PointerInput::Wheel { delta } => bridge.wheel(chart, canvas, delta),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_maps_client_to_render() {
        let t = SurfaceTransform {
            offset_x: 10.0,
            offset_y: 20.0,
            scale: 2.0,
        };
        assert_eq!(t.client_to_render(15.0, 30.0), (10.0, 20.0));
    }
}
