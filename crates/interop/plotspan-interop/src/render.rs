//! Host-side renderer interface for a render surface.
//!
//! The engine drives drawing by issuing primitive calls against the surface
//! it is rendering to; the bridge routes them to the renderer registered for
//! that surface handle. All calls arrive synchronously inside the render
//! pass that triggered them.

/// Drawing primitives serviced by the host for one surface.
///
/// Default implementations are no-ops so a renderer only implements the
/// primitives its backend supports.
pub trait SurfaceRenderer {
    fn frame_begin(&mut self) {}
    fn frame_end(&mut self) {}

    fn set_brush_color(&mut self, _r: f64, _g: f64, _b: f64, _a: f64) {}
    fn set_line_color(&mut self, _r: f64, _g: f64, _b: f64, _a: f64) {}
    fn set_line_width(&mut self, _width: f64) {}
    fn set_font(&mut self, _font: &str) {}

    fn line(&mut self, _x1: f64, _y1: f64, _x2: f64, _y2: f64) {}
    fn rectangle(&mut self, _x: f64, _y: f64, _width: f64, _height: f64) {}
    fn circle(&mut self, _x: f64, _y: f64, _radius: f64) {}
    fn text(&mut self, _x: f64, _y: f64, _width: f64, _height: f64, _text: &str) {}

    fn transform(&mut self, _a: f64, _b: f64, _c: f64, _d: f64, _e: f64, _f: f64) {}
    fn save(&mut self) {}
    fn restore(&mut self) {}
}
