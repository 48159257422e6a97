use serde::Serialize;
use std::time::Duration;

use crate::domain::graph::element::{BoundingBox, Position};

pub const ZOOM_STEP: f64 = 1.2;
pub const MIN_ZOOM: f64 = 0.2;
pub const MAX_ZOOM: f64 = 3.0;
pub const ANIMATION_DURATION: Duration = Duration::from_millis(200);
pub const FIT_PADDING: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Screen = model * zoom + pan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Camera {
    pub zoom: f64,
    pub pan: Position,
}

impl Default for Camera {
    fn default() -> Self {
        Self { zoom: 1.0, pan: Position::default() }
    }
}

/// Transition between two cameras, sampled by whoever draws the frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewportAnimation {
    pub from: Camera,
    pub to: Camera,
    pub duration: Duration,
}

impl ViewportAnimation {
    /// Camera at `elapsed` (ease-out quad). Past the duration this is `to`.
    pub fn sample(&self, elapsed: Duration) -> Camera {
        if self.duration.is_zero() || elapsed >= self.duration {
            return self.to;
        }

        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        let eased = 1.0 - (1.0 - t) * (1.0 - t);
        let lerp = |a: f64, b: f64| a + (b - a) * eased;

        Camera {
            zoom: lerp(self.from.zoom, self.to.zoom),
            pan: Position::new(lerp(self.from.pan.x, self.to.pan.x), lerp(self.from.pan.y, self.to.pan.y)),
        }
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,

    /// Camera after any running animation has finished.
    camera: Camera,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height, camera: Camera::default() }
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn zoom_level(&self) -> f64 {
        self.camera.zoom
    }

    /// Steps the zoom by `ZOOM_STEP` around the viewport center, clamped to `[MIN_ZOOM, MAX_ZOOM]`.
    pub fn zoom(&mut self, direction: ZoomDirection) -> ViewportAnimation {
        let requested = match direction {
            ZoomDirection::In => self.camera.zoom * ZOOM_STEP,
            ZoomDirection::Out => self.camera.zoom / ZOOM_STEP,
        };
        let zoom = requested.clamp(MIN_ZOOM, MAX_ZOOM);

        // Keep the model point under the viewport center in place.
        let (cx, cy) = (self.width / 2.0, self.height / 2.0);
        let model_x = (cx - self.camera.pan.x) / self.camera.zoom;
        let model_y = (cy - self.camera.pan.y) / self.camera.zoom;
        let pan = Position::new(cx - model_x * zoom, cy - model_y * zoom);

        self.animate_to(Camera { zoom, pan })
    }

    /// Frames `bounds` with `FIT_PADDING` on every side. `None` when there is nothing to frame.
    pub fn fit(&mut self, bounds: Option<BoundingBox>) -> Option<ViewportAnimation> {
        let bounds = bounds?;

        let available_width = (self.width - FIT_PADDING * 2.0).max(1.0);
        let available_height = (self.height - FIT_PADDING * 2.0).max(1.0);

        let zoom = match (bounds.width() > 0.0, bounds.height() > 0.0) {
            (true, true) => (available_width / bounds.width()).min(available_height / bounds.height()),
            (true, false) => available_width / bounds.width(),
            (false, true) => available_height / bounds.height(),
            (false, false) => 1.0,
        }
        .clamp(MIN_ZOOM, MAX_ZOOM);

        let center = bounds.center();
        let pan = Position::new(self.width / 2.0 - center.x * zoom, self.height / 2.0 - center.y * zoom);

        Some(self.animate_to(Camera { zoom, pan }))
    }

    fn animate_to(&mut self, to: Camera) -> ViewportAnimation {
        let from = self.camera;
        self.camera = to;
        ViewportAnimation { from, to, duration: ANIMATION_DURATION }
    }

    pub fn to_screen(&self, position: Position) -> Position {
        Position::new(position.x * self.camera.zoom + self.camera.pan.x, position.y * self.camera.zoom + self.camera.pan.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_in_is_clamped() {
        let mut viewport = Viewport::new(1200.0, 800.0);
        for _ in 0..20 {
            viewport.zoom(ZoomDirection::In);
        }
        assert_eq!(viewport.zoom_level(), MAX_ZOOM);
    }

    #[test]
    fn test_zoom_out_is_clamped() {
        let mut viewport = Viewport::new(1200.0, 800.0);
        for _ in 0..20 {
            viewport.zoom(ZoomDirection::Out);
        }
        assert_eq!(viewport.zoom_level(), MIN_ZOOM);
    }

    #[test]
    fn test_single_step() {
        let mut viewport = Viewport::new(1200.0, 800.0);
        let animation = viewport.zoom(ZoomDirection::In);

        assert!((animation.to.zoom - 1.2).abs() < 1e-9);
        assert_eq!(animation.duration, Duration::from_millis(200));
        assert_eq!(animation.sample(Duration::ZERO), animation.from);
        assert_eq!(animation.sample(Duration::from_millis(250)), animation.to);
    }

    #[test]
    fn test_fit_frames_all_positions_with_padding() {
        let mut viewport = Viewport::new(1200.0, 800.0);
        let bounds = BoundingBox { min_x: 100.0, min_y: 100.0, max_x: 500.0, max_y: 300.0 };
        viewport.fit(Some(bounds)).unwrap();

        for corner in [Position::new(100.0, 100.0), Position::new(500.0, 300.0)] {
            let screen = viewport.to_screen(corner);
            assert!(screen.x >= FIT_PADDING - 1e-6 && screen.x <= 1200.0 - FIT_PADDING + 1e-6);
            assert!(screen.y >= FIT_PADDING - 1e-6 && screen.y <= 800.0 - FIT_PADDING + 1e-6);
        }
    }

    #[test]
    fn test_fit_without_elements() {
        let mut viewport = Viewport::new(1200.0, 800.0);
        assert!(viewport.fit(None).is_none());
    }
}
