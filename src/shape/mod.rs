//! A single falling shape: its geometry, colour, position and alive flag.

use std::sync::mpsc::Sender;

use glam::DVec2;
use rand::Rng;

use crate::surface::Surface;

mod geometry;

pub use geometry::{
    Bounds, Geometry, RANDOM_POLYGON_MAX_VERTICES, RANDOM_POLYGON_MIN_VERTICES, STAR_POINTS,
    ShapeKind,
};

/// Distance below the visible area a shape may travel before it counts as gone.
pub const OFFSCREEN_MARGIN: f64 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(pub u64);

/// 24-bit RGB fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color(u32);

impl Color {
    pub const fn new(rgb: u32) -> Self {
        Self(rgb & 0xFF_FFFF)
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.random_range(0..=0xFF_FFFF))
    }

    pub fn rgb(self) -> u32 {
        self.0
    }

    pub fn to_css(self) -> String {
        format!("#{:06x}", self.0)
    }
}

/// Notifications a shape pushes to whoever subscribed at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeEvent {
    Removed(ShapeId),
}

#[derive(Debug)]
pub struct Shape {
    id: ShapeId,
    kind: ShapeKind,
    position: DVec2,
    color: Color,
    geometry: Option<Geometry>,
    alive: bool,
    attached: bool,
    /// Whether pointer-down on the geometry removes the shape.
    interactive: bool,
    events: Sender<ShapeEvent>,
}

impl Shape {
    pub fn create(id: ShapeId, kind: ShapeKind, events: Sender<ShapeEvent>) -> Self {
        Self {
            id,
            kind,
            position: DVec2::ZERO,
            color: Color::new(0),
            geometry: None,
            alive: true,
            attached: false,
            interactive: true,
            events,
        }
    }

    /// Build this kind's geometry and attach it at `position`. Only the first
    /// call has any effect.
    pub fn draw<R: Rng + ?Sized>(
        &mut self,
        color: Color,
        position: DVec2,
        surface: &mut dyn Surface,
        rng: &mut R,
    ) {
        if self.geometry.is_some() || !self.alive {
            return;
        }
        let geometry = self.kind.geometry(rng);
        self.color = color;
        self.position = position;
        surface.attach(self.id, &geometry, color, position);
        self.geometry = Some(geometry);
        self.attached = true;
    }

    /// Detach and mark dead. Returns `false` if the shape was already removed.
    pub fn remove(&mut self, surface: &mut dyn Surface) -> bool {
        if !self.alive {
            return false;
        }
        self.kill(surface);
        // the scene may already be gone; nothing to notify then
        let _ = self.events.send(ShapeEvent::Removed(self.id));
        true
    }

    /// Pointer-down on the shape's own geometry.
    pub fn on_pointer_down(&mut self, surface: &mut dyn Surface) -> bool {
        self.interactive && self.remove(surface)
    }

    /// Drop a shape that fell out of view. Same end state as [`remove`](Self::remove)
    /// without a removal notification.
    pub(crate) fn retire(&mut self, surface: &mut dyn Surface) {
        if self.alive {
            self.kill(surface);
        }
    }

    fn kill(&mut self, surface: &mut dyn Surface) {
        self.alive = false;
        self.interactive = false;
        if self.attached {
            surface.detach(self.id);
            self.attached = false;
        }
    }

    /// Advance by one frame. The geometry is detached once it drops past the
    /// bottom margin; the shape stays alive until the scene prunes it.
    pub fn tick(&mut self, gravity: u32, surface: &mut dyn Surface) {
        if !self.alive {
            return;
        }
        self.position.y += f64::from(gravity);
        if !self.attached {
            return;
        }
        if self.position.y > surface.height() + OFFSCREEN_MARGIN {
            surface.detach(self.id);
            self.attached = false;
        } else {
            surface.set_position(self.id, self.position);
        }
    }

    pub fn is_on_canvas(&self, visible_height: f64) -> bool {
        self.alive && self.position.y <= visible_height + OFFSCREEN_MARGIN
    }

    /// World-space bounds of the rendered geometry. `None` once the shape is
    /// dead or no longer attached to the surface.
    pub fn bounds(&self) -> Option<Bounds> {
        if !self.alive || !self.attached {
            return None;
        }
        self.geometry
            .as_ref()
            .map(|g| g.local_bounds().translated(self.position))
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        self.bounds().is_some_and(|b| b.contains(x, y))
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn position(&self) -> DVec2 {
        self.position
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::HeadlessSurface;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use std::sync::mpsc::{self, Receiver};

    fn drawn(kind: ShapeKind, at: DVec2) -> (Shape, HeadlessSurface, Receiver<ShapeEvent>) {
        let (tx, rx) = mpsc::channel();
        let mut surface = HeadlessSurface::new(800.0, 600.0);
        let mut rng = SmallRng::seed_from_u64(3);
        let mut shape = Shape::create(ShapeId(1), kind, tx);
        shape.draw(Color::new(0x123456), at, &mut surface, &mut rng);
        (shape, surface, rx)
    }

    #[test]
    fn draw_attaches_once() {
        let (mut shape, mut surface, _rx) = drawn(ShapeKind::Square, DVec2::new(10.0, 20.0));
        let mut rng = SmallRng::seed_from_u64(4);
        shape.draw(Color::new(0xffffff), DVec2::ZERO, &mut surface, &mut rng);
        assert_eq!(surface.attach_calls(), 1);
        assert_eq!(shape.position(), DVec2::new(10.0, 20.0));
        assert_eq!(shape.color(), Color::new(0x123456));
    }

    #[test]
    fn remove_twice_is_a_no_op() {
        let (mut shape, mut surface, rx) = drawn(ShapeKind::Circle, DVec2::new(100.0, 100.0));
        assert!(shape.remove(&mut surface));
        assert!(!shape.remove(&mut surface));
        assert!(!shape.is_alive());
        assert!(!surface.is_attached(ShapeId(1)));
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![ShapeEvent::Removed(ShapeId(1))]);
    }

    #[test]
    fn dead_shape_is_never_on_canvas() {
        let (mut shape, mut surface, _rx) = drawn(ShapeKind::Star, DVec2::new(100.0, 100.0));
        shape.remove(&mut surface);
        assert!(!shape.is_on_canvas(600.0));
        assert!(!shape.is_on_canvas(f64::MAX));
        assert!(shape.bounds().is_none());
        assert!(!shape.contains_point(100.0, 100.0));
    }

    #[test]
    fn tick_moves_by_exactly_gravity() {
        let (mut shape, mut surface, _rx) = drawn(ShapeKind::Triangle, DVec2::new(100.0, -100.0));
        for gravity in [1, 3, 2, 7] {
            let before = shape.position().y;
            shape.tick(gravity, &mut surface);
            assert_eq!(shape.position().y, before + f64::from(gravity));
        }
        assert_eq!(surface.node(ShapeId(1)).unwrap().position, shape.position());
    }

    #[test]
    fn tick_detaches_below_margin_but_keeps_alive() {
        let (mut shape, mut surface, _rx) = drawn(ShapeKind::Hexagon, DVec2::new(100.0, 649.0));
        shape.tick(1, &mut surface);
        assert!(surface.is_attached(ShapeId(1)));
        shape.tick(1, &mut surface);
        assert!(!surface.is_attached(ShapeId(1)));
        assert!(shape.is_alive());
        assert!(!shape.is_on_canvas(600.0));
    }

    #[test]
    fn detached_shape_has_no_bounds() {
        let (mut shape, mut surface, _rx) = drawn(ShapeKind::Square, DVec2::new(100.0, 650.0));
        assert!(shape.contains_point(100.0, 601.0));
        shape.tick(1, &mut surface);
        assert!(shape.is_alive());
        assert!(!shape.is_attached());
        assert!(shape.bounds().is_none());
        assert!(!shape.contains_point(100.0, 602.0));
    }

    #[test]
    fn dead_shape_does_not_move() {
        let (mut shape, mut surface, _rx) = drawn(ShapeKind::Ellipse, DVec2::new(0.0, 0.0));
        shape.remove(&mut surface);
        shape.tick(5, &mut surface);
        assert_eq!(shape.position().y, 0.0);
    }

    #[test]
    fn pointer_down_removes_only_interactive_shapes() {
        let (mut shape, mut surface, _rx) = drawn(ShapeKind::Pentagon, DVec2::new(0.0, 0.0));
        assert!(shape.on_pointer_down(&mut surface));
        assert!(!shape.on_pointer_down(&mut surface));
    }

    #[test]
    fn retire_does_not_notify() {
        let (mut shape, mut surface, rx) = drawn(ShapeKind::Square, DVec2::new(0.0, 0.0));
        shape.retire(&mut surface);
        assert!(!shape.is_alive());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn bounds_follow_position() {
        let (shape, _surface, _rx) = drawn(ShapeKind::Square, DVec2::new(200.0, 300.0));
        let b = shape.bounds().unwrap();
        assert_eq!(b.min, DVec2::new(150.0, 250.0));
        assert_eq!(b.max, DVec2::new(250.0, 350.0));
        assert!(shape.contains_point(200.0, 300.0));
        assert!(!shape.contains_point(260.0, 300.0));
    }

    #[test]
    fn color_masks_to_24_bits() {
        assert_eq!(Color::new(0xFF12_3456).rgb(), 0x12_3456);
        assert_eq!(Color::new(0x00ff00).to_css(), "#00ff00");
    }
}
