//! Scene controller: owns the live shapes, the spawn timer, gravity and
//! spawn-rate controls, and routes pointer clicks.
//!
//! The scene is platform agnostic. The browser backend feeds it three kinds
//! of events on one thread:
//! - [`Scene::on_spawn_timer`] from the interval timer (prune, then spawn),
//! - [`Scene::on_frame`] once per animation frame (gravity),
//! - [`Scene::handle_click`] with canvas-relative pointer coordinates.

use std::sync::mpsc::{self, Receiver, Sender};

use glam::DVec2;
use log::{debug, info, trace};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::{SceneConfig, spawn_interval_ms};
use crate::error::SceneError;
use crate::shape::{Color, Shape, ShapeEvent, ShapeId, ShapeKind};
use crate::surface::Surface;

pub mod timer;

pub use timer::{ManualTimers, SpawnTimer, TimerHost, TimerState};

/// What a click on the surface ended up doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    Removed(ShapeId),
    Spawned(ShapeId),
}

pub struct Scene<S: Surface, T: TimerHost> {
    config: SceneConfig,
    surface: S,
    timer: SpawnTimer<T>,
    rng: SmallRng,
    shapes: Vec<Shape>,
    next_id: u64,
    gravity: u32,
    shapes_per_second: u32,
    shapes_on_screen: usize,
    shapes_area: u64,
    removed_by_click: u64,
    events_tx: Sender<ShapeEvent>,
    events_rx: Receiver<ShapeEvent>,
}

impl<S: Surface, T: TimerHost> Scene<S, T> {
    pub fn new(config: SceneConfig, surface: S, timers: T, seed: u64) -> Self {
        let config = config.sanitized();
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            gravity: config.initial_gravity,
            shapes_per_second: config.initial_shapes_per_second,
            config,
            surface,
            timer: SpawnTimer::new(timers),
            rng: SmallRng::seed_from_u64(seed),
            shapes: Vec::new(),
            next_id: 0,
            shapes_on_screen: 0,
            shapes_area: 0,
            removed_by_click: 0,
            events_tx,
            events_rx,
        }
    }

    /// Start the spawn timer at the current rate.
    pub fn start(&mut self) -> Result<(), SceneError> {
        let period = self.spawn_interval_ms();
        let generation = self.timer.start(period)?;
        info!(
            "scene started: {} shape(s)/s, gravity {} (timer gen {generation})",
            self.shapes_per_second, self.gravity
        );
        Ok(())
    }

    /// Cancel the spawn timer and drop every shape from the surface.
    pub fn stop(&mut self) {
        self.timer.stop();
        for mut shape in self.shapes.drain(..) {
            shape.retire(&mut self.surface);
        }
        self.recount();
        info!("scene stopped");
    }

    /// Interval timer callback. Returns `false` for firings from a cancelled
    /// schedule, which are ignored.
    pub fn on_spawn_timer(&mut self, generation: u64) -> bool {
        if !self.timer.is_current(generation) {
            trace!("ignoring stale spawn tick (gen {generation})");
            return false;
        }
        self.prune_and_recount();
        self.spawn_random_shape();
        true
    }

    /// Animation frame callback: every shape falls by the current gravity.
    pub fn on_frame(&mut self) {
        let gravity = self.gravity;
        for shape in &mut self.shapes {
            shape.tick(gravity, &mut self.surface);
        }
    }

    /// Spawn a shape above the visible area at a random horizontal position.
    pub fn spawn_random_shape(&mut self) -> ShapeId {
        let kind = if self.config.timer_includes_random_polygon {
            ShapeKind::ALL[self.rng.random_range(0..ShapeKind::ALL.len())]
        } else {
            ShapeKind::REGULAR[self.rng.random_range(0..ShapeKind::REGULAR.len())]
        };
        let width = self.surface.width();
        let (lo, hi) = (self.config.spawn_margin, width - self.config.spawn_margin);
        let x = if hi > lo {
            self.rng.random_range(lo..=hi)
        } else {
            width / 2.0
        };
        self.spawn(kind, DVec2::new(x, self.config.spawn_y))
    }

    /// Spawn a random polygon at the click position unless the point is
    /// already covered by a live shape (that shape handles the click itself).
    pub fn spawn_at_click(&mut self, x: f64, y: f64) -> Option<ShapeId> {
        if self.hit_test(x, y).is_some() {
            return None;
        }
        Some(self.spawn(ShapeKind::RandomPolygon, DVec2::new(x, y)))
    }

    /// Route a raw pointer click: the topmost live shape under the pointer is
    /// removed, otherwise a new shape appears there.
    pub fn handle_click(&mut self, x: f64, y: f64) -> ClickOutcome {
        let outcome = match self.hit_test(x, y) {
            Some(idx) => {
                let shape = &mut self.shapes[idx];
                shape.on_pointer_down(&mut self.surface);
                ClickOutcome::Removed(shape.id())
            }
            None => ClickOutcome::Spawned(self.spawn(ShapeKind::RandomPolygon, DVec2::new(x, y))),
        };
        self.drain_events();
        outcome
    }

    /// Drop shapes that were removed or fell out of view, then refresh the
    /// on-screen metrics.
    pub fn prune_and_recount(&mut self) {
        let height = self.surface.height();
        let surface = &mut self.surface;
        let before = self.shapes.len();
        self.shapes.retain_mut(|shape| {
            if shape.is_on_canvas(height) {
                true
            } else {
                shape.retire(&mut *surface);
                false
            }
        });
        let pruned = before - self.shapes.len();
        if pruned > 0 {
            debug!("pruned {pruned} shape(s)");
        }
        self.drain_events();
        self.recount();
    }

    /// Adjust gravity by `delta`, never going below 1. Takes effect on the
    /// next frame for every shape.
    pub fn set_gravity(&mut self, delta: i32) {
        let next = (i64::from(self.gravity) + i64::from(delta)).clamp(1, i64::from(u32::MAX));
        self.gravity = next as u32;
        info!("gravity {}", self.gravity);
    }

    /// Adjust shapes per second by `delta` within `1..=max_shapes_per_second`.
    /// A running spawn timer is rescheduled with the new period.
    pub fn set_spawn_rate(&mut self, delta: i32) -> Result<(), SceneError> {
        let max = i64::from(self.config.max_shapes_per_second);
        let next = (i64::from(self.shapes_per_second) + i64::from(delta)).clamp(1, max) as u32;
        if next == self.shapes_per_second {
            return Ok(());
        }
        self.shapes_per_second = next;
        let period = self.spawn_interval_ms();
        if self.timer.is_running() {
            self.timer.restart(period)?;
        }
        info!("spawn rate {next} shape(s)/s ({period} ms)");
        Ok(())
    }

    fn spawn(&mut self, kind: ShapeKind, position: DVec2) -> ShapeId {
        let id = ShapeId(self.next_id);
        self.next_id += 1;
        let mut shape = Shape::create(id, kind, self.events_tx.clone());
        let color = Color::random(&mut self.rng);
        shape.draw(color, position, &mut self.surface, &mut self.rng);
        debug!(
            "spawned {kind:?} #{} at ({:.0}, {:.0})",
            id.0, position.x, position.y
        );
        self.shapes.push(shape);
        id
    }

    /// Index of the topmost live, attached shape containing the point.
    fn hit_test(&self, x: f64, y: f64) -> Option<usize> {
        self.shapes.iter().rposition(|s| s.contains_point(x, y))
    }

    fn drain_events(&mut self) {
        for event in self.events_rx.try_iter() {
            match event {
                ShapeEvent::Removed(id) => {
                    self.removed_by_click += 1;
                    debug!("shape #{} removed by click", id.0);
                }
            }
        }
    }

    fn recount(&mut self) {
        self.shapes_on_screen = self.shapes.len();
        self.shapes_area = self.shapes_on_screen as u64 * self.config.area_per_shape;
    }

    pub fn spawn_interval_ms(&self) -> u32 {
        spawn_interval_ms(self.shapes_per_second)
    }

    pub fn gravity(&self) -> u32 {
        self.gravity
    }

    pub fn shapes_per_second(&self) -> u32 {
        self.shapes_per_second
    }

    pub fn shapes_on_screen(&self) -> usize {
        self.shapes_on_screen
    }

    pub fn shapes_area(&self) -> u64 {
        self.shapes_area
    }

    pub fn removed_by_click(&self) -> u64 {
        self.removed_by_click
    }

    pub fn active_shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn timer(&self) -> &SpawnTimer<T> {
        &self.timer
    }

    pub fn timer_host_mut(&mut self) -> &mut T {
        self.timer.host_mut()
    }
}
