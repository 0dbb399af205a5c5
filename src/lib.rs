//! Falling Shapes core crate.
//!
//! Geometric shapes drop from above a canvas under a tunable gravity. Clicking
//! a shape pops it; clicking empty space drops a random polygon right there.
//! The shape model and scene controller are platform independent and run on
//! the host for tests; the `web` module wires them to a browser canvas.

use wasm_bindgen::prelude::*;

pub mod config;
mod error;
pub mod scene;
pub mod shape;
pub mod surface;
pub mod web;

pub use config::{SceneConfig, spawn_interval_ms};
pub use error::SceneError;
pub use scene::{ClickOutcome, ManualTimers, Scene, SpawnTimer, TimerHost, TimerState};
pub use shape::{Bounds, Color, Geometry, Shape, ShapeEvent, ShapeId, ShapeKind};
pub use surface::{HeadlessSurface, Surface, SurfaceNode};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
}
