//! Drawing-surface seam between the scene core and whatever paints pixels.
//!
//! The surface keeps a retained list of attached shapes keyed by [`ShapeId`];
//! shapes never own the surface, they are handed a `&mut dyn Surface` for the
//! duration of a call.

use std::collections::HashMap;

use glam::DVec2;

use crate::shape::{Color, Geometry, ShapeId};

pub trait Surface {
    /// Visible width in px.
    fn width(&self) -> f64;
    /// Visible height in px.
    fn height(&self) -> f64;
    /// Add a child. Attaching an id twice replaces the earlier entry.
    fn attach(&mut self, id: ShapeId, geometry: &Geometry, fill: Color, position: DVec2);
    fn set_position(&mut self, id: ShapeId, position: DVec2);
    /// Remove a child. Unknown ids are ignored.
    fn detach(&mut self, id: ShapeId);
}

#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceNode {
    pub geometry: Geometry,
    pub fill: Color,
    pub position: DVec2,
}

/// In-memory surface with no rendering. Used for host-side runs and tests.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    width: f64,
    height: f64,
    nodes: HashMap<ShapeId, SurfaceNode>,
    attach_calls: usize,
}

impl HeadlessSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn node(&self, id: ShapeId) -> Option<&SurfaceNode> {
        self.nodes.get(&id)
    }

    pub fn is_attached(&self, id: ShapeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn attached_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of `attach` calls over the surface's lifetime.
    pub fn attach_calls(&self) -> usize {
        self.attach_calls
    }
}

impl Surface for HeadlessSurface {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn attach(&mut self, id: ShapeId, geometry: &Geometry, fill: Color, position: DVec2) {
        self.attach_calls += 1;
        self.nodes.insert(
            id,
            SurfaceNode {
                geometry: geometry.clone(),
                fill,
                position,
            },
        );
    }

    fn set_position(&mut self, id: ShapeId, position: DVec2) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.position = position;
        }
    }

    fn detach(&mut self, id: ShapeId) {
        self.nodes.remove(&id);
    }
}
