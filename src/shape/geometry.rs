//! Per-kind vertex rules and the primitives handed to a [`Surface`](crate::Surface).
//!
//! All geometry is expressed in shape-local coordinates centred on the origin,
//! with y growing downwards like the canvas.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use glam::DVec2;
use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::SHAPE_SIZE;

pub const RANDOM_POLYGON_MIN_VERTICES: usize = 3;
pub const RANDOM_POLYGON_MAX_VERTICES: usize = 12;
pub const STAR_POINTS: usize = 5;

/// The fixed set of shapes a scene can spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ShapeKind {
    Circle,
    Square,
    Triangle,
    Pentagon,
    Hexagon,
    Ellipse,
    Star,
    /// Random vertices joined in generation order; the outline may cross itself.
    RandomPolygon,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 8] = [
        ShapeKind::Circle,
        ShapeKind::Square,
        ShapeKind::Triangle,
        ShapeKind::Pentagon,
        ShapeKind::Hexagon,
        ShapeKind::Ellipse,
        ShapeKind::Star,
        ShapeKind::RandomPolygon,
    ];

    /// Kinds with a fixed silhouette.
    pub const REGULAR: [ShapeKind; 7] = [
        ShapeKind::Circle,
        ShapeKind::Square,
        ShapeKind::Triangle,
        ShapeKind::Pentagon,
        ShapeKind::Hexagon,
        ShapeKind::Ellipse,
        ShapeKind::Star,
    ];

    pub fn is_polygonal(self) -> bool {
        !matches!(
            self,
            ShapeKind::Circle | ShapeKind::Square | ShapeKind::Ellipse
        )
    }

    /// Build the drawable geometry for this kind. Only `RandomPolygon`
    /// consumes randomness.
    pub fn geometry<R: Rng + ?Sized>(self, rng: &mut R) -> Geometry {
        let half = SHAPE_SIZE / 2.0;
        match self {
            ShapeKind::Circle => Geometry::Circle { radius: half },
            ShapeKind::Square => Geometry::Rect {
                width: SHAPE_SIZE,
                height: SHAPE_SIZE,
            },
            ShapeKind::Triangle => Geometry::Polygon(vec![
                DVec2::new(-half, half),
                DVec2::new(half, half),
                DVec2::new(0.0, -half),
            ]),
            // -pi/2 puts the first vertex straight up on a y-down canvas
            ShapeKind::Pentagon => Geometry::Polygon(regular_polygon(5, half, -FRAC_PI_2)),
            // a vertex at angle 0 leaves horizontal top and bottom edges
            ShapeKind::Hexagon => Geometry::Polygon(regular_polygon(6, half, 0.0)),
            ShapeKind::Ellipse => Geometry::Ellipse {
                radius_x: half,
                radius_y: half,
            },
            ShapeKind::Star => Geometry::Polygon(star(STAR_POINTS, half, half / 2.0)),
            ShapeKind::RandomPolygon => Geometry::Polygon(random_polygon(rng, SHAPE_SIZE)),
        }
    }
}

/// A filled primitive in shape-local coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Circle { radius: f64 },
    /// Centred on the origin.
    Rect { width: f64, height: f64 },
    Ellipse { radius_x: f64, radius_y: f64 },
    /// Closed outline, vertices in drawing order.
    Polygon(Vec<DVec2>),
}

impl Geometry {
    pub fn vertices(&self) -> &[DVec2] {
        match self {
            Geometry::Polygon(points) => points,
            _ => &[],
        }
    }

    pub fn local_bounds(&self) -> Bounds {
        match self {
            Geometry::Circle { radius } => Bounds::centered(*radius, *radius),
            Geometry::Rect { width, height } => Bounds::centered(width / 2.0, height / 2.0),
            Geometry::Ellipse { radius_x, radius_y } => Bounds::centered(*radius_x, *radius_y),
            Geometry::Polygon(points) => Bounds::from_points(points),
        }
    }
}

/// Axis-aligned box used for click hit-testing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl Bounds {
    fn centered(half_w: f64, half_h: f64) -> Self {
        Self {
            min: DVec2::new(-half_w, -half_h),
            max: DVec2::new(half_w, half_h),
        }
    }

    pub fn from_points(points: &[DVec2]) -> Self {
        let mut iter = points.iter();
        let Some(&first) = iter.next() else {
            return Self {
                min: DVec2::ZERO,
                max: DVec2::ZERO,
            };
        };
        iter.fold(
            Self {
                min: first,
                max: first,
            },
            |b, &p| Self {
                min: b.min.min(p),
                max: b.max.max(p),
            },
        )
    }

    pub fn translated(self, offset: DVec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Left/top edges are inside, right/bottom edges are not.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        if self.is_degenerate() {
            return false;
        }
        x >= self.min.x && x < self.max.x && y >= self.min.y && y < self.max.y
    }
}

fn regular_polygon(sides: usize, radius: f64, start_angle: f64) -> Vec<DVec2> {
    let step = TAU / sides as f64;
    (0..sides)
        .map(|i| polar(start_angle + step * i as f64, radius))
        .collect()
}

fn star(points: usize, outer: f64, inner: f64) -> Vec<DVec2> {
    let step = PI / points as f64;
    (0..points * 2)
        .map(|i| {
            let radius = if i % 2 == 0 { outer } else { inner };
            polar(step * i as f64, radius)
        })
        .collect()
}

fn random_polygon<R: Rng + ?Sized>(rng: &mut R, max_radius: f64) -> Vec<DVec2> {
    let count = rng.random_range(RANDOM_POLYGON_MIN_VERTICES..=RANDOM_POLYGON_MAX_VERTICES);
    (0..count)
        .map(|_| {
            let angle = rng.random_range(0.0..TAU);
            let radius = rng.random_range(0.0..=max_radius);
            polar(angle, radius)
        })
        .collect()
}

fn polar(angle: f64, radius: f64) -> DVec2 {
    DVec2::new(angle.cos(), angle.sin()) * radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    const EPS: f64 = 1e-9;

    #[test]
    fn star_alternates_outer_and_inner_radius() {
        let mut rng = SmallRng::seed_from_u64(1);
        let geometry = ShapeKind::Star.geometry(&mut rng);
        let vertices = geometry.vertices();
        assert_eq!(vertices.len(), 10);
        for (i, v) in vertices.iter().enumerate() {
            let expected = if i % 2 == 0 { 50.0 } else { 25.0 };
            assert!((v.length() - expected).abs() < EPS, "vertex {i} at {v:?}");
        }
    }

    #[test]
    fn pentagon_points_up() {
        let mut rng = SmallRng::seed_from_u64(1);
        let geometry = ShapeKind::Pentagon.geometry(&mut rng);
        let top = geometry.vertices()[0];
        assert!(top.x.abs() < EPS);
        assert!((top.y + 50.0).abs() < EPS);
        assert_eq!(geometry.vertices().len(), 5);
    }

    #[test]
    fn hexagon_has_flat_top() {
        let mut rng = SmallRng::seed_from_u64(1);
        let geometry = ShapeKind::Hexagon.geometry(&mut rng);
        let bounds = geometry.local_bounds();
        let on_top = geometry
            .vertices()
            .iter()
            .filter(|v| (v.y - bounds.min.y).abs() < EPS)
            .count();
        assert_eq!(geometry.vertices().len(), 6);
        assert_eq!(on_top, 2);
    }

    #[test]
    fn random_polygon_vertex_count_stays_in_range() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..500 {
            let geometry = ShapeKind::RandomPolygon.geometry(&mut rng);
            let n = geometry.vertices().len();
            assert!((RANDOM_POLYGON_MIN_VERTICES..=RANDOM_POLYGON_MAX_VERTICES).contains(&n));
            assert!(geometry.vertices().iter().all(|v| v.length() <= 100.0 + EPS));
        }
    }

    #[test]
    fn every_kind_has_non_degenerate_bounds() {
        let mut rng = SmallRng::seed_from_u64(7);
        for kind in ShapeKind::ALL {
            let geometry = kind.geometry(&mut rng);
            if kind.is_polygonal() {
                assert!(!geometry.vertices().is_empty(), "{kind:?}");
            }
            assert!(!geometry.local_bounds().is_degenerate(), "{kind:?}");
        }
    }

    #[test]
    fn bounds_contains_uses_half_open_edges() {
        let b = Bounds::centered(50.0, 50.0).translated(DVec2::new(100.0, 100.0));
        assert!(b.contains(50.0, 50.0));
        assert!(b.contains(100.0, 100.0));
        assert!(!b.contains(150.0, 100.0));
        assert!(!b.contains(100.0, 150.0));
        assert!(!b.contains(49.9, 100.0));
    }

    #[test]
    fn empty_bounds_contain_nothing() {
        let b = Bounds::from_points(&[]);
        assert!(b.is_degenerate());
        assert!(!b.contains(0.0, 0.0));
    }
}
