// Per-kind shape invariants exercised through the public API.
// Native-friendly: uses the headless surface only.

use std::sync::mpsc;

use falling_shapes::shape::{RANDOM_POLYGON_MAX_VERTICES, RANDOM_POLYGON_MIN_VERTICES};
use falling_shapes::{Color, Geometry, HeadlessSurface, Shape, ShapeId, ShapeKind};
use glam::DVec2;
use rand::SeedableRng;
use rand::rngs::SmallRng;

#[test]
fn every_kind_draws_something_hit_testable() {
    let mut rng = SmallRng::seed_from_u64(99);
    let mut surface = HeadlessSurface::new(800.0, 600.0);
    let (tx, _rx) = mpsc::channel();
    for (i, kind) in ShapeKind::ALL.into_iter().enumerate() {
        let id = ShapeId(i as u64);
        let mut shape = Shape::create(id, kind, tx.clone());
        shape.draw(Color::new(0xff8800), DVec2::new(300.0, 300.0), &mut surface, &mut rng);

        let node = surface.node(id).expect("attached after draw");
        match &node.geometry {
            Geometry::Polygon(points) => assert!(!points.is_empty(), "{kind:?}"),
            Geometry::Circle { radius } => assert!(*radius > 0.0),
            Geometry::Rect { width, height } => assert!(*width > 0.0 && *height > 0.0),
            Geometry::Ellipse { radius_x, radius_y } => assert!(*radius_x > 0.0 && *radius_y > 0.0),
        }
        let bounds = shape.bounds().expect("live drawn shape has bounds");
        assert!(bounds.width() > 0.0 && bounds.height() > 0.0, "{kind:?}");
    }
    assert_eq!(surface.attached_count(), ShapeKind::ALL.len());
}

#[test]
fn star_has_ten_vertices_for_every_draw() {
    let mut rng = SmallRng::seed_from_u64(5);
    for _ in 0..10 {
        let geometry = ShapeKind::Star.geometry(&mut rng);
        assert_eq!(geometry.vertices().len(), 10);
    }
}

#[test]
fn random_polygons_cover_the_whole_vertex_range() {
    let mut rng = SmallRng::seed_from_u64(17);
    let mut seen = [false; RANDOM_POLYGON_MAX_VERTICES + 1];
    for _ in 0..2000 {
        let n = ShapeKind::RandomPolygon.geometry(&mut rng).vertices().len();
        assert!((RANDOM_POLYGON_MIN_VERTICES..=RANDOM_POLYGON_MAX_VERTICES).contains(&n));
        seen[n] = true;
    }
    for n in RANDOM_POLYGON_MIN_VERTICES..=RANDOM_POLYGON_MAX_VERTICES {
        assert!(seen[n], "never produced a {n}-gon");
    }
}

#[test]
fn removal_is_idempotent_for_every_kind() {
    let mut rng = SmallRng::seed_from_u64(1);
    let mut surface = HeadlessSurface::new(800.0, 600.0);
    let (tx, rx) = mpsc::channel();
    for (i, kind) in ShapeKind::ALL.into_iter().enumerate() {
        let mut shape = Shape::create(ShapeId(i as u64), kind, tx.clone());
        shape.draw(Color::new(0x00ff00), DVec2::new(100.0, 100.0), &mut surface, &mut rng);
        assert!(shape.remove(&mut surface));
        assert!(!shape.remove(&mut surface));
        assert!(!shape.is_alive());
        assert!(!shape.is_on_canvas(600.0));
    }
    assert_eq!(rx.try_iter().count(), ShapeKind::ALL.len());
    assert_eq!(surface.attached_count(), 0);
}

#[test]
fn gravity_accumulates_exactly_per_tick() {
    let mut rng = SmallRng::seed_from_u64(2);
    let mut surface = HeadlessSurface::new(800.0, 600.0);
    let (tx, _rx) = mpsc::channel();
    let mut shape = Shape::create(ShapeId(0), ShapeKind::Circle, tx);
    shape.draw(Color::new(0), DVec2::new(400.0, -100.0), &mut surface, &mut rng);
    let mut expected = -100.0;
    for gravity in (1..=9).cycle().take(100) {
        shape.tick(gravity, &mut surface);
        expected += f64::from(gravity);
        assert_eq!(shape.position().y, expected);
    }
}
