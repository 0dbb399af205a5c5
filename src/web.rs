//! Browser backend: a 2D canvas surface, `setInterval` spawn timer, the
//! animation-frame loop, pointer / keyboard listeners and the JS-facing
//! controls.
//!
//! The scene lives in a thread-local so every browser callback (interval,
//! animation frame, DOM events, exported controls) can reach it in turn.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::f64::consts::TAU;
use std::rc::Rc;

use glam::DVec2;
use log::{error, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, Document, HtmlCanvasElement, KeyboardEvent, MouseEvent, window,
};

use crate::config::SceneConfig;
use crate::error::SceneError;
use crate::scene::{Scene, TimerHost};
use crate::shape::{Color, Geometry, ShapeId};
use crate::surface::{Surface, SurfaceNode};

const METRICS_OVERLAY_ID: &str = "fs-metrics";

// --- Canvas surface ---------------------------------------------------------

/// Retained display list painted onto a 2D canvas once per animation frame.
/// Children are painted in attach order, so newer shapes sit on top.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    background: Color,
    nodes: Vec<(ShapeId, SurfaceNode)>,
}

impl CanvasSurface {
    pub fn new(
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        background: Color,
    ) -> Self {
        Self {
            canvas,
            ctx,
            background,
            nodes: Vec::new(),
        }
    }

    pub fn render(&self) {
        let ctx = &self.ctx;
        ctx.set_fill_style_str(&self.background.to_css());
        ctx.fill_rect(0.0, 0.0, self.width(), self.height());

        for (_, node) in &self.nodes {
            ctx.set_fill_style_str(&node.fill.to_css());
            let p = node.position;
            match &node.geometry {
                Geometry::Circle { radius } => {
                    ctx.begin_path();
                    ctx.arc(p.x, p.y, *radius, 0.0, TAU).ok();
                    ctx.fill();
                }
                Geometry::Rect { width, height } => {
                    ctx.fill_rect(p.x - width / 2.0, p.y - height / 2.0, *width, *height);
                }
                Geometry::Ellipse { radius_x, radius_y } => {
                    ctx.begin_path();
                    ctx.ellipse(p.x, p.y, *radius_x, *radius_y, 0.0, 0.0, TAU).ok();
                    ctx.fill();
                }
                Geometry::Polygon(points) => {
                    ctx.begin_path();
                    for (i, v) in points.iter().enumerate() {
                        let q = p + *v;
                        if i == 0 {
                            ctx.move_to(q.x, q.y);
                        } else {
                            ctx.line_to(q.x, q.y);
                        }
                    }
                    ctx.close_path();
                    ctx.fill();
                }
            }
        }
    }

    /// Shape ids in paint order, bottom first.
    pub fn paint_order(&self) -> Vec<ShapeId> {
        self.nodes.iter().map(|(id, _)| *id).collect()
    }

    pub fn node(&self, id: ShapeId) -> Option<&SurfaceNode> {
        self.nodes.iter().find(|(nid, _)| *nid == id).map(|(_, node)| node)
    }
}

impl Surface for CanvasSurface {
    fn width(&self) -> f64 {
        self.canvas.width() as f64
    }

    fn height(&self) -> f64 {
        self.canvas.height() as f64
    }

    fn attach(&mut self, id: ShapeId, geometry: &Geometry, fill: Color, position: DVec2) {
        self.detach(id);
        self.nodes.push((
            id,
            SurfaceNode {
                geometry: geometry.clone(),
                fill,
                position,
            },
        ));
    }

    fn set_position(&mut self, id: ShapeId, position: DVec2) {
        if let Some((_, node)) = self.nodes.iter_mut().find(|(nid, _)| *nid == id) {
            node.position = position;
        }
    }

    fn detach(&mut self, id: ShapeId) {
        self.nodes.retain(|(nid, _)| *nid != id);
    }
}

// --- Interval timer ---------------------------------------------------------

/// `setInterval` timer host. Owns the interval closures so cancelling a
/// schedule also frees its callback.
#[derive(Default)]
pub struct WebTimers {
    intervals: HashMap<i32, Closure<dyn FnMut()>>,
}

impl WebTimers {
    /// Intervals still holding a live callback.
    pub fn active_count(&self) -> usize {
        self.intervals.len()
    }
}

impl TimerHost for WebTimers {
    type Handle = i32;

    fn schedule(&mut self, period_ms: u32, generation: u64) -> Result<i32, SceneError> {
        let win = window().ok_or(SceneError::NoWindow)?;
        let closure = Closure::wrap(Box::new(move || {
            if with_scene(|scene| scene.on_spawn_timer(generation)).is_none() {
                warn!("spawn tick (gen {generation}) fired without a scene");
            }
        }) as Box<dyn FnMut()>);
        let timeout = i32::try_from(period_ms).unwrap_or(i32::MAX);
        let handle = win
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                timeout,
            )
            .map_err(|e| SceneError::Timer(format!("{e:?}")))?;
        self.intervals.insert(handle, closure);
        Ok(handle)
    }

    fn cancel(&mut self, handle: i32) {
        if let Some(win) = window() {
            win.clear_interval_with_handle(handle);
        }
        self.intervals.remove(&handle);
    }
}

// --- Scene slot ---------------------------------------------------------------

type WebScene = Scene<CanvasSurface, WebTimers>;

/// DOM listeners installed for the running scene; removed on teardown.
struct Listeners {
    canvas: HtmlCanvasElement,
    document: Document,
    click: Closure<dyn FnMut(MouseEvent)>,
    keydown: Closure<dyn FnMut(KeyboardEvent)>,
}

impl Listeners {
    fn detach(self) {
        self.canvas
            .remove_event_listener_with_callback("click", self.click.as_ref().unchecked_ref())
            .ok();
        self.document
            .remove_event_listener_with_callback("keydown", self.keydown.as_ref().unchecked_ref())
            .ok();
    }
}

thread_local! {
    static SCENE: RefCell<Option<WebScene>> = const { RefCell::new(None) };
    static LISTENERS: RefCell<Option<Listeners>> = const { RefCell::new(None) };
    // Bumped on every mount / teardown; a frame loop exits once it is stale.
    static FRAME_LOOP: Cell<u64> = const { Cell::new(0) };
}

/// Run `f` against the live scene. `None` if there is no scene or it is
/// already borrowed further up the stack.
fn with_scene<R>(f: impl FnOnce(&mut WebScene) -> R) -> Option<R> {
    SCENE.with(|cell| {
        let mut guard = cell.try_borrow_mut().ok()?;
        guard.as_mut().map(f)
    })
}

// --- Entry points -------------------------------------------------------------

/// Mount the scene on `#shapes-canvas` (created if missing) with default settings.
#[wasm_bindgen]
pub fn start_scene() -> Result<(), JsValue> {
    mount(SceneConfig::default())?;
    Ok(())
}

/// Like [`start_scene`] with a JSON [`SceneConfig`]; missing fields take defaults.
#[cfg(feature = "serde_json")]
#[wasm_bindgen]
pub fn start_scene_with_config(json: &str) -> Result<(), JsValue> {
    let config = SceneConfig::from_json(json)?;
    mount(config)?;
    Ok(())
}

/// Tear the scene down: cancel the spawn timer, stop the frame loop, remove
/// the DOM listeners and drop the metrics overlay.
#[wasm_bindgen]
pub fn stop_scene() {
    FRAME_LOOP.with(|id| id.set(id.get() + 1));
    if let Some(listeners) = LISTENERS.with(|l| l.borrow_mut().take()) {
        listeners.detach();
    }
    let scene = SCENE.with(|cell| cell.borrow_mut().take());
    if let Some(mut scene) = scene {
        scene.stop();
        scene.surface().render();
    }
    if let Some(el) = window()
        .and_then(|w| w.document())
        .and_then(|doc| doc.get_element_by_id(METRICS_OVERLAY_ID))
    {
        el.remove();
    }
}

#[wasm_bindgen]
pub fn increase_gravity() {
    with_scene(|scene| scene.set_gravity(1));
}

#[wasm_bindgen]
pub fn decrease_gravity() {
    with_scene(|scene| scene.set_gravity(-1));
}

#[wasm_bindgen]
pub fn increase_shapes_per_second() -> Result<(), JsValue> {
    adjust_spawn_rate(1)
}

#[wasm_bindgen]
pub fn decrease_shapes_per_second() -> Result<(), JsValue> {
    adjust_spawn_rate(-1)
}

#[wasm_bindgen]
pub fn shapes_on_screen() -> u32 {
    with_scene(|scene| scene.shapes_on_screen() as u32).unwrap_or(0)
}

#[wasm_bindgen]
pub fn shapes_area() -> f64 {
    with_scene(|scene| scene.shapes_area() as f64).unwrap_or(0.0)
}

#[wasm_bindgen]
pub fn gravity() -> u32 {
    with_scene(|scene| scene.gravity()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn shapes_per_second() -> u32 {
    with_scene(|scene| scene.shapes_per_second()).unwrap_or(0)
}

fn adjust_spawn_rate(delta: i32) -> Result<(), JsValue> {
    match with_scene(|scene| scene.set_spawn_rate(delta)) {
        Some(Err(e)) => {
            error!("spawn rate change failed: {e}");
            Err(e.into())
        }
        _ => Ok(()),
    }
}

fn mount(config: SceneConfig) -> Result<(), SceneError> {
    stop_scene();

    let win = window().ok_or(SceneError::NoWindow)?;
    let doc = win.document().ok_or(SceneError::NoDocument)?;

    let canvas: HtmlCanvasElement = match doc.get_element_by_id(&config.canvas_id) {
        Some(el) => el
            .dyn_into()
            .map_err(|_| SceneError::Canvas(format!("#{} is not a canvas", config.canvas_id)))?,
        None => {
            let c: HtmlCanvasElement = doc
                .create_element("canvas")
                .map_err(|e| SceneError::Canvas(format!("{e:?}")))?
                .dyn_into()
                .map_err(|_| SceneError::Canvas("created element is not a canvas".into()))?;
            c.set_id(&config.canvas_id);
            let body = doc.body().ok_or(SceneError::NoDocument)?;
            body.append_child(&c)
                .map_err(|e| SceneError::Canvas(format!("{e:?}")))?;
            c
        }
    };
    let width = config.surface_width.unwrap_or_else(|| {
        win.inner_width()
            .ok()
            .and_then(|w| w.as_f64())
            .map_or(800, |w| w as u32)
    });
    canvas.set_width(width);
    canvas.set_height(config.surface_height);

    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")
        .ok()
        .flatten()
        .ok_or(SceneError::NoContext)?
        .dyn_into()
        .map_err(|_| SceneError::NoContext)?;

    // Seed from the high-resolution clock; shapes only need to look random.
    let seed = win
        .performance()
        .map(|p| p.now().to_bits())
        .unwrap_or(0x5eed);
    let surface = CanvasSurface::new(canvas.clone(), ctx, Color::new(config.background));
    let scene = Scene::new(config, surface, WebTimers::default(), seed);
    SCENE.with(|cell| cell.replace(Some(scene)));

    if let Some(Err(e)) = with_scene(|scene| scene.start()) {
        stop_scene();
        return Err(e);
    }

    ensure_metrics_overlay(&doc)?;
    let listeners = install_listeners(canvas.clone(), doc)?;
    LISTENERS.with(|l| l.replace(Some(listeners)));
    start_frame_loop();
    info!("scene mounted on {}x{} canvas", canvas.width(), canvas.height());
    Ok(())
}

fn install_listeners(
    canvas: HtmlCanvasElement,
    document: Document,
) -> Result<Listeners, SceneError> {
    // offset_x / offset_y are already relative to the canvas
    let click = Closure::wrap(Box::new(move |evt: MouseEvent| {
        let (x, y) = (evt.offset_x() as f64, evt.offset_y() as f64);
        with_scene(|scene| scene.handle_click(x, y));
    }) as Box<dyn FnMut(MouseEvent)>);
    canvas
        .add_event_listener_with_callback("click", click.as_ref().unchecked_ref())
        .map_err(|e| SceneError::Listener {
            event: "click",
            reason: format!("{e:?}"),
        })?;

    let keydown = Closure::wrap(Box::new(move |evt: KeyboardEvent| {
        let key = evt.key();
        match key.as_str() {
            "ArrowUp" => increase_gravity(),
            "ArrowDown" => decrease_gravity(),
            "+" | "=" => {
                increase_shapes_per_second().ok();
            }
            "-" | "_" => {
                decrease_shapes_per_second().ok();
            }
            _ => {}
        }
    }) as Box<dyn FnMut(KeyboardEvent)>);
    document
        .add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())
        .map_err(|e| SceneError::Listener {
            event: "keydown",
            reason: format!("{e:?}"),
        })?;

    Ok(Listeners {
        canvas,
        document,
        click,
        keydown,
    })
}

fn ensure_metrics_overlay(doc: &Document) -> Result<(), SceneError> {
    if doc.get_element_by_id(METRICS_OVERLAY_ID).is_some() {
        return Ok(());
    }
    let Some(body) = doc.body() else {
        return Ok(());
    };
    let div = doc
        .create_element("div")
        .map_err(|e| SceneError::Canvas(format!("{e:?}")))?;
    div.set_id(METRICS_OVERLAY_ID);
    div.set_attribute("style", "position:fixed; top:10px; left:12px; font-family:'Fira Code', monospace; font-size:15px; padding:4px 8px; background:rgba(0,0,0,0.42); border:1px solid #333; border-radius:6px; color:#ffd166; z-index:45; letter-spacing:0.5px;").ok();
    body.append_child(&div)
        .map_err(|e| SceneError::Canvas(format!("{e:?}")))?;
    Ok(())
}

fn update_metrics_overlay(scene: &WebScene) {
    let Some(doc) = window().and_then(|w| w.document()) else {
        return;
    };
    if let Some(el) = doc.get_element_by_id(METRICS_OVERLAY_ID) {
        el.set_text_content(Some(&format!(
            "Shapes: {}  Area: {}  Gravity: {}  Rate: {}/s",
            scene.shapes_on_screen(),
            scene.shapes_area(),
            scene.gravity(),
            scene.shapes_per_second()
        )));
    }
}

// --- Frame loop ---------------------------------------------------------------

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn start_frame_loop() {
    let loop_id = FRAME_LOOP.with(|id| {
        id.set(id.get() + 1);
        id.get()
    });
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |_ts: f64| {
        // superseded by a newer mount or a teardown; break the Rc cycle so
        // this closure is freed once it returns
        if FRAME_LOOP.with(Cell::get) != loop_id {
            let _ = f.borrow_mut().take();
            return;
        }
        with_scene(|scene| {
            scene.on_frame();
            scene.surface().render();
            update_metrics_overlay(scene);
        });
        request_frame(&f);
    }) as Box<dyn FnMut(f64)>));
    request_frame(&g);
}

fn request_frame(f: &FrameCallback) {
    let Some(win) = window() else { return };
    if let Some(cb) = f.borrow().as_ref() {
        win.request_animation_frame(cb.as_ref().unchecked_ref()).ok();
    }
}
