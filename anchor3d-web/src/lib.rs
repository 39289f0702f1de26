/// anchor3d Web - DOM overlay backend for browsers
///
/// Implements the overlay traits over `web-sys` so labels become real HTML
/// elements, and exports a small demo scene to JavaScript. JS owns the render
/// loop and calls `tick` from `requestAnimationFrame`.
use std::rc::Rc;

use anchor3d_core::{
    Camera, LabelAnchor, LabelError, LabelOptions, Observable, OverlayDocument, OverlayElement,
    RotationState, Scene, Subscription, TransformNode, UpdateMode, Viewport,
};
use nalgebra::{Point3, Vector3};
use tracing::warn;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

/// Window inner size in CSS pixels
fn window_viewport(window: &web_sys::Window) -> Viewport {
    let dimension = |value: Result<JsValue, JsValue>| {
        value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as u32
    };
    Viewport::new(dimension(window.inner_width()), dimension(window.inner_height()))
}

fn overlay_error(context: &str, err: JsValue) -> LabelError {
    LabelError::Overlay(format!("{context}: {err:?}"))
}

/// A DOM element used as label root or content
#[derive(Debug, Clone)]
pub struct DomElement(HtmlElement);

impl DomElement {
    pub fn new(element: HtmlElement) -> Self {
        Self(element)
    }

    pub fn html(&self) -> &HtmlElement {
        &self.0
    }
}

impl OverlayElement for DomElement {
    fn set_css_text(&self, css: &str) {
        self.0.style().set_css_text(css);
    }

    fn set_style(&self, property: &str, value: &str) {
        if let Err(err) = self.0.style().set_property(property, value) {
            warn!(property, ?err, "style write rejected");
        }
    }

    fn append_child(&self, child: &Self) {
        if let Err(err) = self.0.append_child(&child.0) {
            warn!(?err, "append_child failed");
        }
    }

    fn remove(&self) {
        self.0.remove();
    }
}

/// The browser document plus a `window` resize listener
pub struct DomDocument {
    window: web_sys::Window,
    document: web_sys::Document,
    resize: Observable,
    resize_listener: Closure<dyn FnMut()>,
}

impl DomDocument {
    pub fn new() -> Result<Self, LabelError> {
        let window = web_sys::window().ok_or_else(|| LabelError::Overlay("no window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| LabelError::Overlay("no document".into()))?;

        let resize = Observable::new();
        let notify = resize.clone();
        let resize_listener = Closure::<dyn FnMut()>::new(move || notify.notify());
        window
            .add_event_listener_with_callback("resize", resize_listener.as_ref().unchecked_ref())
            .map_err(|err| overlay_error("resize listener", err))?;

        Ok(Self {
            window,
            document,
            resize,
            resize_listener,
        })
    }

    pub fn viewport(&self) -> Viewport {
        window_viewport(&self.window)
    }
}

impl Drop for DomDocument {
    fn drop(&mut self) {
        let _ = self.window.remove_event_listener_with_callback(
            "resize",
            self.resize_listener.as_ref().unchecked_ref(),
        );
    }
}

impl OverlayDocument for DomDocument {
    type Element = DomElement;

    fn create_element(&self, tag: &str) -> Result<Self::Element, LabelError> {
        let element = self
            .document
            .create_element(tag)
            .map_err(|err| overlay_error("create_element", err))?;
        let element = element
            .dyn_into::<HtmlElement>()
            .map_err(|_| LabelError::Overlay(format!("<{tag}> is not an HTML element")))?;
        Ok(DomElement(element))
    }

    fn append_to_body(&self, element: &Self::Element) {
        let Some(body) = self.document.body() else {
            warn!("document has no body");
            return;
        };
        if let Err(err) = body.append_child(&element.0) {
            warn!(?err, "append to body failed");
        }
    }

    fn on_resize(&self) -> &Observable {
        &self.resize
    }
}

/// Demo scene for the browser: one camera, one node and its label
#[wasm_bindgen]
pub struct WebLabelDemo {
    scene: Rc<Scene>,
    node: Rc<TransformNode>,
    label: LabelAnchor<DomDocument>,
    viewport_sync: Option<Subscription>,
    // Dropped last so the window listener outlives the label
    document: DomDocument,
}

#[wasm_bindgen]
impl WebLabelDemo {
    /// Pin `content` to a node at the origin, seen from a camera at z = -4
    #[wasm_bindgen(constructor)]
    pub fn new(
        content: HtmlElement,
        center: bool,
        distance_factor: Option<f32>,
        camera_move_only: bool,
    ) -> Result<WebLabelDemo, JsValue> {
        let document = DomDocument::new().map_err(to_js)?;
        let viewport = document.viewport();
        let camera = Camera::looking_at(
            Point3::new(0.0, 0.0, -4.0),
            Point3::origin(),
            0.8,
            viewport,
        );
        let scene = Rc::new(Scene::with_camera(camera, viewport));

        // Registered before the label so the scene is resized before it re-projects
        let viewport_sync = {
            let scene = Rc::downgrade(&scene);
            let window = document.window.clone();
            document.on_resize().add(move || {
                if let Some(scene) = scene.upgrade() {
                    let viewport = window_viewport(&window);
                    scene.resize(viewport.width, viewport.height);
                }
            })
        };

        let node = TransformNode::new("html-node");
        let mut options = LabelOptions::new(DomElement::new(content))
            .centered(center)
            .node(node.clone());
        if let Some(factor) = distance_factor {
            options = options.distance_factor(factor);
        }
        if camera_move_only {
            options = options.update_mode(UpdateMode::OnCameraMove);
        }

        let label = LabelAnchor::new("html-node", options, &scene, &document).map_err(to_js)?;

        Ok(WebLabelDemo {
            scene,
            node,
            label,
            viewport_sync: Some(viewport_sync),
            document,
        })
    }

    /// Run one frame; call from `requestAnimationFrame`
    pub fn tick(&self) {
        self.scene.render();
    }

    pub fn set_node_position(&self, x: f32, y: f32, z: f32) {
        self.node.set_position(Point3::new(x, y, z));
    }

    pub fn set_node_rotation(&self, x: f32, y: f32, z: f32) {
        self.node.set_rotation(RotationState::new(x, y, z));
    }

    pub fn move_camera(&self, dx: f32, dy: f32, dz: f32) {
        let delta = Vector3::new(dx, dy, dz);
        self.scene.update_camera(|camera| {
            camera.position += delta;
            camera.target += delta;
        });
    }

    /// Force a re-projection, e.g. after moving the node in camera-move-only mode
    pub fn refresh(&self) {
        self.label.refresh();
    }

    /// Remove the label from the page and stop all updates
    pub fn dispose(&mut self) {
        self.label.dispose();
        if let Some(subscription) = self.viewport_sync.take() {
            subscription.cancel();
        }
    }
}

fn to_js(err: LabelError) -> JsValue {
    JsValue::from_str(&err.to_string())
}
