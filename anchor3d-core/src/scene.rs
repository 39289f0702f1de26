/// Scene-side collaborator: active camera, viewport and render notifications
use std::cell::{Cell, RefCell};

use tracing::trace;

use crate::observable::Observable;
use crate::projection::{Camera, CameraState, Viewport};

/// What a label needs from the rendering engine
pub trait SceneHost {
    fn active_camera(&self) -> Option<CameraState>;

    /// Current render surface size; read on every projection
    fn viewport(&self) -> Viewport;

    /// Fired once per frame before rendering
    fn on_before_render(&self) -> &Observable;

    /// Fired when the active camera's view matrix changes
    fn on_camera_view_changed(&self) -> &Observable;
}

/// Minimal single-camera scene driving the render loop notifications
#[derive(Debug)]
pub struct Scene {
    camera: RefCell<Option<Camera>>,
    viewport: Cell<Viewport>,
    before_render: Observable,
    view_changed: Observable,
}

impl Scene {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            camera: RefCell::new(None),
            viewport: Cell::new(viewport),
            before_render: Observable::new(),
            view_changed: Observable::new(),
        }
    }

    pub fn with_camera(camera: Camera, viewport: Viewport) -> Self {
        let scene = Self::new(viewport);
        *scene.camera.borrow_mut() = Some(camera);
        scene
    }

    pub fn camera(&self) -> Option<Camera> {
        self.camera.borrow().clone()
    }

    /// Replace the active camera, notifying view listeners if the view changed
    pub fn set_camera(&self, camera: Option<Camera>) {
        let changed = {
            let mut slot = self.camera.borrow_mut();
            let before = slot.as_ref().map(Camera::view_matrix);
            *slot = camera;
            before != slot.as_ref().map(Camera::view_matrix)
        };
        if changed {
            self.view_changed.notify();
        }
    }

    /// Mutate the active camera in place. Does nothing without a camera.
    pub fn update_camera(&self, update: impl FnOnce(&mut Camera)) {
        let Some(mut camera) = self.camera() else {
            return;
        };
        update(&mut camera);
        self.set_camera(Some(camera));
    }

    /// Change the render surface size and keep the camera aspect in sync
    pub fn resize(&self, width: u32, height: u32) {
        let viewport = Viewport::new(width, height);
        self.viewport.set(viewport);
        if let Some(camera) = self.camera.borrow_mut().as_mut() {
            camera.aspect = viewport.aspect();
        }
        trace!(width, height, "scene resized");
    }

    /// Run one frame of the render loop
    pub fn render(&self) {
        self.before_render.notify();
    }
}

impl SceneHost for Scene {
    fn active_camera(&self) -> Option<CameraState> {
        self.camera.borrow().as_ref().map(Camera::state)
    }

    fn viewport(&self) -> Viewport {
        self.viewport.get()
    }

    fn on_before_render(&self) -> &Observable {
        &self.before_render
    }

    fn on_camera_view_changed(&self) -> &Observable {
        &self.view_changed
    }
}
