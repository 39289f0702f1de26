/// Overlay labels pinned to a point in the 3D scene
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::error::LabelError;
use crate::observable::Subscription;
use crate::overlay::{
    placement_transform, root_css_text, OverlayDocument, OverlayElement, CENTER_TRANSFORM,
};
use crate::projection::{project, ScreenPosition};
use crate::scene::SceneHost;
use crate::transform::TransformNode;

/// When a label re-projects itself. Both modes also follow viewport resizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// Every render-loop tick. Tracks any node or camera motion.
    #[default]
    PerFrame,
    /// Only when the camera view changes, plus once on creation.
    ///
    /// A node that moves while the camera stays still is not followed;
    /// call [`LabelAnchor::refresh`] after moving it.
    OnCameraMove,
}

/// Construction options for [`LabelAnchor`]
#[derive(Debug, Clone)]
pub struct LabelOptions<E> {
    /// Caller-owned element shown inside the label
    pub content: E,
    /// Offset the content by half its own size
    pub center: bool,
    pub update_mode: UpdateMode,
    /// Tag of the root element, `div` when unset
    pub tag: Option<String>,
    /// Enables distance attenuation of the label scale
    pub distance_factor: Option<f32>,
    /// Node to track; a fresh root-level node is created when unset
    pub node: Option<Rc<TransformNode>>,
}

impl<E> LabelOptions<E> {
    pub fn new(content: E) -> Self {
        Self {
            content,
            center: false,
            update_mode: UpdateMode::default(),
            tag: None,
            distance_factor: None,
            node: None,
        }
    }

    pub fn centered(mut self, center: bool) -> Self {
        self.center = center;
        self
    }

    pub fn update_mode(mut self, mode: UpdateMode) -> Self {
        self.update_mode = mode;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn distance_factor(mut self, factor: f32) -> Self {
        self.distance_factor = Some(factor);
        self
    }

    pub fn node(mut self, node: Rc<TransformNode>) -> Self {
        self.node = Some(node);
        self
    }
}

/// An overlay element kept at the screen projection of a scene node.
///
/// The anchor owns its root element and borrows the caller's content
/// element. [`dispose`](Self::dispose) must be called to detach both and to
/// cancel the frame, camera and resize subscriptions; dropping an anchor
/// without disposing leaves its callbacks registered.
pub struct LabelAnchor<D: OverlayDocument> {
    name: String,
    node: Rc<TransformNode>,
    root: D::Element,
    content: D::Element,
    update_mode: UpdateMode,
    distance_factor: Option<f32>,
    scene: Weak<dyn SceneHost>,
    subscriptions: Vec<Subscription>,
    disposed: bool,
}

impl<D: OverlayDocument> LabelAnchor<D> {
    /// Create the label, place it once and start tracking.
    ///
    /// Fails with [`LabelError::NoActiveCamera`] before touching the
    /// document if the scene has no camera.
    pub fn new<S: SceneHost + 'static>(
        name: impl Into<String>,
        options: LabelOptions<D::Element>,
        scene: &Rc<S>,
        document: &D,
    ) -> Result<Self, LabelError> {
        let name = name.into();
        let camera = scene.active_camera().ok_or(LabelError::NoActiveCamera)?;

        let node = options
            .node
            .unwrap_or_else(|| TransformNode::new(name.clone()));
        let root = document.create_element(options.tag.as_deref().unwrap_or("div"))?;

        document.append_to_body(&root);
        root.append_child(&options.content);

        let initial = project(
            &node.absolute_position(),
            &camera,
            scene.viewport(),
            options.distance_factor,
        );
        root.set_css_text(&root_css_text(&initial));
        if options.center {
            options.content.set_style("transform", CENTER_TRANSFORM);
        }

        let scene: Rc<dyn SceneHost> = scene.clone();
        let mut anchor = Self {
            name,
            node,
            root,
            content: options.content,
            update_mode: options.update_mode,
            distance_factor: options.distance_factor,
            scene: Rc::downgrade(&scene),
            subscriptions: Vec::with_capacity(2),
            disposed: false,
        };
        anchor.subscribe(scene.as_ref(), document);

        debug!(label = %anchor.name, mode = ?anchor.update_mode, "label attached");
        Ok(anchor)
    }

    fn subscribe(&mut self, scene: &dyn SceneHost, document: &D) {
        let refresh = self.refresh_callback();

        let on_resize = refresh.clone();
        self.subscriptions
            .push(document.on_resize().add(move || on_resize()));

        match self.update_mode {
            UpdateMode::PerFrame => {
                self.subscriptions
                    .push(scene.on_before_render().add(move || refresh()));
            }
            UpdateMode::OnCameraMove => {
                refresh();
                self.subscriptions
                    .push(scene.on_camera_view_changed().add(move || refresh()));
            }
        }
    }

    fn refresh_callback(&self) -> Rc<dyn Fn()> {
        let name = self.name.clone();
        let scene = self.scene.clone();
        let node = self.node.clone();
        let root = self.root.clone();
        let distance_factor = self.distance_factor;

        Rc::new(move || {
            let Some(scene) = scene.upgrade() else {
                warn!(label = %name, "scene dropped before label was disposed");
                return;
            };
            if let Some(position) = project_node(scene.as_ref(), &node, distance_factor) {
                trace!(
                    label = %name,
                    x = position.x,
                    y = position.y,
                    scale = position.scale,
                    "label projected"
                );
                root.set_style("transform", &placement_transform(&position));
            }
        })
    }

    /// Re-project now, outside the regular update schedule.
    /// No-op once disposed.
    pub fn refresh(&self) {
        if self.disposed {
            return;
        }
        self.refresh_callback()();
    }

    /// Where the label would be placed with the current scene state.
    ///
    /// `None` if the scene is gone or has no active camera.
    pub fn screen_position(&self) -> Option<ScreenPosition> {
        let scene = self.scene.upgrade()?;
        project_node(scene.as_ref(), &self.node, self.distance_factor)
    }

    /// Detach both elements and cancel every subscription. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        for subscription in self.subscriptions.drain(..) {
            subscription.cancel();
        }
        self.content.remove();
        self.root.remove();

        debug!(label = %self.name, "label disposed");
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tracked node; set its position, rotation or parent to move the label
    pub fn node(&self) -> &Rc<TransformNode> {
        &self.node
    }

    pub fn root(&self) -> &D::Element {
        &self.root
    }

    pub fn content(&self) -> &D::Element {
        &self.content
    }

    pub fn update_mode(&self) -> UpdateMode {
        self.update_mode
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

fn project_node(
    scene: &dyn SceneHost,
    node: &TransformNode,
    distance_factor: Option<f32>,
) -> Option<ScreenPosition> {
    let camera = scene.active_camera()?;
    Some(project(
        &node.absolute_position(),
        &camera,
        scene.viewport(),
        distance_factor,
    ))
}
