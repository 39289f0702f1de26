/// anchor3d Core Library - Screen-anchored overlay labels for 3D scenes
///
/// This library projects scene nodes into screen space and keeps DOM-like
/// overlay elements pinned to them, frame by frame. The rendering engine and
/// the document are injected through the [`SceneHost`] and
/// [`OverlayDocument`] traits.

pub mod anchor;
pub mod error;
pub mod geometry;
pub mod observable;
pub mod overlay;
pub mod projection;
pub mod scene;
pub mod transform;

// Re-export commonly used types
pub use anchor::{LabelAnchor, LabelOptions, UpdateMode};
pub use error::LabelError;
pub use geometry::{Mesh, Ray, Triangle, Vertex};
pub use observable::{Observable, Subscription};
pub use overlay::{HeadlessDocument, HeadlessElement, OverlayDocument, OverlayElement};
pub use projection::{
    is_behind_camera, project, scale_factor, Camera, CameraState, ProjectionMode, ScreenPosition,
    Viewport, OFFSCREEN,
};
pub use scene::{Scene, SceneHost};
pub use transform::{RotationState, Transform, TransformNode};
