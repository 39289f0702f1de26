/// 3D transformation matrices, rotation state and scene nodes
use nalgebra::{Matrix4, Point3, Vector3};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::warn;

/// Rotation state around three axes (in radians)
#[derive(Debug, Clone, Copy)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::zero()
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Create a rotation matrix from a rotation state
    pub fn rotation_matrix(rotation: &RotationState) -> Matrix4<f32> {
        let rx = Matrix4::new_rotation(Vector3::new(rotation.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, rotation.y, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, rotation.z));

        // Apply rotations in order: Z, Y, X
        rz * ry * rx
    }

    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }
}

/// A named node in a transform hierarchy.
///
/// Nodes are shared (`Rc`) between the application and the labels or meshes
/// attached to them; position and rotation use interior mutability so the
/// application can animate a node while a label tracks it.
#[derive(Debug)]
pub struct TransformNode {
    name: String,
    position: Cell<Point3<f32>>,
    rotation: Cell<RotationState>,
    parent: RefCell<Option<Rc<TransformNode>>>,
}

impl TransformNode {
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            position: Cell::new(Point3::origin()),
            rotation: Cell::new(RotationState::zero()),
            parent: RefCell::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Point3<f32> {
        self.position.get()
    }

    pub fn set_position(&self, position: Point3<f32>) {
        self.position.set(position);
    }

    pub fn rotation(&self) -> RotationState {
        self.rotation.get()
    }

    pub fn set_rotation(&self, rotation: RotationState) {
        self.rotation.set(rotation);
    }

    pub fn parent(&self) -> Option<Rc<TransformNode>> {
        self.parent.borrow().clone()
    }

    /// Attach this node under `parent` (or detach with `None`).
    ///
    /// A link that would make the node its own ancestor is refused and the
    /// previous parent is kept; returns whether the parent was changed.
    pub fn set_parent(&self, parent: Option<Rc<TransformNode>>) -> bool {
        if let Some(candidate) = &parent {
            if self.is_ancestor_or_self(candidate) {
                warn!(node = %self.name, parent = %candidate.name, "refusing cyclic parent link");
                return false;
            }
        }
        *self.parent.borrow_mut() = parent;
        true
    }

    fn is_ancestor_or_self(&self, node: &Rc<TransformNode>) -> bool {
        let mut current = Some(node.clone());
        while let Some(ancestor) = current {
            if std::ptr::eq(Rc::as_ptr(&ancestor), self) {
                return true;
            }
            current = ancestor.parent();
        }
        false
    }

    pub fn local_matrix(&self) -> Matrix4<f32> {
        let p = self.position();
        Transform::translation_matrix(p.x, p.y, p.z) * Transform::rotation_matrix(&self.rotation())
    }

    /// Local matrix composed with every ancestor's
    pub fn world_matrix(&self) -> Matrix4<f32> {
        match self.parent() {
            Some(parent) => parent.world_matrix() * self.local_matrix(),
            None => self.local_matrix(),
        }
    }

    pub fn absolute_position(&self) -> Point3<f32> {
        self.world_matrix().transform_point(&Point3::origin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_state() {
        let state = RotationState::default();
        assert_eq!(state.x, 0.0);
        assert_eq!(state.y, 0.0);
        assert_eq!(state.z, 0.0);

        let state = RotationState::new(0.1, 0.2, 0.3);
        assert!((state.x - 0.1).abs() < 1e-6);
        assert!((state.z - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_identity_rotation() {
        let rotation = RotationState::zero();
        let matrix = Transform::rotation_matrix(&rotation);
        assert!((matrix - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_node_without_parent() {
        let node = TransformNode::new("label");
        node.set_position(Point3::new(1.0, 2.0, 3.0));
        assert!((node.absolute_position() - Point3::new(1.0, 2.0, 3.0)).norm() < 1e-6);
    }

    #[test]
    fn test_node_follows_parent_translation_and_rotation() {
        let parent = TransformNode::new("box");
        parent.set_position(Point3::new(0.0, 0.0, 4.0));
        parent.set_rotation(RotationState::new(0.0, std::f32::consts::FRAC_PI_2, 0.0));

        let child = TransformNode::new("label");
        child.set_position(Point3::new(1.0, 0.0, 0.0));
        child.set_parent(Some(parent.clone()));

        // +X rotated a quarter turn about Y lands on -Z
        let expected = Point3::new(0.0, 0.0, 3.0);
        assert!((child.absolute_position() - expected).norm() < 1e-5);

        parent.set_position(Point3::new(0.0, 2.0, 4.0));
        assert!((child.absolute_position() - Point3::new(0.0, 2.0, 3.0)).norm() < 1e-5);

        child.set_parent(None);
        assert!((child.absolute_position() - Point3::new(1.0, 0.0, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn test_cyclic_parent_is_refused() {
        let a = TransformNode::new("a");
        let b = TransformNode::new("b");
        let c = TransformNode::new("c");
        a.set_position(Point3::new(1.0, 0.0, 0.0));

        assert!(b.set_parent(Some(a.clone())));
        assert!(c.set_parent(Some(b.clone())));
        assert!(!a.set_parent(Some(c.clone())));
        assert!(!a.set_parent(Some(a.clone())));

        assert!(a.parent().is_none());
        assert!((a.absolute_position() - Point3::new(1.0, 0.0, 0.0)).norm() < 1e-6);
        assert!((c.absolute_position() - Point3::new(1.0, 0.0, 0.0)).norm() < 1e-6);
    }
}
