/// Geometry primitives for 3D rendering and picking
use nalgebra::{Point3, Vector3};

const PARALLEL_EPSILON: f32 = 1e-7;

/// A half-line used for pointer picking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    /// Unit direction
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Ray starting at `from` and passing through `to`. `None` if they coincide.
    pub fn between(from: Point3<f32>, to: Point3<f32>) -> Option<Self> {
        let direction = (to - from).try_normalize(PARALLEL_EPSILON)?;
        Some(Self { origin: from, direction })
    }

    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }

    /// Shortest distance from `point` to the infinite line carrying the ray
    pub fn distance_to_point(&self, point: &Point3<f32>) -> f32 {
        let offset = point - self.origin;
        let along = offset.dot(&self.direction);
        (offset - self.direction * along).norm()
    }
}

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            normal: Vector3::new(nx, ny, nz),
        }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Calculate the face normal from the triangle's vertices
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1.cross(&edge2).normalize()
    }

    /// Möller–Trumbore intersection; returns the distance along the ray
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let v0 = self.vertices[0].position;
        let edge1 = self.vertices[1].position - v0;
        let edge2 = self.vertices[2].position - v0;

        let p = ray.direction.cross(&edge2);
        let det = edge1.dot(&p);
        if det.abs() < PARALLEL_EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;

        let s = ray.origin - v0;
        let u = s.dot(&p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = ray.direction.dot(&q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(&q) * inv_det;
        (t > PARALLEL_EPSILON).then_some(t)
    }

    pub fn transformed(&self, matrix: &nalgebra::Matrix4<f32>) -> Self {
        let map = |vertex: &Vertex| Vertex {
            position: matrix.transform_point(&vertex.position),
            normal: matrix.transform_vector(&vertex.normal),
        };
        Self::new(
            map(&self.vertices[0]),
            map(&self.vertices[1]),
            map(&self.vertices[2]),
        )
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Nearest hit distance of a world-space ray against this mesh placed
    /// with `model_matrix`
    pub fn intersect_ray(&self, ray: &Ray, model_matrix: &nalgebra::Matrix4<f32>) -> Option<f32> {
        self.triangles
            .iter()
            .filter_map(|triangle| triangle.transformed(model_matrix).intersect_ray(ray))
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Create a simple cube mesh for testing
    pub fn cube(size: f32) -> Self {
        let half = size / 2.0;
        let mut mesh = Self::new();

        // Front face
        mesh.add_triangle(Triangle::new(
            Vertex::new(-half, -half, half, 0.0, 0.0, 1.0),
            Vertex::new(half, -half, half, 0.0, 0.0, 1.0),
            Vertex::new(half, half, half, 0.0, 0.0, 1.0),
        ));
        mesh.add_triangle(Triangle::new(
            Vertex::new(-half, -half, half, 0.0, 0.0, 1.0),
            Vertex::new(half, half, half, 0.0, 0.0, 1.0),
            Vertex::new(-half, half, half, 0.0, 0.0, 1.0),
        ));

        // Back face
        mesh.add_triangle(Triangle::new(
            Vertex::new(-half, -half, -half, 0.0, 0.0, -1.0),
            Vertex::new(-half, half, -half, 0.0, 0.0, -1.0),
            Vertex::new(half, half, -half, 0.0, 0.0, -1.0),
        ));
        mesh.add_triangle(Triangle::new(
            Vertex::new(-half, -half, -half, 0.0, 0.0, -1.0),
            Vertex::new(half, half, -half, 0.0, 0.0, -1.0),
            Vertex::new(half, -half, -half, 0.0, 0.0, -1.0),
        ));

        // Top face
        mesh.add_triangle(Triangle::new(
            Vertex::new(-half, half, -half, 0.0, 1.0, 0.0),
            Vertex::new(-half, half, half, 0.0, 1.0, 0.0),
            Vertex::new(half, half, half, 0.0, 1.0, 0.0),
        ));
        mesh.add_triangle(Triangle::new(
            Vertex::new(-half, half, -half, 0.0, 1.0, 0.0),
            Vertex::new(half, half, half, 0.0, 1.0, 0.0),
            Vertex::new(half, half, -half, 0.0, 1.0, 0.0),
        ));

        // Bottom face
        mesh.add_triangle(Triangle::new(
            Vertex::new(-half, -half, -half, 0.0, -1.0, 0.0),
            Vertex::new(half, -half, -half, 0.0, -1.0, 0.0),
            Vertex::new(half, -half, half, 0.0, -1.0, 0.0),
        ));
        mesh.add_triangle(Triangle::new(
            Vertex::new(-half, -half, -half, 0.0, -1.0, 0.0),
            Vertex::new(half, -half, half, 0.0, -1.0, 0.0),
            Vertex::new(-half, -half, half, 0.0, -1.0, 0.0),
        ));

        // Right face
        mesh.add_triangle(Triangle::new(
            Vertex::new(half, -half, -half, 1.0, 0.0, 0.0),
            Vertex::new(half, half, -half, 1.0, 0.0, 0.0),
            Vertex::new(half, half, half, 1.0, 0.0, 0.0),
        ));
        mesh.add_triangle(Triangle::new(
            Vertex::new(half, -half, -half, 1.0, 0.0, 0.0),
            Vertex::new(half, half, half, 1.0, 0.0, 0.0),
            Vertex::new(half, -half, half, 1.0, 0.0, 0.0),
        ));

        // Left face
        mesh.add_triangle(Triangle::new(
            Vertex::new(-half, -half, -half, -1.0, 0.0, 0.0),
            Vertex::new(-half, -half, half, -1.0, 0.0, 0.0),
            Vertex::new(-half, half, half, -1.0, 0.0, 0.0),
        ));
        mesh.add_triangle(Triangle::new(
            Vertex::new(-half, -half, -half, -1.0, 0.0, 0.0),
            Vertex::new(-half, half, half, -1.0, 0.0, 0.0),
            Vertex::new(-half, half, -half, -1.0, 0.0, 0.0),
        ));

        mesh
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix4;

    #[test]
    fn test_cube_has_twelve_triangles() {
        assert_eq!(Mesh::cube(2.0).triangles.len(), 12);
    }

    #[test]
    fn test_ray_hits_cube_front_face() {
        let cube = Mesh::cube(2.0);
        let ray = Ray::between(Point3::new(0.2, 0.1, 10.0), Point3::new(0.2, 0.1, 0.0)).unwrap();

        let hit = cube.intersect_ray(&ray, &Matrix4::identity()).unwrap();
        assert!((hit - 9.0).abs() < 1e-4);
    }

    #[test]
    fn test_ray_misses_translated_cube() {
        let cube = Mesh::cube(2.0);
        let ray = Ray::between(Point3::new(0.0, 0.0, 10.0), Point3::origin()).unwrap();
        let model = Matrix4::new_translation(&Vector3::new(5.0, 0.0, 0.0));

        assert!(cube.intersect_ray(&ray, &model).is_none());
    }

    #[test]
    fn test_distance_to_point() {
        let ray = Ray::between(Point3::origin(), Point3::new(0.0, 0.0, 1.0)).unwrap();
        assert!((ray.distance_to_point(&Point3::new(3.0, 0.0, 7.0)) - 3.0).abs() < 1e-6);
        assert!((ray.at(2.0) - Point3::new(0.0, 0.0, 2.0)).norm() < 1e-6);
    }

    #[test]
    fn test_coincident_points_give_no_ray() {
        assert!(Ray::between(Point3::origin(), Point3::origin()).is_none());
    }
}
