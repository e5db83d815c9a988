//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use crate::{
    hittable::{HitRecord, Hittable},
    sampling::gen_f64,
    Material, Ray,
};
use lumen_math::{Aabb, Interval, Vec3};
use rand::RngCore;
use std::sync::Arc;

/// Determinant threshold below which the ray counts as parallel.
const EPSILON: f64 = 1e-9;

/// A triangle primitive.
pub struct Triangle {
    /// Vertices
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    /// Vertex normals after fix-up
    normals: [Vec3; 3],
    /// Texture coordinates, carried through from the loader
    uvs: [Vec3; 3],
    /// Shading normal: average of the vertex normals
    normal: Vec3,
    area: f64,
    material: Arc<Material>,
    bbox: Aabb,
}

impl Triangle {
    /// Create a triangle with per-vertex normals.
    ///
    /// A zero vertex normal (missing from the source data) is replaced by
    /// the geometric face normal.
    pub fn new(
        positions: [Vec3; 3],
        normals: [Vec3; 3],
        uvs: [Vec3; 3],
        material: impl Into<Arc<Material>>,
    ) -> Self {
        let [v0, v1, v2] = positions;
        let face = (v1 - v0).cross(v2 - v0).normalize_or_zero();
        let normals = normals.map(|n| if n == Vec3::ZERO { face } else { n });

        let mut tri = Self {
            v0,
            v1,
            v2,
            normals,
            uvs,
            normal: (normals[0] + normals[1] + normals[2]) / 3.0,
            area: 0.0,
            material: material.into(),
            bbox: Aabb::EMPTY,
        };
        tri.update_bounds();
        tri
    }

    /// Create a flat-shaded triangle from three vertices.
    pub fn flat(v0: Vec3, v1: Vec3, v2: Vec3, material: impl Into<Arc<Material>>) -> Self {
        Self::new([v0, v1, v2], [Vec3::ZERO; 3], [Vec3::ZERO; 3], material)
    }

    /// Scale the vertices about the origin, then move them by `offset`.
    pub fn scale_and_translate(&mut self, scale: f64, offset: Vec3) {
        self.v0 = self.v0 * scale + offset;
        self.v1 = self.v1 * scale + offset;
        self.v2 = self.v2 * scale + offset;
        self.update_bounds();
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        [self.v0, self.v1, self.v2]
    }

    pub fn normals(&self) -> [Vec3; 3] {
        self.normals
    }

    pub fn uvs(&self) -> [Vec3; 3] {
        self.uvs
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    fn update_bounds(&mut self) {
        self.area = (self.v1 - self.v0).cross(self.v2 - self.v0).length() * 0.5;
        self.bbox = Aabb::surrounding(
            &Aabb::from_points(self.v0, self.v1),
            &Aabb::from_points(self.v2, self.v2),
        );
    }
}

impl Hittable for Triangle {
    /// Möller-Trumbore ray-triangle intersection algorithm.
    fn intersect<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction().cross(edge2);
        let a = edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin() - self.v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction().dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if !ray_t.contains(t) {
            return None;
        }

        Some(HitRecord {
            t,
            p: ray.at(t),
            normal: self.normal,
            u,
            v,
            ray: *ray,
            material: &self.material,
        })
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn mid_point(&self) -> Vec3 {
        (self.v0 + self.v1 + self.v2) / 3.0
    }

    fn material(&self) -> &Material {
        &self.material
    }

    /// Area-uniform point via square-root warped barycentrics.
    fn random_point(&self, rng: &mut dyn RngCore, _reference: Vec3) -> Vec3 {
        let sum = gen_f64(rng).sqrt();
        let t = gen_f64(rng) * sum;
        let s = sum - t;
        let r = 1.0 - s - t;

        self.v0 * r + self.v1 * s + self.v2 * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn unit_triangle() -> Triangle {
        Triangle::flat(
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
            Material::lambertian(Vec3::splat(0.5)),
        )
    }

    #[test]
    fn test_triangle_hit_at_centroid() {
        let tri = unit_triangle();
        let ray = Ray::new(Vec3::new(1.0 / 3.0, 1.0 / 3.0, 2.0), Vec3::new(0.0, 0.0, -1.0));

        let hit = tri.intersect(&ray, Interval::new(0.001, 1e9)).unwrap();
        assert!((hit.t - 2.0).abs() < 1e-9);
        assert!((hit.u + hit.v - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_triangle_miss() {
        let tri = unit_triangle();

        // Outside the hull
        let ray = Ray::new(Vec3::new(0.8, 0.8, 2.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(tri.intersect(&ray, Interval::new(0.001, 1e9)).is_none());

        // Parallel to the plane
        let ray = Ray::new(Vec3::new(0.2, 0.2, 1.0), Vec3::X);
        assert!(tri.intersect(&ray, Interval::new(0.001, 1e9)).is_none());

        // Beyond the window
        let ray = Ray::new(Vec3::new(0.2, 0.2, 2.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(tri.intersect(&ray, Interval::new(0.001, 1.0)).is_none());
    }

    #[test]
    fn test_normal_fix_up() {
        let up = Vec3::new(0.0, 0.0, 2.0);
        let tri = Triangle::new(
            [Vec3::ZERO, Vec3::X, Vec3::Y],
            [Vec3::ZERO, up, Vec3::ZERO],
            [Vec3::ZERO; 3],
            Material::default(),
        );

        assert_eq!(tri.normals()[0], Vec3::Z);
        assert_eq!(tri.normals()[1], up);
        // Averaged, not renormalized
        assert!((tri.normal() - Vec3::new(0.0, 0.0, 4.0 / 3.0)).length() < 1e-12);
    }

    #[test]
    fn test_scale_and_translate() {
        let mut tri = unit_triangle();
        tri.scale_and_translate(2.0, Vec3::new(0.0, 0.0, 5.0));

        assert_eq!(tri.vertices()[1], Vec3::new(2.0, 0.0, 5.0));
        assert!((tri.area() - 2.0).abs() < 1e-12);
        assert!(tri.bounding_box().z.contains(5.0));
        assert!(tri.bounding_box().x.contains(2.0));
    }

    #[test]
    fn test_random_point_inside() {
        let tri = unit_triangle();
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..500 {
            let p = tri.random_point(&mut rng, Vec3::ZERO);
            assert!(p.x >= 0.0 && p.y >= 0.0);
            assert!(p.x + p.y <= 1.0 + 1e-12);
            assert_eq!(p.z, 0.0);
        }
    }
}
