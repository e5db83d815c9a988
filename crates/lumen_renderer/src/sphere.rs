//! Sphere primitive for ray tracing.

use crate::{
    hittable::{HitRecord, Hittable},
    sampling::random_in_unit_sphere,
    Material, Ray,
};
use lumen_math::{Aabb, Interval, Vec3};
use rand::RngCore;
use std::sync::Arc;

/// A sphere primitive.
pub struct Sphere {
    center: Vec3,
    radius: f64,
    material: Arc<Material>,
    bbox: Aabb,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(center: Vec3, radius: f64, material: impl Into<Arc<Material>>) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        let bbox = Aabb::from_points(center - rvec, center + rvec);

        Self {
            center,
            radius,
            material: material.into(),
            bbox,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl Hittable for Sphere {
    fn intersect<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let oc = self.center - ray.origin();
        let a = ray.direction().length_squared();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        // A grazing ray (zero discriminant) counts as a miss
        let discriminant = h * h - a * c;
        if discriminant <= 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let p = ray.at(root);
        Some(HitRecord {
            t: root,
            p,
            normal: (p - self.center) / self.radius,
            u: 0.0,
            v: 0.0,
            ray: *ray,
            material: &self.material,
        })
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn mid_point(&self) -> Vec3 {
        self.center
    }

    fn material(&self) -> &Material {
        &self.material
    }

    /// Jitter the direction towards `reference` and project onto the surface.
    ///
    /// This favours the hemisphere facing `reference` without being an exact
    /// solid-angle sample.
    fn random_point(&self, rng: &mut dyn RngCore, reference: Vec3) -> Vec3 {
        let facing = (reference - self.center).normalize_or_zero();
        let hem = (facing + random_in_unit_sphere(rng))
            .try_normalize()
            .unwrap_or(facing);
        self.center + hem * self.radius
    }
}
