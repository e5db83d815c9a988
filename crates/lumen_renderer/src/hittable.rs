//! Hittable trait and HitRecord for ray-object intersection.

use crate::{Material, Ray};
use lumen_math::{Aabb, Interval, Vec3};
use rand::RngCore;
use std::sync::Arc;

/// Record of a ray-object intersection.
#[derive(Clone, Copy, Debug)]
pub struct HitRecord<'a> {
    /// Parameter t where the intersection occurs
    pub t: f64,
    /// Point of intersection
    pub p: Vec3,
    /// Surface normal at the intersection (not flipped towards the ray)
    pub normal: Vec3,
    /// Barycentric coordinates on triangles, zero on spheres
    pub u: f64,
    pub v: f64,
    /// The ray that produced this hit
    pub ray: Ray,
    /// Material at the intersection point
    pub material: &'a Material,
}

/// Trait for objects that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Intersect the ray with this object, reporting hits with `t` inside `ray_t`.
    fn intersect<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>>;

    /// Get the axis-aligned bounding box of this object.
    fn bounding_box(&self) -> Aabb;

    /// Representative point used to sort the object into a KD-tree half.
    fn mid_point(&self) -> Vec3;

    fn material(&self) -> &Material;

    /// A random point on the surface, used to aim shadow rays at emitters
    /// seen from `reference`.
    fn random_point(&self, rng: &mut dyn RngCore, reference: Vec3) -> Vec3;
}

impl<T: Hittable + ?Sized> Hittable for Arc<T> {
    fn intersect<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        (**self).intersect(ray, ray_t)
    }

    fn bounding_box(&self) -> Aabb {
        (**self).bounding_box()
    }

    fn mid_point(&self) -> Vec3 {
        (**self).mid_point()
    }

    fn material(&self) -> &Material {
        (**self).material()
    }

    fn random_point(&self, rng: &mut dyn RngCore, reference: Vec3) -> Vec3 {
        (**self).random_point(rng, reference)
    }
}

impl<T: Hittable + ?Sized> Hittable for Box<T> {
    fn intersect<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        (**self).intersect(ray, ray_t)
    }

    fn bounding_box(&self) -> Aabb {
        (**self).bounding_box()
    }

    fn mid_point(&self) -> Vec3 {
        (**self).mid_point()
    }

    fn material(&self) -> &Material {
        (**self).material()
    }

    fn random_point(&self, rng: &mut dyn RngCore, reference: Vec3) -> Vec3 {
        (**self).random_point(rng, reference)
    }
}
