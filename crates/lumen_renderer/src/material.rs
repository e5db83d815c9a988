//! Bounce model: how a ray continues after hitting a surface.
//!
//! Each bounce takes one of three branches. With probability `reflectivity`
//! the ray is mirrored into a gloss cone (specular). Otherwise a material with
//! `transparency > 0` refracts the ray (transmissive), and anything else
//! scatters around the normal (diffuse).

use crate::{
    hittable::HitRecord,
    sampling::{gen_f64, random_in_unit_sphere},
    Material, Ray,
};
use lumen_math::Vec3;
use rand::RngCore;
use std::f64::consts::PI;

/// Cone angles below this are treated as a perfect mirror.
const EPSILON: f64 = 1e-9;

/// Offset applied to refracted rays so they leave the surface they hit.
const TRANSMIT_OFFSET: f64 = 1e-4;

/// Which branches a bounce may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BounceMode {
    /// Choose at random using the material's reflectivity
    #[default]
    Any,
    /// Always take the specular branch
    Specular,
    /// Never take the specular branch
    Diffuse,
}

/// A sampled continuation of a ray.
#[derive(Debug, Clone, Copy)]
pub struct Bounce {
    pub ray: Ray,
    /// True if the specular branch was taken
    pub specular: bool,
    /// Probability weight of the branch taken
    pub weight: f64,
}

/// Bounce sampling for surface materials.
pub trait Scatter {
    /// Sample an outgoing ray for `ray` arriving at `hit`.
    ///
    /// `u` and `v` are uniform randoms driving the gloss cone.
    fn bounce(
        &self,
        ray: &Ray,
        u: f64,
        v: f64,
        mode: BounceMode,
        hit: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Bounce;
}

impl Scatter for Material {
    fn bounce(
        &self,
        ray: &Ray,
        u: f64,
        v: f64,
        mode: BounceMode,
        hit: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Bounce {
        let p = self.reflectivity;
        let specular = match mode {
            BounceMode::Any => gen_f64(rng) < p,
            BounceMode::Specular => true,
            BounceMode::Diffuse => false,
        };

        let mut origin = hit.p;
        let (direction, weight) = if specular {
            let mirrored = reflect(ray.direction(), hit.normal);
            let weight = if mode == BounceMode::Specular { 1.0 } else { p };
            (cone(mirrored, self.gloss, u, v, rng), weight)
        } else if self.transparency > 0.0 {
            let refracted = refract(ray.direction().normalize_or_zero(), hit.normal, self.index);
            let direction = cone(refracted, self.gloss, u, v, rng);
            origin += direction.normalize_or_zero() * TRANSMIT_OFFSET;
            (direction, 1.0 - p)
        } else {
            let mut scatter = hit.normal + random_in_unit_sphere(rng);

            // Catch degenerate scatter direction
            if scatter.length_squared() < 1e-8 {
                scatter = hit.normal;
            }
            (scatter, 1.0 - p)
        };

        Bounce {
            ray: Ray::new(origin, direction.normalize_or_zero()),
            specular,
            weight,
        }
    }
}

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract the incident direction `i` through a surface with normal `n`.
///
/// Which side the ray arrives from is decided by the sign of `i · n`. When
/// Snell's law has no solution (total internal reflection) the ray is
/// mirrored instead.
pub fn refract(i: Vec3, n: Vec3, index: f64) -> Vec3 {
    let mut cos_i = n.dot(i);
    let (n, n1, n2) = if cos_i > 0.0 {
        (-n, index, 1.0)
    } else {
        cos_i = -cos_i;
        (n, 1.0, index)
    };

    let ratio = n1 / n2;
    let sin_t2 = ratio * ratio * (1.0 - cos_i * cos_i);
    if !ratio.is_finite() || 1.0 - sin_t2 < 0.0 {
        return reflect(i, n);
    }

    let cos_t = (1.0 - sin_t2).sqrt();
    i * ratio + n * (ratio * cos_i - cos_t)
}

/// Perturb `direction` inside a cone of half-angle `theta`.
///
/// The polar offset is `theta * (1 - 2 acos(u) / pi)` and the azimuth is
/// `2 pi v`. Returns a unit vector, or `direction` untouched when the cone is
/// negligibly narrow.
pub fn cone(direction: Vec3, theta: f64, u: f64, v: f64, rng: &mut dyn RngCore) -> Vec3 {
    if theta < EPSILON {
        return direction;
    }

    let d = direction.normalize_or_zero();
    if d == Vec3::ZERO {
        return direction;
    }

    let theta = theta * (1.0 - 2.0 * u.acos() / PI);
    let (m1, m2) = theta.sin_cos();
    let azimuth = 2.0 * PI * v;

    // Two perpendicular axes from an arbitrary helper vector
    let s = loop {
        let s = d.cross(random_in_unit_sphere(rng));
        if s.length_squared() > 1e-12 {
            break s.normalize();
        }
    };
    let t = d.cross(s);

    (s * (m1 * azimuth.cos()) + t * (m1 * azimuth.sin()) + d * m2).normalize()
}
