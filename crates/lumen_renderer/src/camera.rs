//! Thin-lens camera for ray generation.

use crate::{sampling::random_in_unit_disk, Ray};
use lumen_math::Vec3;
use rand::RngCore;

/// Camera for generating rays into the scene.
///
/// The plane of perfect focus passes through `look_at`.
#[derive(Clone, Debug)]
pub struct Camera {
    // Camera positioning
    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    // Lens settings
    vfov: f64,     // Vertical field of view in degrees
    aperture: f64, // Lens diameter
    aspect: f64,   // Width over height

    // Cached computed values (set by initialize())
    origin: Vec3,
    lower_left: Vec3,
    horizontal: Vec3,
    vertical: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    lens_radius: f64,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        let mut camera = Self {
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
            vfov: 90.0,
            aperture: 0.0,
            aspect: 1.0,
            origin: Vec3::ZERO,
            lower_left: Vec3::ZERO,
            horizontal: Vec3::ZERO,
            vertical: Vec3::ZERO,
            u: Vec3::X,
            v: Vec3::Y,
            w: Vec3::Z,
            lens_radius: 0.0,
        };
        camera.initialize();
        camera
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    /// Set lens settings: vertical field of view in degrees and aperture diameter.
    pub fn with_lens(mut self, vfov: f64, aperture: f64) -> Self {
        self.vfov = vfov;
        self.aperture = aperture.max(0.0);
        self
    }

    pub fn with_aspect(mut self, aspect: f64) -> Self {
        self.aspect = aspect;
        self
    }

    /// Match the aspect ratio of an image.
    pub fn with_resolution(self, width: usize, height: usize) -> Self {
        self.with_aspect(width as f64 / height.max(1) as f64)
    }

    /// Recompute the image plane. Call after changing any setting.
    pub fn initialize(&mut self) {
        self.origin = self.look_from;
        self.lens_radius = self.aperture / 2.0;

        let theta = self.vfov.to_radians();
        let half_height = (theta / 2.0).tan();
        let half_width = self.aspect * half_height;

        // Calculate camera basis vectors
        self.w = (self.look_from - self.look_at).normalize_or_zero();
        self.u = self.vup.cross(self.w).normalize_or_zero();
        self.v = self.w.cross(self.u);

        let focus_dist = (self.look_from - self.look_at).length();
        let x = self.u * (half_width * focus_dist);
        let y = self.v * (half_height * focus_dist);

        self.lower_left = self.origin - x - y - self.w * focus_dist;
        self.horizontal = x * 2.0;
        self.vertical = y * 2.0;
    }

    /// Builder-style [`Camera::initialize`].
    pub fn initialized(mut self) -> Self {
        self.initialize();
        self
    }

    /// Ray through image-plane coordinates `(s, t)`, both in [0, 1] with
    /// `(0, 0)` at the lower-left corner.
    pub fn ray_at(&self, s: f64, t: f64, rng: &mut dyn RngCore) -> Ray {
        let rd = random_in_unit_disk(rng) * self.lens_radius;
        let offset = self.u * rd.x + self.v * rd.y;

        let origin = self.origin + offset;
        let target = self.lower_left + self.horizontal * s + self.vertical * t;
        Ray::new(origin, target - origin)
    }

    pub fn look_from(&self) -> Vec3 {
        self.look_from
    }

    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }

    pub fn lens_radius(&self) -> f64 {
        self.lens_radius
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
