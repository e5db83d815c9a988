//! Render configuration.

use crate::{
    error::{RenderError, RenderResult},
    Color, Ray,
};
use lumen_math::Vec3;
use serde::{Deserialize, Serialize};

/// Radiance returned for rays that escape the scene or exceed the depth limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Background {
    Constant(Color),
    /// `color * max(0, unit(direction) · axis)`
    Directional { color: Color, axis: Vec3 },
}

impl Background {
    pub fn radiance(&self, ray: &Ray) -> Color {
        match *self {
            Background::Constant(color) => color,
            Background::Directional { color, axis } => {
                let d = ray.direction().normalize_or_zero();
                color * d.dot(axis).max(0.0)
            }
        }
    }
}

impl Default for Background {
    fn default() -> Self {
        Background::Constant(Color::ZERO)
    }
}

/// Everything a render needs besides the scene and camera.
///
/// Missing fields in a config file take their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Image width in pixels
    pub width: usize,
    /// Image height in pixels
    pub height: usize,
    /// Vertical field of view in degrees
    pub fov: f64,
    /// Lens diameter
    pub aperture: f64,
    /// Samples per pixel for the base pass
    pub samples_per_pixel: u32,
    /// Maximum ray bounce depth
    pub max_depth: u32,
    /// Shadow rays cast towards every light per diffuse hit
    pub shadow_rays: u32,
    /// Extra samples a pixel may receive when it is noisy
    pub adaptive_samples: u32,
    /// Standard deviation at which a pixel receives the full extra budget
    pub adaptive_threshold: f64,
    /// Sharpens the extra budget towards the noisiest pixels
    pub adaptive_exponent: f64,
    /// Worker threads; `None` uses every available core
    pub workers: Option<usize>,
    /// Base seed; worker `i` uses `seed + i`. `None` seeds from the clock.
    pub seed: Option<u64>,
    pub t_min: f64,
    pub t_max: f64,
    pub background: Background,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 580,
            fov: 50.0,
            aperture: 0.000001,
            samples_per_pixel: 1,
            max_depth: 5,
            shadow_rays: 25,
            adaptive_samples: 0,
            adaptive_threshold: 1.0,
            adaptive_exponent: 3.0,
            workers: None,
            seed: None,
            t_min: 0.001,
            t_max: f64::MAX,
            background: Background::default(),
        }
    }
}

impl RenderConfig {
    /// Set image resolution.
    pub fn with_resolution(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, fov: f64, aperture: f64) -> Self {
        self.fov = fov;
        self.aperture = aperture;
        self
    }

    /// Set quality settings.
    pub fn with_quality(
        mut self,
        samples_per_pixel: u32,
        max_depth: u32,
        shadow_rays: u32,
    ) -> Self {
        self.samples_per_pixel = samples_per_pixel;
        self.max_depth = max_depth;
        self.shadow_rays = shadow_rays;
        self
    }

    /// Set adaptive sampling: extra budget, noise threshold and exponent.
    pub fn with_adaptive(mut self, samples: u32, threshold: f64, exponent: f64) -> Self {
        self.adaptive_samples = samples;
        self.adaptive_threshold = threshold;
        self.adaptive_exponent = exponent;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_background(mut self, background: Background) -> Self {
        self.background = background;
        self
    }

    /// Number of worker threads this config asks for.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Aspect ratio of the output image.
    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }

    /// Reject settings the renderer cannot run with.
    pub fn validate(&self) -> RenderResult<()> {
        let invalid = |msg: &str| Err(RenderError::InvalidConfig(msg.to_string()));

        if self.width == 0 || self.height == 0 {
            return invalid("image width and height must be non-zero");
        }
        if self.workers == Some(0) {
            return invalid("worker count must be non-zero");
        }
        if self.samples_per_pixel == 0 {
            return invalid("samples per pixel must be at least 1");
        }
        if !(self.t_min >= 0.0 && self.t_min < self.t_max) {
            return invalid("ray window must satisfy 0 <= t_min < t_max");
        }
        if self.adaptive_samples > 0 && !(self.adaptive_threshold > 0.0) {
            return invalid("adaptive threshold must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = RenderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_depth, 5);
        assert_eq!(config.shadow_rays, 25);
    }

    #[test]
    fn test_invalid_configs() {
        assert!(RenderConfig::default().with_resolution(0, 10).validate().is_err());
        assert!(RenderConfig::default().with_workers(0).validate().is_err());
        assert!(RenderConfig::default().with_quality(0, 5, 1).validate().is_err());
        assert!(RenderConfig::default()
            .with_adaptive(16, 0.0, 3.0)
            .validate()
            .is_err());

        let backwards = RenderConfig {
            t_min: 1.0,
            t_max: 0.5,
            ..Default::default()
        };
        assert!(matches!(
            backwards.validate(),
            Err(RenderError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{
            "width": 32,
            "height": 16,
            "seed": 7,
            "background": { "directional": { "color": [0.0, 0.3, 0.5], "axis": [0.0, 1.0, 1.0] } }
        }"#;
        let config: RenderConfig = serde_json::from_str(json).unwrap();

        assert_eq!((config.width, config.height), (32, 16));
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.samples_per_pixel, 1);
        assert_eq!(config.aspect(), 2.0);
        assert!(matches!(config.background, Background::Directional { .. }));
    }

    #[test]
    fn test_directional_background() {
        let bg = Background::Directional {
            color: Color::new(0.0, 0.3, 0.5),
            axis: Vec3::Y,
        };

        let up = Ray::new(Vec3::ZERO, Vec3::new(0.0, 4.0, 0.0));
        assert!((bg.radiance(&up) - Color::new(0.0, 0.3, 0.5)).length() < 1e-12);

        let down = Ray::new(Vec3::ZERO, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(bg.radiance(&down), Color::ZERO);
    }
}
