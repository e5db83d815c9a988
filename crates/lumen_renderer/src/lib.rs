//! lumen renderer - CPU Monte Carlo path tracing
//!
//! Spheres, triangles and meshes are indexed by a SAH-built KD-tree. A
//! recursive integrator combines shadow-ray direct lighting with one bounced
//! ray per hit, and a pool of workers accumulates samples row by row into a
//! buffer that tracks per-pixel variance.
//!
//! # Example
//!
//! ```ignore
//! use lumen_renderer::{render, Buffer, Camera, Material, RenderConfig, Scene, Sphere, Vec3};
//!
//! let mut scene = Scene::new();
//! scene.add(Sphere::new(Vec3::ZERO, 1.0, Material::default()));
//!
//! let config = RenderConfig::default().with_resolution(320, 240);
//! let camera = Camera::new()
//!     .with_position(Vec3::new(0.0, 0.0, -5.0), Vec3::ZERO, Vec3::Y)
//!     .with_lens(config.fov, config.aperture)
//!     .with_resolution(config.width, config.height)
//!     .initialized();
//!
//! let mut buffer = Buffer::new(config.width, config.height);
//! let stats = render(&scene, &camera, &mut buffer, &config)?;
//! ```

mod buffer;
mod camera;
mod config;
mod error;
mod hittable;
mod integrator;
mod kd_tree;
mod material;
mod mesh;
mod sampling;
mod scene;
mod scheduler;
mod sphere;
mod triangle;

pub use buffer::{color_to_rgba, Buffer, Channel, Pixel};
pub use camera::Camera;
pub use config::{Background, RenderConfig};
pub use error::{RenderError, RenderResult};
pub use hittable::{HitRecord, Hittable};
pub use integrator::{direct_light, radiance};
pub use kd_tree::{KdTree, SAH_RESOLUTION};
pub use material::{cone, reflect, refract, Bounce, BounceMode, Scatter};
pub use mesh::{load_mesh, Mesh};
pub use sampling::{gen_f64, random_in_unit_disk, random_in_unit_sphere};
pub use scene::{Object, Scene};
pub use scheduler::{render, render_with_progress, RenderEvent, RenderJob, RenderStats};
pub use sphere::Sphere;
pub use triangle::Triangle;

/// Re-export the scene description and math types
pub use lumen_core::Material;
pub use lumen_math::{Aabb, Axis, Interval, Ray, Vec3};

/// Linear RGB radiance. Never clamped before export.
pub type Color = Vec3;
