//! Math types shared by the lumen crates.
//!
//! Everything runs in double precision: `Vec3` is glam's `DVec3`.

pub use glam::{dvec3, DVec3 as Vec3};

mod aabb;
mod axis;
mod interval;
mod ray;

pub use aabb::Aabb;
pub use axis::Axis;
pub use interval::Interval;
pub use ray::Ray;
