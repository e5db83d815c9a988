//! lumen core - scene description shared by the renderer and the CLI.
//!
//! This crate provides:
//!
//! - **Materials**: the `Material` record and its presets
//! - **OBJ support**: Wavefront OBJ/MTL loading into an `ObjModel`
//!
//! # Example
//!
//! ```ignore
//! use lumen_core::{load_obj, Material};
//!
//! let model = load_obj("teapot.obj", &Material::default())?;
//! println!("Loaded {} triangles", model.len());
//! ```

pub mod material;
pub mod obj;

// Re-export commonly used types
pub use material::Material;
pub use obj::{
    load_mtl, load_obj, parse_mtl, parse_obj, LoadError, LoadResult, ObjModel, ObjTriangle,
};
