//! Surface material description.
//!
//! A material is plain data: the renderer decides how rays bounce off it.

use lumen_math::Vec3;
use serde::{Deserialize, Serialize};

/// Surface properties of a piece of geometry.
///
/// `emittance > 0` marks the surface as a light source.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Reflectance (or emitted color for lights)
    pub color: Vec3,

    /// Index of refraction used by the transmissive branch
    pub index: f64,

    /// Probability of taking the specular branch
    pub reflectivity: f64,

    /// Non-zero enables the transmissive branch
    pub transparency: f64,

    /// Reflection cone half-angle in radians
    pub gloss: f64,

    pub emittance: f64,

    /// 0 passes indirect light through untouched, 1 fully tints it by `color`
    pub tint: f64,
}

impl Default for Material {
    fn default() -> Self {
        Self::lambertian(Vec3::splat(0.5))
    }
}

impl Material {
    /// A purely diffuse surface.
    pub fn lambertian(color: Vec3) -> Self {
        Self {
            color,
            index: 0.0,
            reflectivity: 0.0,
            transparency: 0.0,
            gloss: 0.0,
            emittance: 0.0,
            tint: 0.0,
        }
    }

    /// A glossy reflector.
    ///
    /// - `gloss`: cone angle in radians, 0 = perfect mirror
    /// - `reflectivity`: chance of a specular bounce, the rest is diffuse
    pub fn metal(color: Vec3, gloss: f64, reflectivity: f64, tint: f64) -> Self {
        Self {
            index: 1.0,
            reflectivity,
            gloss,
            tint,
            ..Self::lambertian(color)
        }
    }

    /// A refracting surface such as glass.
    pub fn transparent(
        color: Vec3,
        index: f64,
        gloss: f64,
        reflectivity: f64,
        transparency: f64,
    ) -> Self {
        Self {
            index,
            gloss,
            reflectivity,
            transparency,
            ..Self::lambertian(color)
        }
    }

    /// An emitter. Its negative reflectivity keeps it off the specular branch.
    pub fn light(color: Vec3, emittance: f64) -> Self {
        Self {
            emittance,
            reflectivity: -1.0,
            ..Self::lambertian(color)
        }
    }

    /// Check if this material is a light source.
    pub fn is_emissive(&self) -> bool {
        self.emittance > 0.0
    }

    /// Radiance carried by a shadow ray that reaches this emitter.
    pub fn radiance(&self) -> Vec3 {
        self.color * self.emittance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let red = Vec3::new(0.8, 0.1, 0.1);

        let diffuse = Material::lambertian(red);
        assert_eq!(diffuse.reflectivity, 0.0);
        assert!(!diffuse.is_emissive());

        let metal = Material::metal(red, 0.1, 0.9, 1.0);
        assert_eq!(metal.index, 1.0);
        assert_eq!(metal.reflectivity, 0.9);

        let glass = Material::transparent(Vec3::ONE, 1.5, 0.0, 0.3, 0.7);
        assert_eq!(glass.index, 1.5);
        assert_eq!(glass.transparency, 0.7);
    }

    #[test]
    fn test_light() {
        let light = Material::light(Vec3::new(1.0, 0.5, 0.0), 2.0);

        assert!(light.is_emissive());
        assert!(light.reflectivity < 0.0);
        assert_eq!(light.radiance(), Vec3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let material: Material = serde_json::from_str(r#"{ "emittance": 3.0 }"#).unwrap();

        assert_eq!(material.emittance, 3.0);
        assert_eq!(material.color, Vec3::splat(0.5));
    }
}
