//! Random sampling helpers shared by the camera, materials and primitives.

use lumen_math::Vec3;
use rand::{Rng, RngCore};
use std::f64::consts::PI;

/// Uniform sample in [0, 1).
#[inline]
pub fn gen_f64(rng: &mut dyn RngCore) -> f64 {
    rng.gen::<f64>()
}

/// Uniform point strictly inside the unit sphere (rejection sampling).
pub fn random_in_unit_sphere(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(gen_f64(rng), gen_f64(rng), gen_f64(rng)) * 2.0 - Vec3::ONE;
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

/// Uniform point in the unit disk (z = 0) by polar sampling.
///
/// The sum of two uniforms folded back into [0, 1] has density 2r, which is
/// exactly what an area-uniform radius needs.
pub fn random_in_unit_disk(rng: &mut dyn RngCore) -> Vec3 {
    let angle = 2.0 * PI * gen_f64(rng);
    let sum = gen_f64(rng) + gen_f64(rng);
    let r = if sum > 1.0 { 2.0 - sum } else { sum };
    Vec3::new(r * angle.cos(), r * angle.sin(), 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_unit_sphere_samples_are_inside() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            assert!(random_in_unit_sphere(&mut rng).length_squared() < 1.0);
        }
    }

    #[test]
    fn test_unit_disk_samples_are_flat_and_inside() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut outer = 0;
        for _ in 0..4000 {
            let p = random_in_unit_disk(&mut rng);
            assert_eq!(p.z, 0.0);
            assert!(p.length() <= 1.0);
            if p.length() > std::f64::consts::FRAC_1_SQRT_2 {
                outer += 1;
            }
        }
        // The outer ring holds half of the disk's area
        assert!((1700..2300).contains(&outer), "outer = {outer}");
    }
}
