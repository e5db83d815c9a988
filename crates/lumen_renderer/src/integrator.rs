//! Recursive radiance estimator.
//!
//! Diffuse and transmissive hits add a direct lighting term from shadow rays
//! to the indirect term from one bounced ray. Specular hits only follow the
//! bounce. Emitters end the path.

use crate::{
    config::RenderConfig,
    hittable::HitRecord,
    material::{BounceMode, Scatter},
    sampling::gen_f64,
    Color, Ray, Scene,
};
use lumen_math::Interval;
use rand::RngCore;

/// Estimate the radiance carried back along `ray`.
///
/// Recursion stops once `depth` exceeds `config.max_depth`. `tests` counts
/// primitive intersection tests, shadow rays included.
pub fn radiance(
    ray: &Ray,
    scene: &Scene,
    depth: u32,
    config: &RenderConfig,
    rng: &mut dyn RngCore,
    tests: &mut u64,
) -> Color {
    if depth > config.max_depth {
        return config.background.radiance(ray);
    }

    let window = Interval::new(config.t_min, config.t_max);
    let Some(hit) = scene.tree().nearest_hit(ray, window, tests) else {
        return config.background.radiance(ray);
    };

    let material = hit.material;
    if material.is_emissive() {
        return material.color;
    }

    let mode = BounceMode::Any;
    let (u, v) = (gen_f64(rng), gen_f64(rng));
    let bounce = material.bounce(ray, u, v, mode, &hit, rng);

    // Branch probabilities are already accounted for by the random choice
    let weight = if mode == BounceMode::Any { 1.0 } else { bounce.weight };
    if weight <= 0.0 {
        return Color::ZERO;
    }

    let indirect = radiance(&bounce.ray, scene, depth + 1, config, rng, tests);
    if bounce.specular {
        let tinted = indirect.lerp(material.color * indirect, material.tint);
        tinted * weight
    } else {
        let direct = direct_light(scene, &hit, config, rng, tests);
        material.color * (direct + indirect) * weight
    }
}

/// Sum of unoccluded light from every emitter, `shadow_rays` samples each.
///
/// Samples are summed, not averaged, so brightness grows with the shadow ray
/// count and the number of lights. The shadow ray direction is left
/// unnormalized: it spans from the hit point to the sampled light point.
pub fn direct_light(
    scene: &Scene,
    hit: &HitRecord,
    config: &RenderConfig,
    rng: &mut dyn RngCore,
    tests: &mut u64,
) -> Color {
    let window = Interval::new(config.t_min, config.t_max);
    let mut contribution = Color::ZERO;

    for light in scene.lights() {
        let emitted = light.material().radiance();
        for _ in 0..config.shadow_rays {
            let to_light = light.random_point(rng, hit.p) - hit.p;
            let shadow = Ray::new(hit.p, to_light);
            if !scene.tree().any_hit(&shadow, window, tests) {
                let cos = hit.normal.dot(-to_light).max(0.0);
                contribution += emitted * cos;
            }
        }
    }

    contribution
}
