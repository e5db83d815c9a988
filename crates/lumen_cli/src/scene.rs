//! The demo scene: a grey floor lit by a spherical light, with a red ball
//! and an optional glassy OBJ model.

use anyhow::{Context, Result};
use lumen_core::Material;
use lumen_math::Vec3;
use lumen_renderer::{load_mesh, Camera, Object, RenderConfig, Scene, Sphere, Triangle};
use std::path::Path;
use std::sync::Arc;

const CAMERA_POSITION: Vec3 = Vec3::new(2.5, 2.0, -4.0);
const CAMERA_DIRECTION: Vec3 = Vec3::new(0.0, -0.4, 1.0);

const MODEL_CENTER: Vec3 = Vec3::new(2.4, 0.8, -1.0);
const MODEL_SCALE: f64 = 0.25;

/// Build the demo scene, loading `obj` as a transparent model if given.
pub fn demo_scene(obj: Option<&Path>) -> Result<Scene> {
    let floor = Material::lambertian(Vec3::splat(0.5));
    let bl = Vec3::new(0.0, 0.0, 0.0);
    let br = Vec3::new(5.0, 0.0, 0.0);
    let tl = Vec3::new(0.0, 0.0, 5.0);
    let tr = Vec3::new(5.0, 0.0, 5.0);
    let up = [Vec3::Y; 3];

    let mut objects: Vec<Object> = vec![
        Arc::new(Triangle::new([bl, br, tl], up, [Vec3::ZERO; 3], floor)),
        Arc::new(Triangle::new([tl, tr, br], up, [Vec3::ZERO; 3], floor)),
        Arc::new(Sphere::new(
            Vec3::new(2.25, 3.0, 2.25),
            1.0,
            Material::light(Vec3::ONE, 0.2),
        )),
        Arc::new(Sphere::new(
            Vec3::new(1.25, 0.5, 3.0),
            0.5,
            Material::lambertian(Vec3::new(0.8, 0.1, 0.1)),
        )),
    ];

    if let Some(path) = obj {
        let glass = Material::transparent(Vec3::new(0.9, 1.0, 0.9), 1.5, 0.0, 0.3, 0.7);
        let mesh = load_mesh(path, MODEL_CENTER, MODEL_SCALE, &glass)
            .with_context(|| format!("Failed to load model {}", path.display()))?;
        objects.push(Arc::new(mesh));
    }

    let mut scene = Scene::new();
    scene.add_all(objects);
    Ok(scene)
}

/// Camera looking down over the floor, matched to the config's image.
pub fn demo_camera(config: &RenderConfig) -> Camera {
    Camera::new()
        .with_position(CAMERA_POSITION, CAMERA_POSITION + CAMERA_DIRECTION, Vec3::Y)
        .with_lens(config.fov, config.aperture)
        .with_resolution(config.width, config.height)
        .initialized()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_demo_scene_without_model() {
        let scene = demo_scene(None).unwrap();
        assert_eq!(scene.len(), 4);
        assert_eq!(scene.lights().len(), 1);
    }

    #[test]
    fn test_demo_scene_with_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.obj");
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let scene = demo_scene(Some(&path)).unwrap();
        assert_eq!(scene.len(), 5);
        assert_eq!(scene.objects()[4].material().transparency, 0.7);
    }

    #[test]
    fn test_missing_model_is_fatal() {
        let Err(err) = demo_scene(Some(Path::new("/no/such/teapot.obj"))) else {
            panic!("expected the missing model to fail the scene");
        };
        assert!(err.to_string().contains("teapot.obj"));
    }

    #[test]
    fn test_camera_looks_along_direction() {
        let config = RenderConfig::default().with_lens(50.0, 0.0);
        let camera = demo_camera(&config);
        let mut rng = StdRng::seed_from_u64(0);

        let ray = camera.ray_at(0.5, 0.5, &mut rng);
        let d = ray.direction().normalize();
        assert!((d - CAMERA_DIRECTION.normalize()).length() < 1e-9);
    }
}
