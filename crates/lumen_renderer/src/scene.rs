//! Scene: the object list, its emitters and the KD-tree over both.

use crate::{hittable::Hittable, kd_tree::KdTree};
use lumen_math::Vec3;
use rand::{Rng, RngCore};
use std::sync::Arc;

/// Shared handle to any scene object.
pub type Object = Arc<dyn Hittable>;

/// Everything the integrator can hit.
///
/// The tree is rebuilt from scratch whenever objects are added, so add
/// objects in bulk with [`Scene::add_all`] when building large scenes.
pub struct Scene {
    objects: Vec<Object>,
    lights: Vec<Object>,
    tree: KdTree<Object>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            lights: Vec::new(),
            tree: KdTree::build(Vec::new()),
        }
    }

    /// Add one object and rebuild the tree.
    pub fn add(&mut self, object: impl Hittable + 'static) {
        self.push(Arc::new(object));
        self.rebuild();
    }

    /// Add several objects and rebuild the tree once.
    pub fn add_all(&mut self, objects: impl IntoIterator<Item = Object>) {
        for object in objects {
            self.push(object);
        }
        self.rebuild();
    }

    fn push(&mut self, object: Object) {
        if object.material().is_emissive() {
            self.lights.push(Arc::clone(&object));
        }
        self.objects.push(object);
    }

    fn rebuild(&mut self) {
        self.tree = KdTree::build(self.objects.clone());
        log::info!(
            "Scene: {} objects, {} lights, {} KD-tree nodes",
            self.objects.len(),
            self.lights.len(),
            self.tree.node_count()
        );
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    /// Objects whose material emits light.
    pub fn lights(&self) -> &[Object] {
        &self.lights
    }

    pub fn tree(&self) -> &KdTree<Object> {
        &self.tree
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Unit direction from `p` towards a random point on a random light.
    pub fn random_light_direction(&self, p: Vec3, rng: &mut dyn RngCore) -> Option<Vec3> {
        if self.lights.is_empty() {
            return None;
        }
        let light = &self.lights[rng.gen_range(0..self.lights.len())];
        Some((light.random_point(rng, p) - p).normalize_or_zero())
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
