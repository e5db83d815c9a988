//! Triangle meshes placed in the world and indexed by their own KD-tree.

use crate::{
    error::{RenderError, RenderResult},
    hittable::{HitRecord, Hittable},
    kd_tree::KdTree,
    Material, Ray, Triangle,
};
use lumen_core::{load_obj, ObjModel};
use lumen_math::{Aabb, Interval, Vec3};
use rand::{Rng, RngCore};
use std::path::Path;
use std::sync::Arc;

/// A triangle mesh that the outer scene treats as a single object.
pub struct Mesh {
    tree: KdTree<Triangle>,
    center: Vec3,
    bbox: Aabb,
}

impl Mesh {
    /// Place `triangles` in the world: every vertex is scaled by `scale`
    /// and then offset by `center`.
    pub fn new(center: Vec3, scale: f64, mut triangles: Vec<Triangle>) -> RenderResult<Self> {
        if triangles.is_empty() {
            return Err(RenderError::EmptyMesh);
        }

        for tri in &mut triangles {
            tri.scale_and_translate(scale, center);
        }

        let bbox = triangles
            .iter()
            .fold(Aabb::EMPTY, |acc, t| Aabb::surrounding(&acc, &t.bounding_box()));
        let tree = KdTree::build(triangles);

        log::info!(
            "Built mesh: {} triangles, {} KD-tree nodes",
            tree.len(),
            tree.node_count()
        );

        Ok(Self { tree, center, bbox })
    }

    /// Build a mesh from loaded OBJ data.
    pub fn from_obj(model: &ObjModel, center: Vec3, scale: f64) -> RenderResult<Self> {
        let triangles = model
            .triangles
            .iter()
            .map(|t| Triangle::new(t.positions, t.normals, t.uvs, Arc::clone(&t.material)))
            .collect();
        Self::new(center, scale, triangles)
    }

    pub fn triangles(&self) -> &[Triangle] {
        self.tree.objects()
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

/// Load an OBJ file (and its MTL library) as a placed mesh.
///
/// `parent` is the material for faces without a `usemtl`, and the base that
/// every named material starts from.
pub fn load_mesh(
    path: impl AsRef<Path>,
    center: Vec3,
    scale: f64,
    parent: &Material,
) -> RenderResult<Mesh> {
    let model = load_obj(path, parent)?;
    Mesh::from_obj(&model, center, scale)
}

impl Hittable for Mesh {
    fn intersect<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        // Tests inside a mesh are not reported to the render counters
        let mut tests = 0;
        self.tree.nearest_hit(ray, ray_t, &mut tests)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn mid_point(&self) -> Vec3 {
        self.center
    }

    fn material(&self) -> &Material {
        self.tree.objects()[0].material()
    }

    /// Point on a uniformly chosen triangle. Large and small triangles are
    /// equally likely, so this is not area-uniform over the whole mesh.
    fn random_point(&self, rng: &mut dyn RngCore, reference: Vec3) -> Vec3 {
        let index = rng.gen_range(0..self.tree.len());
        self.tree.objects()[index].random_point(rng, reference)
    }
}
