//! KD-tree acceleration structure with a surface area heuristic split search.
//!
//! Nodes live in an arena and refer to each other by index. Every node owns a
//! range of one shared index buffer: building a node partitions its range in
//! place so that the left child's members come first, which means an internal
//! node's range still covers all of its members.

use crate::{HitRecord, Hittable, Ray};
use lumen_math::{Aabb, Axis, Interval};
use std::collections::HashSet;
use std::ops::Range;

/// Candidate split planes sampled per axis.
pub const SAH_RESOLUTION: usize = 32;

type NodeId = usize;

struct Node {
    bbox: Aabb,
    axis: Axis,
    members: Range<usize>,
    children: Option<[NodeId; 2]>,
}

impl Node {
    fn leaf(bbox: Aabb, members: Range<usize>) -> Self {
        Self {
            bbox,
            axis: Axis::default(),
            members,
            children: None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Query {
    Nearest,
    Any,
}

/// Binary space partition over a set of hittable objects.
pub struct KdTree<H> {
    objects: Vec<H>,
    indices: Vec<u32>,
    nodes: Vec<Node>,
}

#[derive(Clone, Copy)]
struct Split {
    axis: Axis,
    plane: f64,
    cost: f64,
}

impl<H: Hittable> KdTree<H> {
    /// Build a tree over `objects`. The tree takes ownership of them.
    pub fn build(objects: Vec<H>) -> Self {
        let mut tree = Self {
            indices: (0..objects.len() as u32).collect(),
            objects,
            nodes: Vec::new(),
        };
        let all = 0..tree.indices.len();
        tree.build_node(all);

        log::debug!(
            "Built KD-tree: {} objects, {} nodes, depth {}",
            tree.objects.len(),
            tree.nodes.len(),
            tree.depth()
        );
        tree
    }

    fn build_node(&mut self, members: Range<usize>) -> NodeId {
        let id = self.nodes.len();

        if members.is_empty() {
            self.nodes.push(Node::leaf(Aabb::EMPTY, members));
            return id;
        }

        let bbox = self.indices[members.clone()]
            .iter()
            .fold(Aabb::EMPTY, |acc, &i| {
                Aabb::surrounding(&acc, &self.objects[i as usize].bounding_box())
            });
        self.nodes.push(Node::leaf(bbox, members.clone()));

        if members.len() == 1 {
            let children = self.empty_children(members.end);
            self.nodes[id].children = Some(children);
            return id;
        }

        let split = self.find_split(&bbox, members.clone());
        self.nodes[id].axis = split.axis;

        let (left, right) = self.partition(members.clone(), split);

        // Members shared by both halves. A centroid partition is disjoint, so
        // in practice this stays zero and an empty half (0 / 0) is what stops
        // the recursion.
        let right_set: HashSet<u32> = right.iter().copied().collect();
        let matches = left.iter().filter(|i| right_set.contains(i)).count() as f64;
        let subdivide =
            matches / (left.len() as f64) < 0.5 && matches / (right.len() as f64) < 0.5;

        let children = if subdivide {
            let mid = members.start + left.len();
            self.indices[members.start..mid].copy_from_slice(&left);
            self.indices[mid..members.end].copy_from_slice(&right);

            let l = self.build_node(members.start..mid);
            let r = self.build_node(mid..members.end);
            [l, r]
        } else {
            self.empty_children(members.end)
        };
        self.nodes[id].children = Some(children);

        id
    }

    fn empty_children(&mut self, at: usize) -> [NodeId; 2] {
        let l = self.build_node(at..at);
        let r = self.build_node(at..at);
        [l, r]
    }

    /// Search every axis for the plane with the lowest
    /// `count_left * area_left + count_right * area_right`.
    fn find_split(&self, bbox: &Aabb, members: Range<usize>) -> Split {
        let mut best = Split {
            axis: Axis::X,
            plane: bbox.x.min,
            cost: f64::INFINITY,
        };

        for axis in Axis::ALL {
            let extent = bbox.axis_interval(axis);
            for i in 0..SAH_RESOLUTION {
                let plane = extent.min + extent.size() * i as f64 / SAH_RESOLUTION as f64;

                let mut left_box = Aabb::EMPTY;
                let mut right_box = Aabb::EMPTY;
                let (mut n_left, mut n_right) = (0usize, 0usize);
                for &idx in &self.indices[members.clone()] {
                    let object = &self.objects[idx as usize];
                    if axis.of(object.mid_point()) < plane {
                        left_box.extend(&object.bounding_box());
                        n_left += 1;
                    } else {
                        right_box.extend(&object.bounding_box());
                        n_right += 1;
                    }
                }

                let cost = n_left as f64 * left_box.surface_area()
                    + n_right as f64 * right_box.surface_area();
                if cost < best.cost {
                    best = Split { axis, plane, cost };
                }
            }
        }

        best
    }

    /// Stable split of `members` by centroid against the winning plane.
    fn partition(&self, members: Range<usize>, split: Split) -> (Vec<u32>, Vec<u32>) {
        self.indices[members].iter().partition(|&&idx| {
            split.axis.of(self.objects[idx as usize].mid_point()) < split.plane
        })
    }

    /// Closest hit with `t` inside `ray_t`.
    ///
    /// `tests` is bumped once per primitive intersection test.
    pub fn nearest_hit(
        &self,
        ray: &Ray,
        ray_t: Interval,
        tests: &mut u64,
    ) -> Option<HitRecord<'_>> {
        if self.nodes.is_empty() {
            return None;
        }
        self.traverse(0, ray, ray_t, Query::Nearest, tests)
    }

    /// True if anything intersects the ray inside `ray_t`.
    pub fn any_hit(&self, ray: &Ray, ray_t: Interval, tests: &mut u64) -> bool {
        !self.nodes.is_empty() && self.traverse(0, ray, ray_t, Query::Any, tests).is_some()
    }

    fn traverse(
        &self,
        id: NodeId,
        ray: &Ray,
        ray_t: Interval,
        query: Query,
        tests: &mut u64,
    ) -> Option<HitRecord<'_>> {
        let node = &self.nodes[id];
        if !node.bbox.hit(ray, ray_t) {
            return None;
        }

        if let Some([left, right]) = node.children {
            let internal = !self.nodes[left].members.is_empty()
                || !self.nodes[right].members.is_empty();
            if internal {
                let a = self.traverse(left, ray, ray_t, query, tests);
                if query == Query::Any && a.is_some() {
                    return a;
                }
                let b = self.traverse(right, ray, ray_t, query, tests);
                return match (a, b) {
                    (Some(a), Some(b)) => Some(if b.t < a.t { b } else { a }),
                    (a, b) => a.or(b),
                };
            }
        }

        let mut closest = ray_t.max;
        let mut hit = None;
        for &idx in &self.indices[node.members.clone()] {
            *tests += 1;
            let window = Interval::new(ray_t.min, closest);
            if let Some(rec) = self.objects[idx as usize].intersect(ray, window) {
                if query == Query::Any {
                    return Some(rec);
                }
                closest = rec.t;
                hit = Some(rec);
            }
        }
        hit
    }

    /// Bounding box of everything in the tree.
    pub fn bounding_box(&self) -> Aabb {
        self.nodes.first().map_or(Aabb::EMPTY, |root| root.bbox)
    }

    pub fn objects(&self) -> &[H] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        fn walk<H>(tree: &KdTree<H>, id: NodeId) -> usize {
            match tree.nodes[id].children {
                Some([l, r]) => 1 + walk(tree, l).max(walk(tree, r)),
                None => 1,
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(self, 0)
        }
    }
}
