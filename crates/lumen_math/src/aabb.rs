use crate::{Axis, Interval, Ray, Vec3};

/// Axis-aligned bounding box for the KD-tree.
///
/// An AABB is defined by three intervals (one per axis). `Aabb::EMPTY` is the
/// identity for [`Aabb::surrounding`]; once anything has been unioned in,
/// `min() <= max()` holds componentwise.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

/// Minimum width of a box along any axis.
const MIN_EXTENT: f64 = 0.0001;

impl Aabb {
    /// Create a new AABB from three intervals.
    pub fn new(x: Interval, y: Interval, z: Interval) -> Self {
        let mut aabb = Self { x, y, z };
        aabb.pad_to_minimums();
        aabb
    }

    /// Create an AABB from two corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let x = Interval::new(a.x.min(b.x), a.x.max(b.x));
        let y = Interval::new(a.y.min(b.y), a.y.max(b.y));
        let z = Interval::new(a.z.min(b.z), a.z.max(b.z));

        Self::new(x, y, z)
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&box0.x, &box1.x),
            y: Interval::surrounding(&box0.y, &box1.y),
            z: Interval::surrounding(&box0.z, &box1.z),
        }
    }

    /// Grow this box in place to also cover `other`.
    pub fn extend(&mut self, other: &Aabb) {
        *self = Aabb::surrounding(self, other);
    }

    /// Lower corner.
    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    /// Upper corner.
    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    /// Get the interval for a specific axis.
    pub fn axis_interval(&self, axis: Axis) -> Interval {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// True if nothing has been unioned into this box yet.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty() || self.z.is_empty()
    }

    /// Total area of the six faces. An empty box has no area.
    pub fn surface_area(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let length = self.x.size();
        let height = self.y.size();
        let width = self.z.size();

        2.0 * (length * width + length * height + width * height)
    }

    /// Test if a ray intersects this AABB within the given interval.
    ///
    /// Slab method. A zero direction component yields ±infinity slab bounds;
    /// a NaN bound (ray origin lying on a slab plane) is ignored by
    /// `f64::max`/`f64::min`, leaving that axis unconstrained.
    pub fn hit(&self, r: &Ray, mut ray_t: Interval) -> bool {
        for axis in Axis::ALL {
            let slab = self.axis_interval(axis);
            let adinv = 1.0 / axis.of(r.direction);
            let origin = axis.of(r.origin);

            let mut t0 = (slab.min - origin) * adinv;
            let mut t1 = (slab.max - origin) * adinv;
            if adinv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            ray_t.min = t0.max(ray_t.min);
            ray_t.max = t1.min(ray_t.max);
            if ray_t.max <= ray_t.min {
                return false;
            }
        }

        true
    }

    /// Entry and exit parameters of the infinite line through `r`,
    /// or `None` if the line misses the box.
    pub fn intersect(&self, r: &Ray) -> Option<(f64, f64)> {
        let mut enter = f64::NEG_INFINITY;
        let mut exit = f64::INFINITY;

        for axis in Axis::ALL {
            let slab = self.axis_interval(axis);
            let d = axis.of(r.direction);
            let o = axis.of(r.origin);

            let mut t0 = (slab.min - o) / d;
            let mut t1 = (slab.max - o) / d;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            enter = enter.max(t0);
            exit = exit.min(t1);
        }

        (enter <= exit).then_some((enter, exit))
    }

    /// Pad intervals to avoid zero-width AABBs (degenerate cases).
    fn pad_to_minimums(&mut self) {
        if self.x.size() < MIN_EXTENT {
            self.x = self.x.expand(MIN_EXTENT);
        }
        if self.y.size() < MIN_EXTENT {
            self.y = self.y.expand(MIN_EXTENT);
        }
        if self.z.size() < MIN_EXTENT {
            self.z = self.z.expand(MIN_EXTENT);
        }
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        (self.min() + self.max()) * 0.5
    }

    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    #[test]
    fn test_aabb_from_points() {
        let aabb = Aabb::from_points(Vec3::new(10.0, 0.0, 10.0), Vec3::new(0.0, 10.0, 0.0));

        assert_eq!(aabb.min(), Vec3::ZERO);
        assert_eq!(aabb.max(), Vec3::splat(10.0));
    }

    #[test]
    fn test_flat_box_is_padded() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0));
        assert!(aabb.y.size() > 0.0);
        assert!(aabb.surface_area() > 2.0);
    }

    #[test]
    fn test_aabb_extend() {
        let mut aabb = Aabb::EMPTY;
        assert!(aabb.is_empty());

        aabb.extend(&Aabb::from_points(Vec3::ZERO, Vec3::splat(5.0)));
        aabb.extend(&Aabb::from_points(Vec3::splat(3.0), Vec3::splat(10.0)));

        assert!(!aabb.is_empty());
        assert_eq!(aabb.min(), Vec3::ZERO);
        assert_eq!(aabb.max(), Vec3::splat(10.0));
    }

    #[test]
    fn test_surface_area() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0));
        assert!((aabb.surface_area() - 22.0).abs() < 1e-12);
        assert_eq!(Aabb::EMPTY.surface_area(), 0.0);
    }

    #[test]
    fn test_aabb_hit() {
        let aabb = unit_box();

        // Ray pointing at center
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(aabb.hit(&ray, Interval::new(0.0, 100.0)));

        // Ray pointing away
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(!aabb.hit(&ray, Interval::new(0.0, 100.0)));

        // Ray missing the box
        let ray = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(!aabb.hit(&ray, Interval::new(0.0, 100.0)));
    }

    #[test]
    fn test_hit_with_origin_on_slab_plane() {
        // Origin lies exactly on the x = 1 plane and the ray is parallel to it,
        // which makes one slab bound 0 * inf = NaN.
        let aabb = unit_box();
        let ray = Ray::new(Vec3::new(1.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(aabb.hit(&ray, Interval::new(0.0, 100.0)));
    }

    #[test]
    fn test_intersect_interval() {
        let aabb = unit_box();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 2.0));
        let (enter, exit) = aabb.intersect(&ray).unwrap();

        assert!((enter - 2.0).abs() < 1e-12);
        assert!((exit - 3.0).abs() < 1e-12);

        let miss = Ray::new(Vec3::new(5.0, 5.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect(&miss).is_none());
    }

    #[test]
    fn test_aabb_centroid() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::splat(10.0));
        assert_eq!(aabb.centroid(), Vec3::splat(5.0));
    }
}
