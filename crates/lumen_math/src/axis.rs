use crate::Vec3;

/// A coordinate axis, used to pick split planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Axis {
    #[default]
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// 0 for X, 1 for Y, 2 for Z.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// The component of `v` along this axis.
    #[inline]
    pub fn of(self, v: Vec3) -> f64 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_component() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(Axis::X.of(v), 1.0);
        assert_eq!(Axis::Y.of(v), 2.0);
        assert_eq!(Axis::Z.of(v), 3.0);
        assert_eq!(Axis::ALL.map(Axis::index), [0, 1, 2]);
    }
}
