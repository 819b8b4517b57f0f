//! Light source description.

use crate::math::{Vec3, Vec4};

/// A single light with ambient and emitted intensity.
///
/// The homogeneous position doubles as the variant tag: `w = 1` is a point
/// light, `w = 0` a directional light. Shaders consume the raw `Vec4` and
/// derive the light vector without branching on the kind.
#[derive(Debug, Clone, Copy)]
pub struct Light {
    pub ambient: Vec3,
    pub emitted: Vec3,
    pub position: Vec4,
}

impl Light {
    pub fn new(ambient: Vec3, emitted: Vec3, position: Vec4) -> Self {
        Self { ambient, emitted, position }
    }

    pub fn set_point(&mut self, position: Vec3) {
        self.position = position.extend(1.0);
    }

    pub fn set_directional(&mut self, direction: Vec3) {
        self.position = direction.extend(0.0);
    }

    pub fn is_directional(&self) -> bool {
        self.position.w == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_homogeneous_kind_switch() {
        let mut light = Light::new(
            Vec3::splat(1.0),
            Vec3::splat(1.0),
            Vec4::new(0.1, 0.1, 0.1, 0.0),
        );
        assert!(light.is_directional());

        light.set_point(Vec3::new(0.0, 100.0, 0.0));
        assert!(!light.is_directional());
        assert_eq!(light.position, Vec4::new(0.0, 100.0, 0.0, 1.0));

        light.set_directional(Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(light.position.w, 0.0);
    }
}
