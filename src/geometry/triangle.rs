//! Triangles and their shading classification.

use glam::Vec3;

use super::Aabb;

/// Shading behavior of a surface, encoded as a scalar tag for the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Material {
    /// Lambertian diffuse.
    #[default]
    Matte,
    /// Perfect mirror reflection.
    MetalShiny,
    /// Perturbed mirror reflection.
    MetalFuzzy,
    /// Light source. Color channels may exceed 1.0.
    Emissive,
}

impl Material {
    /// All variants, in tag order. Drives the material picker in the UI.
    pub const ALL: [Self; 4] =
        [Self::Matte, Self::MetalShiny, Self::MetalFuzzy, Self::Emissive];

    /// The scalar tag the kernel switches on.
    #[must_use]
    pub fn tag(self) -> f32 {
        match self {
            Self::Matte => 0.0,
            Self::MetalShiny => 1.0,
            Self::MetalFuzzy => 2.0,
            Self::Emissive => 3.0,
        }
    }

    /// Human-readable name for UI display.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Matte => "Matte",
            Self::MetalShiny => "Metal (shiny)",
            Self::MetalFuzzy => "Metal (fuzzy)",
            Self::Emissive => "Emissive",
        }
    }
}

/// A triangle with world-space vertices, shading attributes, and its
/// bounding box cached at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    /// First vertex.
    pub v0: Vec3,
    /// Second vertex.
    pub v1: Vec3,
    /// Third vertex.
    pub v2: Vec3,
    /// Linear-space color.
    pub color: Vec3,
    /// Shading classification.
    pub material: Material,
    /// Cached bounding box (degenerate axes padded).
    pub bbox: Aabb,
}

impl Triangle {
    /// Triangle from three vertices plus shading attributes. Computes and
    /// caches the bounding box.
    #[must_use]
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, color: Vec3, material: Material) -> Self {
        let bbox = Aabb::from_points(&[v0, v1, v2]);
        Self {
            v0,
            v1,
            v2,
            color,
            material,
            bbox,
        }
    }

    /// Whether every vertex component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.v0.is_finite() && self.v1.is_finite() && self.v2.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_is_cached_at_construction() {
        let tri = Triangle::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 3.0, 1.0),
            Vec3::ONE,
            Material::Matte,
        );
        assert_eq!(tri.bbox.min.x, 0.0);
        assert_eq!(tri.bbox.max, Vec3::new(2.0, 3.0, 1.0));
    }

    #[test]
    fn material_tags_are_stable() {
        assert_eq!(Material::Matte.tag(), 0.0);
        assert_eq!(Material::MetalShiny.tag(), 1.0);
        assert_eq!(Material::MetalFuzzy.tag(), 2.0);
        assert_eq!(Material::Emissive.tag(), 3.0);
    }

    #[test]
    fn non_finite_vertices_are_detected() {
        let good = Triangle::new(
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
            Vec3::ONE,
            Material::Matte,
        );
        assert!(good.is_finite());

        let bad = Triangle::new(
            Vec3::new(f32::NAN, 0.0, 0.0),
            Vec3::X,
            Vec3::Y,
            Vec3::ONE,
            Material::Matte,
        );
        assert!(!bad.is_finite());
    }
}
