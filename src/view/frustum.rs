//! View frustum for culling.
//!
//! Extracts frustum planes from the view-projection matrix and provides
//! intersection tests for points, spheres, AABBs, and other frustums.

use glam::{Mat4, Vec3, Vec4};

/// Axis-aligned bounding box in world or object space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Box from explicit corners.
    #[must_use]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing all `points`. Empty input collapses to the
    /// origin.
    #[must_use]
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for p in points {
            min = min.min(*p);
            max = max.max(*p);
        }
        if points.is_empty() {
            min = Vec3::ZERO;
            max = Vec3::ZERO;
        }
        Self { min, max }
    }

    /// Box center.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// The eight corners.
    #[must_use]
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// World-space box of this box under `transform` (bounds of the eight
    /// transformed corners).
    #[must_use]
    pub fn transform(&self, transform: &Mat4) -> Self {
        let corners = self.corners();
        let transformed: Vec<Vec3> = corners
            .iter()
            .map(|&c| transform.transform_point3(c))
            .collect();
        Self::from_points(&transformed)
    }

    /// Whether a sphere touches the box.
    #[must_use]
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        let closest = center.clamp(self.min, self.max);
        closest.distance_squared(center) <= radius * radius
    }
}

/// A plane in 3D space, represented as (normal.x, normal.y, normal.z,
/// distance) where the plane equation is: ax + by + cz + d = 0.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    /// Unit normal pointing into the positive half-space.
    pub normal: Vec3,
    /// Signed distance from origin (`n · p + d = 0`).
    pub distance: f32,
}

impl Plane {
    /// Create a plane from coefficients and normalize it.
    #[must_use]
    pub fn from_coefficients(a: f32, b: f32, c: f32, d: f32) -> Self {
        let len = (a * a + b * b + c * c).sqrt();
        if len > 0.0 {
            Self {
                normal: Vec3::new(a / len, b / len, c / len),
                distance: d / len,
            }
        } else {
            Self {
                normal: Vec3::ZERO,
                distance: 0.0,
            }
        }
    }

    /// Signed distance from point to plane (positive = in front, negative
    /// = behind).
    #[inline]
    #[must_use]
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// View frustum: six inward-facing planes plus the eight world-space
/// corners of the view volume.
#[derive(Debug, Clone)]
pub struct Frustum {
    /// Six clipping planes: left, right, bottom, top, near, far.
    pub planes: [Plane; 6],
    /// Volume corners: near quad then far quad.
    pub corners: [Vec3; 8],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix.
    /// Uses the Gribb/Hartmann method: row combinations `m3 ± mi` of the
    /// transposed matrix. Planes point inward (positive half-space is
    /// inside the frustum). Corners come from the inverse matrix.
    #[must_use]
    pub fn from_view_projection(vp: Mat4) -> Self {
        // Get matrix rows (glam stores column-major, so we transpose
        // conceptually)
        let row0 =
            Vec4::new(vp.x_axis.x, vp.y_axis.x, vp.z_axis.x, vp.w_axis.x);
        let row1 =
            Vec4::new(vp.x_axis.y, vp.y_axis.y, vp.z_axis.y, vp.w_axis.y);
        let row2 =
            Vec4::new(vp.x_axis.z, vp.y_axis.z, vp.z_axis.z, vp.w_axis.z);
        let row3 =
            Vec4::new(vp.x_axis.w, vp.y_axis.w, vp.z_axis.w, vp.w_axis.w);

        // For right-handed system with [0,1] depth range
        let left = row3 + row0;
        let right = row3 - row0;
        let bottom = row3 + row1;
        let top = row3 - row1;
        let near = row2; // [0,1] depth: near plane is just row2
        let far = row3 - row2;

        Self {
            planes: [
                Plane::from_coefficients(left.x, left.y, left.z, left.w),
                Plane::from_coefficients(right.x, right.y, right.z, right.w),
                Plane::from_coefficients(
                    bottom.x, bottom.y, bottom.z, bottom.w,
                ),
                Plane::from_coefficients(top.x, top.y, top.z, top.w),
                Plane::from_coefficients(near.x, near.y, near.z, near.w),
                Plane::from_coefficients(far.x, far.y, far.z, far.w),
            ],
            corners: corners_from_inverse(vp),
        }
    }

    /// Test if a point is inside the frustum.
    #[inline]
    #[must_use]
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(point) >= 0.0)
    }

    /// Test if a sphere intersects or is inside the frustum.
    #[inline]
    #[must_use]
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(center) >= -radius)
    }

    /// Test if an AABB intersects or is inside the frustum.
    ///
    /// Positive-vertex test: for each plane, check the box corner furthest
    /// along the plane normal; if even that corner is behind, the whole
    /// box is outside.
    #[must_use]
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            let positive = Vec3::new(
                if plane.normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if plane.normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if plane.normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            plane.distance_to_point(positive) >= 0.0
        })
    }

    /// Conservative frustum-frustum overlap test.
    ///
    /// Rejects only when all corners of one frustum lie behind a single
    /// plane of the other (tested both directions); may report overlap for
    /// some disjoint volumes, never the reverse.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        no_separating_plane(&self.planes, &other.corners)
            && no_separating_plane(&other.planes, &self.corners)
    }
}

fn no_separating_plane(planes: &[Plane; 6], corners: &[Vec3; 8]) -> bool {
    !planes.iter().any(|plane| {
        corners
            .iter()
            .all(|&corner| plane.distance_to_point(corner) < 0.0)
    })
}

fn corners_from_inverse(vp: Mat4) -> [Vec3; 8] {
    if vp.determinant().abs() <= f32::EPSILON {
        return [Vec3::ZERO; 8];
    }
    let inv = vp.inverse();
    // NDC cube with [0,1] depth: near quad (z=0) then far quad (z=1).
    let ndc = [
        Vec3::new(-1.0, -1.0, 0.0),
        Vec3::new(1.0, -1.0, 0.0),
        Vec3::new(-1.0, 1.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(-1.0, 1.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
    ];
    let mut corners = [Vec3::ZERO; 8];
    for (corner, &n) in corners.iter_mut().zip(ndc.iter()) {
        *corner = inv.project_point3(n);
    }
    corners
}
