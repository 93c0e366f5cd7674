//! Base footprint derivation for ground alignment

use glam::DVec3;

use crate::bounds::{OrientedBox, RegionBounds, Sphere};
use crate::geodetic::{ecef_to_geodetic, Geodetic};

/// Four world-space corners of a model's base, in fixed winding order
/// (−X−Y, +X−Y, +X+Y, −X+Y as seen from above).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub corners: [DVec3; 4],
}

impl Footprint {
    /// Bottom face of an oriented box
    pub fn from_box(b: &OrientedBox) -> Self {
        let base = b.center - b.half_z;
        Self {
            corners: [
                base - b.half_x - b.half_y,
                base + b.half_x - b.half_y,
                base + b.half_x + b.half_y,
                base - b.half_x + b.half_y,
            ],
        }
    }

    /// Region corners at the region's minimum height
    pub fn from_region(r: &RegionBounds) -> Self {
        let h = r.min_height;
        Self {
            corners: [
                Geodetic::new(r.west, r.south, h).to_ecef(),
                Geodetic::new(r.east, r.south, h).to_ecef(),
                Geodetic::new(r.east, r.north, h).to_ecef(),
                Geodetic::new(r.west, r.north, h).to_ecef(),
            ],
        }
    }

    /// Cardinal points around the sphere's horizontal great circle.
    ///
    /// A sphere has no true footprint; these four points at the center's
    /// height approximate one and carry lower fidelity than a box or region.
    pub fn from_sphere(s: &Sphere) -> Self {
        let g = ecef_to_geodetic(s.center);
        let east = g.east() * s.radius;
        let north = g.north() * s.radius;
        Self {
            corners: [
                s.center - east,
                s.center - north,
                s.center + east,
                s.center + north,
            ],
        }
    }

    /// Arithmetic mean of the corners
    pub fn centroid(&self) -> DVec3 {
        (self.corners[0] + self.corners[1] + self.corners[2] + self.corners[3]) / 4.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodetic::Geodetic;

    #[test]
    fn test_box_bottom_face_winding() {
        let b = OrientedBox {
            center: DVec3::new(0.0, 0.0, 10.0),
            half_x: DVec3::new(2.0, 0.0, 0.0),
            half_y: DVec3::new(0.0, 3.0, 0.0),
            half_z: DVec3::new(0.0, 0.0, 10.0),
        };
        let f = Footprint::from_box(&b);
        assert_eq!(f.corners[0], DVec3::new(-2.0, -3.0, 0.0));
        assert_eq!(f.corners[1], DVec3::new(2.0, -3.0, 0.0));
        assert_eq!(f.corners[2], DVec3::new(2.0, 3.0, 0.0));
        assert_eq!(f.corners[3], DVec3::new(-2.0, 3.0, 0.0));
    }

    #[test]
    fn test_region_corners_at_min_height() {
        let r = RegionBounds {
            west: -0.01,
            south: -0.01,
            east: 0.01,
            north: 0.01,
            min_height: 40.0,
            max_height: 90.0,
        };
        let f = Footprint::from_region(&r);
        for corner in f.corners {
            let g = ecef_to_geodetic(corner);
            assert!((g.height - 40.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_sphere_footprint_rides_center_height() {
        let center = Geodetic::from_degrees(8.5, 47.4, 320.0).to_ecef();
        let s = Sphere {
            center,
            radius: 50.0,
        };
        let f = Footprint::from_sphere(&s);
        for corner in f.corners {
            let g = ecef_to_geodetic(corner);
            // Tangent-plane points sit slightly above the curved surface;
            // well under a millimeter at this radius
            assert!((g.height - 320.0).abs() < 1e-3);
            assert!(((corner - center).length() - 50.0).abs() < 1e-9);
        }
    }
}
