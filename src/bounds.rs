//! Bounding volume types for 3D Tiles

use std::collections::BTreeMap;

use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};

use crate::geodetic::{Geodetic, WGS84_A};

/// Numeric components supplied either as a sequential list or as an object
/// keyed by string numerals ("0", "1", ...). Both shapes occur in published
/// tilesets, so both must parse to the same geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Components {
    List(Vec<f64>),
    Keyed(BTreeMap<String, f64>),
}

impl Components {
    /// Normalizing accessor: the component at `index` regardless of
    /// container shape.
    pub fn get(&self, index: usize) -> Option<f64> {
        match self {
            Self::List(values) => values.get(index).copied(),
            Self::Keyed(map) => map.get(index.to_string().as_str()).copied(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::List(values) => values.len(),
            Self::Keyed(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn vec3(&self, start: usize) -> Option<DVec3> {
        Some(DVec3::new(
            self.get(start)?,
            self.get(start + 1)?,
            self.get(start + 2)?,
        ))
    }
}

impl From<Vec<f64>> for Components {
    fn from(values: Vec<f64>) -> Self {
        Self::List(values)
    }
}

/// Bounding volume for a 3D Tile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoundingVolume {
    /// Oriented bounding box
    Box(BoundingBox),
    /// Bounding sphere
    Sphere(BoundingSphere),
    /// Geographic region (WGS84)
    Region(BoundingRegion),
}

/// Oriented bounding box defined by center and half-axes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    /// 12 numbers: [cx, cy, cz, xx, xy, xz, yx, yy, yz, zx, zy, zz]
    /// center (3) + x half-axis (3) + y half-axis (3) + z half-axis (3)
    #[serde(rename = "box")]
    pub data: Components,
}

/// Bounding sphere defined by center and radius
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingSphere {
    /// 4 numbers: [cx, cy, cz, radius]
    pub sphere: Components,
}

/// Geographic bounding region in WGS84
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingRegion {
    /// 6 numbers: [west, south, east, north, min_height, max_height]
    /// Longitude/latitude in radians, heights in meters
    pub region: Components,
}

impl BoundingBox {
    /// Validate and extract the box geometry. `None` when any of the 12
    /// components is missing.
    pub fn parse(&self) -> Option<OrientedBox> {
        Some(OrientedBox {
            center: self.data.vec3(0)?,
            half_x: self.data.vec3(3)?,
            half_y: self.data.vec3(6)?,
            half_z: self.data.vec3(9)?,
        })
    }
}

impl BoundingSphere {
    /// Validate and extract the sphere geometry
    pub fn parse(&self) -> Option<Sphere> {
        Some(Sphere {
            center: self.sphere.vec3(0)?,
            radius: self.sphere.get(3)?,
        })
    }
}

impl BoundingRegion {
    /// Validate and extract the region bounds
    pub fn parse(&self) -> Option<RegionBounds> {
        Some(RegionBounds {
            west: self.region.get(0)?,
            south: self.region.get(1)?,
            east: self.region.get(2)?,
            north: self.region.get(3)?,
            min_height: self.region.get(4)?,
            max_height: self.region.get(5)?,
        })
    }
}

impl BoundingVolume {
    /// Smallest sphere enclosing the volume, in the volume's own frame.
    /// Regions are absolute geodetic, so their sphere comes back in ECEF.
    pub fn enclosing_sphere(&self) -> Option<Sphere> {
        match self {
            Self::Box(b) => b.parse().map(|ob| ob.enclosing_sphere()),
            Self::Sphere(s) => s.parse(),
            Self::Region(r) => r.parse().map(|rb| rb.enclosing_sphere()),
        }
    }
}

/// Validated oriented box: center plus three half-extent axis vectors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    pub center: DVec3,
    pub half_x: DVec3,
    pub half_y: DVec3,
    pub half_z: DVec3,
}

impl OrientedBox {
    /// Transform the box by a matrix
    pub fn transform(&self, matrix: &DMat4) -> Self {
        Self {
            center: matrix.transform_point3(self.center),
            half_x: matrix.transform_vector3(self.half_x),
            half_y: matrix.transform_vector3(self.half_y),
            half_z: matrix.transform_vector3(self.half_z),
        }
    }

    /// Sphere enclosing all eight corners
    pub fn enclosing_sphere(&self) -> Sphere {
        let radius = (self.half_x.length_squared()
            + self.half_y.length_squared()
            + self.half_z.length_squared())
        .sqrt();
        Sphere {
            center: self.center,
            radius,
        }
    }
}

/// Validated bounding sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: DVec3,
    pub radius: f64,
}

impl Sphere {
    /// Transform the sphere by a matrix; the radius picks up the largest
    /// scale factor
    pub fn transform(&self, matrix: &DMat4) -> Self {
        let center = matrix.transform_point3(self.center);
        let (scale, _, _) = matrix.to_scale_rotation_translation();
        let max_scale = scale.x.max(scale.y).max(scale.z);
        Self {
            center,
            radius: self.radius * max_scale,
        }
    }
}

/// Validated geographic region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
    pub min_height: f64,
    pub max_height: f64,
}

impl RegionBounds {
    /// Geodetic midpoint of the region
    pub fn center(&self) -> Geodetic {
        Geodetic::new(
            (self.west + self.east) / 2.0,
            (self.south + self.north) / 2.0,
            (self.min_height + self.max_height) / 2.0,
        )
    }

    /// Approximate enclosing sphere: angular span scaled by the semi-major
    /// axis, combined with the height span
    pub fn enclosing_sphere(&self) -> Sphere {
        let d_lon = (self.east - self.west).abs();
        let d_lat = (self.north - self.south).abs();
        let d_h = self.max_height - self.min_height;
        let horiz = d_lon.max(d_lat) * WGS84_A;
        Sphere {
            center: self.center().to_ecef(),
            radius: (horiz * horiz + d_h * d_h).sqrt() / 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_box_from_list() {
        let json = r#"{ "box": [1, 2, 3, 10, 0, 0, 0, 10, 0, 0, 0, 5] }"#;
        let bb: BoundingBox = serde_json::from_str(json).unwrap();
        let ob = bb.parse().unwrap();
        assert_eq!(ob.center, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(ob.half_x, DVec3::new(10.0, 0.0, 0.0));
        assert_eq!(ob.half_z, DVec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_parse_box_from_string_keyed_map() {
        // Same numbers as an object keyed by string numerals
        let json = r#"{ "box": {
            "0": 1, "1": 2, "2": 3,
            "3": 10, "4": 0, "5": 0,
            "6": 0, "7": 10, "8": 0,
            "9": 0, "10": 0, "11": 5
        } }"#;
        let keyed: BoundingBox = serde_json::from_str(json).unwrap();
        let list: BoundingBox =
            serde_json::from_str(r#"{ "box": [1, 2, 3, 10, 0, 0, 0, 10, 0, 0, 0, 5] }"#).unwrap();
        assert_eq!(keyed.parse().unwrap(), list.parse().unwrap());
    }

    #[test]
    fn test_truncated_box_rejected() {
        let json = r#"{ "box": [1, 2, 3, 10, 0, 0, 0, 10, 0, 0, 0] }"#;
        let bb: BoundingBox = serde_json::from_str(json).unwrap();
        assert!(bb.parse().is_none());
    }

    #[test]
    fn test_untagged_volume_selection() {
        let sphere: BoundingVolume =
            serde_json::from_str(r#"{ "sphere": [0, 0, 0, 100] }"#).unwrap();
        assert!(matches!(sphere, BoundingVolume::Sphere(_)));

        let region: BoundingVolume =
            serde_json::from_str(r#"{ "region": [-0.1, 0.2, -0.05, 0.25, 0, 80] }"#).unwrap();
        assert!(matches!(region, BoundingVolume::Region(_)));
    }

    #[test]
    fn test_box_enclosing_sphere_radius() {
        let ob = OrientedBox {
            center: DVec3::ZERO,
            half_x: DVec3::new(3.0, 0.0, 0.0),
            half_y: DVec3::new(0.0, 4.0, 0.0),
            half_z: DVec3::ZERO,
        };
        assert!((ob.enclosing_sphere().radius - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_sphere_transform_scales_radius() {
        let s = Sphere {
            center: DVec3::new(1.0, 0.0, 0.0),
            radius: 2.0,
        };
        let m = DMat4::from_scale(DVec3::new(3.0, 1.0, 1.0));
        let t = s.transform(&m);
        assert!((t.radius - 6.0).abs() < 1e-12);
        assert!((t.center.x - 3.0).abs() < 1e-12);
    }
}
