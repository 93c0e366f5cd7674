//! WGS84 geodetic/ECEF conversions and local tangent frames

use glam::{DMat4, DVec3};

/// WGS84 semi-major axis in meters
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 first eccentricity squared
pub const WGS84_E2: f64 = 0.006_694_379_990_14;

/// Geodetic position: longitude/latitude in radians, ellipsoidal height in meters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geodetic {
    pub lon: f64,
    pub lat: f64,
    pub height: f64,
}

impl Geodetic {
    pub fn new(lon: f64, lat: f64, height: f64) -> Self {
        Self { lon, lat, height }
    }

    pub fn from_degrees(lon_deg: f64, lat_deg: f64, height: f64) -> Self {
        Self::new(lon_deg.to_radians(), lat_deg.to_radians(), height)
    }

    /// Convert to geocentric (ECEF) coordinates
    pub fn to_ecef(&self) -> DVec3 {
        let sin_lat = self.lat.sin();
        let cos_lat = self.lat.cos();
        let sin_lon = self.lon.sin();
        let cos_lon = self.lon.cos();
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        let x = (n + self.height) * cos_lat * cos_lon;
        let y = (n + self.height) * cos_lat * sin_lon;
        let z = (n * (1.0 - WGS84_E2) + self.height) * sin_lat;
        DVec3::new(x, y, z)
    }

    /// Unit vector pointing east at this position
    pub fn east(&self) -> DVec3 {
        DVec3::new(-self.lon.sin(), self.lon.cos(), 0.0)
    }

    /// Unit vector pointing north at this position
    pub fn north(&self) -> DVec3 {
        let sin_lat = self.lat.sin();
        let cos_lat = self.lat.cos();
        DVec3::new(
            -sin_lat * self.lon.cos(),
            -sin_lat * self.lon.sin(),
            cos_lat,
        )
    }

    /// Ellipsoid surface normal (geodetic up) at this position
    pub fn up(&self) -> DVec3 {
        let cos_lat = self.lat.cos();
        DVec3::new(
            cos_lat * self.lon.cos(),
            cos_lat * self.lon.sin(),
            self.lat.sin(),
        )
    }
}

/// Convert an ECEF position to geodetic coordinates.
///
/// Iterative refinement of latitude and height; converges well below a
/// millimeter within a few rounds for positions anywhere near the surface.
pub fn ecef_to_geodetic(p: DVec3) -> Geodetic {
    let lon = p.y.atan2(p.x);
    let s = (p.x * p.x + p.y * p.y).sqrt();

    if s < 1e-9 {
        // On the polar axis; latitude degenerates, height is measured from the pole
        let b = WGS84_A * (1.0 - WGS84_E2).sqrt();
        let lat = std::f64::consts::FRAC_PI_2.copysign(p.z);
        return Geodetic::new(lon, lat, p.z.abs() - b);
    }

    let mut lat = (p.z / (s * (1.0 - WGS84_E2))).atan();
    let mut height = 0.0;
    for _ in 0..4 {
        let sin_lat = lat.sin();
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        height = s / lat.cos() - n;
        lat = (p.z / (s * (1.0 - WGS84_E2 * n / (n + height)))).atan();
    }
    Geodetic::new(lon, lat, height)
}

/// East-north-up frame at `origin` as an ECEF matrix (column-major: east,
/// north, up, origin). The standard root transform for a geodetic tileset:
/// local +Z is geodetic up.
pub fn enu_to_ecef(origin: &Geodetic) -> DMat4 {
    DMat4::from_cols(
        origin.east().extend(0.0),
        origin.north().extend(0.0),
        origin.up().extend(0.0),
        origin.to_ecef().extend(1.0),
    )
}
