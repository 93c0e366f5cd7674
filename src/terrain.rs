//! Terrain height providers and footprint sampling

use futures::future::join_all;
use glam::DVec3;
use log::warn;

use crate::error::TerrainError;
use crate::footprint::Footprint;
use crate::geodetic::{ecef_to_geodetic, Geodetic};

/// A queryable terrain height field.
///
/// Implementations must not block indefinitely while terrain tiles are still
/// streaming in; `Ok(None)` is the correct answer when no height is
/// available yet.
#[allow(async_fn_in_trait)]
pub trait TerrainProvider {
    /// Ellipsoidal terrain height in meters at a geodetic position, or
    /// `None` where the provider has no coverage
    async fn height_at(&self, lon: f64, lat: f64) -> Result<Option<f64>, TerrainError>;

    /// Drop-a-ray fallback: project an ECEF position onto the terrain
    /// surface, considering terrain only (never the model being clamped,
    /// which would self-intersect). Providers without ray support keep the
    /// default.
    async fn clamp_to_surface(&self, _position: DVec3) -> Result<Option<DVec3>, TerrainError> {
        Ok(None)
    }
}

/// One footprint corner paired with the terrain height under it, if any
#[derive(Debug, Clone, Copy)]
pub struct HeightSample {
    /// Geodetic position of the corner; its `height` is the model's base
    /// height at this corner
    pub corner: Geodetic,
    /// Terrain height at the corner; absent when the query failed or the
    /// position is outside coverage
    pub terrain: Option<f64>,
}

/// Sample the terrain under a single ECEF position.
///
/// Prefers the direct geodetic height query and falls back to the
/// clamp-to-surface ray. Every provider failure converts to an absent
/// sample; nothing propagates past this point.
pub async fn sample_under<T: TerrainProvider>(provider: &T, position: DVec3) -> HeightSample {
    let corner = ecef_to_geodetic(position);

    let direct = match provider.height_at(corner.lon, corner.lat).await {
        Ok(height) => height,
        Err(e) => {
            warn!(
                "terrain height query failed at lon={:.6} lat={:.6}: {}",
                corner.lon.to_degrees(),
                corner.lat.to_degrees(),
                e
            );
            None
        }
    };

    let terrain = match direct {
        Some(height) => Some(height),
        None => match provider.clamp_to_surface(position).await {
            Ok(hit) => hit.map(|p| ecef_to_geodetic(p).height),
            Err(e) => {
                warn!(
                    "clamp-to-surface query failed at lon={:.6} lat={:.6}: {}",
                    corner.lon.to_degrees(),
                    corner.lat.to_degrees(),
                    e
                );
                None
            }
        },
    };

    HeightSample { corner, terrain }
}

/// Sample all four footprint corners concurrently.
///
/// The corner queries are independent reads; no ordering between them, and
/// failure of one does not abort the others.
pub async fn sample_footprint<T: TerrainProvider>(
    provider: &T,
    footprint: &Footprint,
) -> [HeightSample; 4] {
    let samples = join_all(
        footprint
            .corners
            .iter()
            .map(|&corner| sample_under(provider, corner)),
    )
    .await;
    [samples[0], samples[1], samples[2], samples[3]]
}

/// Rectangular geodetic height grid with bilinear sampling.
///
/// Row-major, row 0 along the southern edge. Positions outside the covered
/// rectangle sample as absent rather than clamping to the edge.
#[derive(Debug, Clone)]
pub struct HeightGrid {
    west: f64,
    south: f64,
    east: f64,
    north: f64,
    width: usize,
    height: usize,
    heights: Vec<f32>,
}

impl HeightGrid {
    /// Build a grid covering `[west, east] x [south, north]` (radians).
    /// `heights` is row-major with `width * height` entries; width and
    /// height >= 2 enforced by caller.
    pub fn new(
        west: f64,
        south: f64,
        east: f64,
        north: f64,
        width: usize,
        height: usize,
        heights: Vec<f32>,
    ) -> Self {
        assert!(width >= 2 && height >= 2, "width, height must be >= 2");
        assert!(west < east && south < north, "extent must be non-empty");
        assert_eq!(heights.len(), width * height, "heights length mismatch");
        Self {
            west,
            south,
            east,
            north,
            width,
            height,
            heights,
        }
    }

    /// Flat grid at a constant height over the given extent
    pub fn flat(west: f64, south: f64, east: f64, north: f64, height_m: f64) -> Self {
        Self::new(west, south, east, north, 2, 2, vec![height_m as f32; 4])
    }

    /// Bilinearly interpolated height, `None` outside the covered extent
    pub fn sample(&self, lon: f64, lat: f64) -> Option<f64> {
        if lon < self.west || lon > self.east || lat < self.south || lat > self.north {
            return None;
        }

        let u = (lon - self.west) / (self.east - self.west);
        let v = (lat - self.south) / (self.north - self.south);
        let x = u * (self.width - 1) as f64;
        let y = v * (self.height - 1) as f64;

        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let fx = x - x0 as f64;
        let fy = y - y0 as f64;

        let h00 = self.heights[y0 * self.width + x0] as f64;
        let h10 = self.heights[y0 * self.width + x1] as f64;
        let h01 = self.heights[y1 * self.width + x0] as f64;
        let h11 = self.heights[y1 * self.width + x1] as f64;

        let h0 = h00 * (1.0 - fx) + h10 * fx;
        let h1 = h01 * (1.0 - fx) + h11 * fx;
        Some(h0 * (1.0 - fy) + h1 * fy)
    }
}

impl TerrainProvider for HeightGrid {
    async fn height_at(&self, lon: f64, lat: f64) -> Result<Option<f64>, TerrainError> {
        Ok(self.sample(lon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Sphere;

    struct FailingTerrain;

    impl TerrainProvider for FailingTerrain {
        async fn height_at(&self, _lon: f64, _lat: f64) -> Result<Option<f64>, TerrainError> {
            Err(TerrainError::new("provider offline"))
        }
    }

    struct RayOnlyTerrain {
        surface_height: f64,
    }

    impl TerrainProvider for RayOnlyTerrain {
        async fn height_at(&self, _lon: f64, _lat: f64) -> Result<Option<f64>, TerrainError> {
            Ok(None)
        }

        async fn clamp_to_surface(
            &self,
            position: DVec3,
        ) -> Result<Option<DVec3>, TerrainError> {
            let mut g = ecef_to_geodetic(position);
            g.height = self.surface_height;
            Ok(Some(g.to_ecef()))
        }
    }

    #[test]
    fn test_bilinear_interpolation() {
        let grid = HeightGrid::new(0.0, 0.0, 1.0, 1.0, 2, 2, vec![0.0, 10.0, 20.0, 30.0]);
        assert!((grid.sample(0.0, 0.0).unwrap() - 0.0).abs() < 1e-9);
        assert!((grid.sample(1.0, 0.0).unwrap() - 10.0).abs() < 1e-9);
        assert!((grid.sample(0.5, 0.5).unwrap() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_coverage_is_absent() {
        let grid = HeightGrid::flat(0.0, 0.0, 1.0, 1.0, 5.0);
        assert!(grid.sample(1.5, 0.5).is_none());
        assert!(grid.sample(0.5, -0.1).is_none());
        assert!(grid.sample(0.5, 0.5).is_some());
    }

    #[tokio::test]
    async fn test_provider_error_becomes_absent_sample() {
        let position = Geodetic::from_degrees(1.0, 1.0, 50.0).to_ecef();
        let sample = sample_under(&FailingTerrain, position).await;
        assert!(sample.terrain.is_none());
        assert!((sample.corner.height - 50.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_ray_fallback_used_when_direct_query_empty() {
        let provider = RayOnlyTerrain {
            surface_height: 77.0,
        };
        let position = Geodetic::from_degrees(2.0, 2.0, 500.0).to_ecef();
        let sample = sample_under(&provider, position).await;
        assert!((sample.terrain.unwrap() - 77.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_footprint_samples_are_independent() {
        // Coverage that misses the western corner only
        let center = Geodetic::from_degrees(0.0, 0.0, 100.0).to_ecef();
        let sphere = Sphere {
            center,
            radius: 500.0,
        };
        let footprint = Footprint::from_sphere(&sphere);
        let grid = HeightGrid::flat(-1e-6, -1.0, 1.0, 1.0, 8.0);

        let samples = sample_footprint(&grid, &footprint).await;
        assert!(samples[0].terrain.is_none());
        assert!(samples[1].terrain.is_some());
        assert!(samples[2].terrain.is_some());
        assert!(samples[3].terrain.is_some());
    }
}
