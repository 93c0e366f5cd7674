//! Offset fitting from footprint corner samples

use glam::DVec3;

use crate::error::TierError;
use crate::footprint::Footprint;
use crate::geodetic::ecef_to_geodetic;
use crate::terrain::HeightSample;

/// A fitted vertical adjustment
#[derive(Debug, Clone, Copy)]
pub struct FittedOffset {
    /// Scalar vertical offset in meters; positive moves the model up
    pub offset: f64,
    /// Base-plane normal from the footprint edges, kept for diagnostics and
    /// future tilt correction. Not applied to the model.
    pub normal: DVec3,
}

/// Fit a single vertical offset from four corner samples.
///
/// Strict: every corner must have a terrain height. Averaging a partial set
/// would hide a sampling gap behind a silently wrong placement, so a single
/// absent sample rejects the whole fit and lets the ladder descend.
pub fn fit_offset(
    footprint: &Footprint,
    samples: &[HeightSample; 4],
    clearance: f64,
) -> Result<FittedOffset, TierError> {
    let mut sum = 0.0;
    let mut valid = 0;
    for sample in samples {
        if let Some(terrain) = sample.terrain {
            sum += terrain - sample.corner.height;
            valid += 1;
        }
    }

    if valid < samples.len() {
        return Err(TierError::InsufficientSamples {
            required: samples.len(),
            valid,
        });
    }

    Ok(FittedOffset {
        offset: sum / samples.len() as f64 + clearance,
        normal: base_plane_normal(footprint),
    })
}

/// Normal of the footprint base plane from two edge vectors, oriented along
/// geodetic up. Zero for a degenerate footprint.
fn base_plane_normal(footprint: &Footprint) -> DVec3 {
    let e0 = footprint.corners[1] - footprint.corners[0];
    let e1 = footprint.corners[3] - footprint.corners[0];
    let normal = e0.cross(e1).normalize_or_zero();
    let up = ecef_to_geodetic(footprint.centroid()).up();
    if normal.dot(up) < 0.0 {
        -normal
    } else {
        normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::OrientedBox;
    use crate::geodetic::Geodetic;

    fn square_footprint_at(height: f64) -> Footprint {
        let origin = Geodetic::from_degrees(0.0, 0.0, 0.0);
        let frame = crate::geodetic::enu_to_ecef(&origin);
        let b = OrientedBox {
            center: DVec3::new(0.0, 0.0, height + 10.0),
            half_x: DVec3::new(20.0, 0.0, 0.0),
            half_y: DVec3::new(0.0, 20.0, 0.0),
            half_z: DVec3::new(0.0, 0.0, 10.0),
        }
        .transform(&frame);
        Footprint::from_box(&b)
    }

    fn samples_for(footprint: &Footprint, terrain: [Option<f64>; 4]) -> [HeightSample; 4] {
        let mut out = [HeightSample {
            corner: Geodetic::new(0.0, 0.0, 0.0),
            terrain: None,
        }; 4];
        for i in 0..4 {
            out[i] = HeightSample {
                corner: ecef_to_geodetic(footprint.corners[i]),
                terrain: terrain[i],
            };
        }
        out
    }

    #[test]
    fn test_offset_from_uniform_samples() {
        // Corners at model height 100, terrain at 80, clearance 10:
        // offset = 80 - 100 + 10 = -10
        let footprint = square_footprint_at(100.0);
        let samples = samples_for(&footprint, [Some(80.0); 4]);
        let fitted = fit_offset(&footprint, &samples, 10.0).unwrap();
        assert!((fitted.offset - -10.0).abs() < 1e-3);
    }

    #[test]
    fn test_single_absent_sample_rejects_fit() {
        let footprint = square_footprint_at(100.0);
        let samples = samples_for(&footprint, [Some(80.0), Some(80.0), None, Some(80.0)]);
        match fit_offset(&footprint, &samples, 10.0) {
            Err(TierError::InsufficientSamples { required: 4, valid: 3 }) => {}
            other => panic!("expected InsufficientSamples, got {:?}", other),
        }
    }

    #[test]
    fn test_normal_points_up() {
        let footprint = square_footprint_at(0.0);
        let samples = samples_for(&footprint, [Some(0.0); 4]);
        let fitted = fit_offset(&footprint, &samples, 0.0).unwrap();
        let up = ecef_to_geodetic(footprint.centroid()).up();
        assert!(fitted.normal.dot(up) > 0.99);
    }

    #[test]
    fn test_sloped_terrain_averages() {
        let footprint = square_footprint_at(0.0);
        let samples = samples_for(
            &footprint,
            [Some(10.0), Some(20.0), Some(30.0), Some(40.0)],
        );
        let fitted = fit_offset(&footprint, &samples, 0.0).unwrap();
        assert!((fitted.offset - 25.0).abs() < 1e-3);
    }
}
