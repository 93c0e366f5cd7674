//! Terrain clamping: the tier ladder, per-model sessions, and transform
//! application.
//!
//! A clamp measures the model's base under its original (pre-clamp)
//! placement, fits one vertical offset against the terrain, and writes the
//! adjusted transform back. Bounding-data quality degrades across three
//! tiers; the first tier that yields enough data wins.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use glam::{DMat4, DVec3};
use log::{debug, warn};
use tokio::time::timeout;

use crate::bounds::BoundingVolume;
use crate::error::{ClampError, TierError};
use crate::fit::fit_offset;
use crate::footprint::Footprint;
use crate::model::{ClampableModel, ModelId};
use crate::terrain::{sample_footprint, sample_under, TerrainProvider};

/// Which tier of bounding-data quality produced a clamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fidelity {
    /// Oriented box or region bounding volume, 4-corner footprint
    Precise,
    /// Root-node bounding sphere, synthesized footprint
    Approximate,
    /// Whole-asset bounding sphere, single center sample. Known to be
    /// inaccurate for assets composed of multiple spatially separated
    /// sub-models.
    Fallback,
}

/// Whether the model signalled readiness before clamping proceeded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loaded,
    /// The readiness signal did not fire within the configured bound; the
    /// clamp proceeded with best-effort (possibly stale) bounding data
    TimedOut,
}

/// Outcome of a successful clamp
#[derive(Debug, Clone, Copy)]
pub struct ClampReport {
    /// Applied vertical offset in meters; positive is up
    pub offset: f64,
    /// Diagnostic base-plane normal; absent for the single-sample fallback
    /// tier
    pub normal: Option<DVec3>,
    pub fidelity: Fidelity,
    pub load_state: LoadState,
}

/// Clamp configuration
#[derive(Debug, Clone)]
pub struct ClampConfig {
    /// Bound on the wait for the model's readiness signal
    pub load_timeout: Duration,
}

impl Default for ClampConfig {
    fn default() -> Self {
        Self {
            load_timeout: Duration::from_secs(5),
        }
    }
}

impl ClampConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the readiness wait bound
    pub fn with_load_timeout(mut self, load_timeout: Duration) -> Self {
        self.load_timeout = load_timeout;
        self
    }
}

/// Per-model clamp bookkeeping, looked up by model identity
#[derive(Debug, Default)]
struct ClampSession {
    in_progress: Arc<AtomicBool>,
    /// Placement captured before any clamp touched the model. Measurements
    /// and writes both derive from this, so repeated clamps never compound.
    original: Option<DMat4>,
    last: Option<(Fidelity, f64)>,
}

/// Clears the in-progress flag when a clamp finishes, errors out, or is
/// dropped mid-flight.
struct InProgressGuard(Arc<AtomicBool>);

impl Drop for InProgressGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Orchestrates terrain clamping over a set of models
#[derive(Debug, Default)]
pub struct Clamper {
    config: ClampConfig,
    sessions: HashMap<ModelId, ClampSession>,
}

impl Clamper {
    pub fn new(config: ClampConfig) -> Self {
        Self {
            config,
            sessions: HashMap::new(),
        }
    }

    /// Last applied offset and fidelity for a model, if it has been clamped
    pub fn last_applied(&self, id: ModelId) -> Option<(Fidelity, f64)> {
        self.sessions.get(&id).and_then(|s| s.last)
    }

    /// Clamp `model` so its base sits `clearance` meters above the terrain.
    ///
    /// Safe to call before the model has finished loading (the wait for
    /// readiness is bounded) and safe to call repeatedly: every clamp
    /// re-derives from the placement the model had before its first clamp.
    /// A model that cannot be clamped keeps its as-loaded placement and is
    /// reported via `ClampError`; this boundary never panics.
    pub async fn clamp<M, T>(
        &mut self,
        model: &mut M,
        terrain: &T,
        clearance: f64,
    ) -> Result<ClampReport, ClampError>
    where
        M: ClampableModel,
        T: TerrainProvider,
    {
        let id = model.id();
        let (flag, base) = {
            let session = self.sessions.entry(id).or_default();
            if session.in_progress.swap(true, Ordering::AcqRel) {
                return Err(ClampError::InProgress);
            }
            let base = *session.original.get_or_insert_with(|| {
                model
                    .root_transform()
                    .unwrap_or_else(|| model.placement_transform())
            });
            (session.in_progress.clone(), base)
        };
        let _guard = InProgressGuard(flag);

        let load_state = match timeout(self.config.load_timeout, model.ready()).await {
            Ok(()) => LoadState::Loaded,
            Err(_) => {
                warn!(
                    "model {:?} readiness timed out after {:?}; clamping with best-effort bounding data",
                    id, self.config.load_timeout
                );
                LoadState::TimedOut
            }
        };

        match run_ladder(model, terrain, &base, clearance).await {
            Ok((offset, normal, fidelity)) => {
                apply_offset(model, &base, offset);
                if let Some(session) = self.sessions.get_mut(&id) {
                    session.last = Some((fidelity, offset));
                }
                Ok(ClampReport {
                    offset,
                    normal,
                    fidelity,
                    load_state,
                })
            }
            Err(tier_err) => {
                warn!("clamp failed for model {:?}: {}", id, tier_err);
                Err(ClampError::Exhausted(tier_err))
            }
        }
    }
}

const LADDER: [Fidelity; 3] = [Fidelity::Precise, Fidelity::Approximate, Fidelity::Fallback];

/// Try each tier in order of decreasing accuracy; the first that yields a
/// fit wins. Tier-internal failures descend, never propagate.
async fn run_ladder<M, T>(
    model: &M,
    terrain: &T,
    base: &DMat4,
    clearance: f64,
) -> Result<(f64, Option<DVec3>, Fidelity), TierError>
where
    M: ClampableModel,
    T: TerrainProvider,
{
    let mut last = TierError::MissingBoundingData;
    for tier in LADDER {
        match run_tier(tier, model, terrain, base, clearance).await {
            Ok((offset, normal)) => {
                match tier {
                    Fidelity::Precise => {
                        debug!("clamped from precise bounding data: offset {:.3} m", offset)
                    }
                    Fidelity::Approximate => warn!(
                        "clamped from root bounding sphere (approximate): offset {:.3} m",
                        offset
                    ),
                    Fidelity::Fallback => warn!(
                        "clamped from whole-asset bounding sphere: offset {:.3} m; \
                         base height may be far off for multi-part assets",
                        offset
                    ),
                }
                return Ok((offset, normal, tier));
            }
            Err(e) => {
                warn!("{:?} clamp tier failed: {}", tier, e);
                last = e;
            }
        }
    }
    Err(last)
}

async fn run_tier<M, T>(
    tier: Fidelity,
    model: &M,
    terrain: &T,
    base: &DMat4,
    clearance: f64,
) -> Result<(f64, Option<DVec3>), TierError>
where
    M: ClampableModel,
    T: TerrainProvider,
{
    match tier {
        Fidelity::Precise => {
            let footprint = precise_footprint(model, base)?;
            let samples = sample_footprint(terrain, &footprint).await;
            let fitted = fit_offset(&footprint, &samples, clearance)?;
            Ok((fitted.offset, Some(fitted.normal)))
        }
        Fidelity::Approximate => {
            let sphere = model
                .root_sphere()
                .ok_or(TierError::MissingBoundingData)?
                .transform(base);
            let footprint = Footprint::from_sphere(&sphere);
            let samples = sample_footprint(terrain, &footprint).await;
            let fitted = fit_offset(&footprint, &samples, clearance)?;
            Ok((fitted.offset, Some(fitted.normal)))
        }
        Fidelity::Fallback => {
            // A sphere's single center point is the best this tier can do
            let sphere = model.asset_sphere().transform(base);
            let sample = sample_under(terrain, sphere.center).await;
            match sample.terrain {
                Some(terrain_height) => {
                    Ok((terrain_height - sample.corner.height + clearance, None))
                }
                None => Err(TierError::InsufficientSamples {
                    required: 1,
                    valid: 0,
                }),
            }
        }
    }
}

/// World-space 4-corner footprint from an oriented box or region root
/// bounding volume. Spheres are not precise; they belong to the later tiers.
fn precise_footprint<M: ClampableModel>(model: &M, base: &DMat4) -> Result<Footprint, TierError> {
    let volume = model
        .root_bounding_volume()
        .ok_or(TierError::MissingBoundingData)?;
    match &volume {
        BoundingVolume::Box(b) => {
            let oriented = b.parse().ok_or(TierError::MissingBoundingData)?;
            Ok(Footprint::from_box(&oriented.transform(base)))
        }
        BoundingVolume::Region(r) => {
            // Regions are absolute geodetic (EPSG:4979); tile transforms do
            // not apply to them
            let bounds = r.parse().ok_or(TierError::MissingBoundingData)?;
            Ok(Footprint::from_region(&bounds))
        }
        BoundingVolume::Sphere(_) => Err(TierError::MissingBoundingData),
    }
}

/// Write `base x translation(0, 0, offset)` to the transform field the host
/// treats as input.
///
/// Hosts recompute the placement output from the root field every frame, so
/// a write that only touches the placement is overwritten on the next
/// recompute; the placement field is used only when no root field exists.
/// The local +Z translation assumes the geodetic-tileset convention of an
/// east-north-up root frame.
fn apply_offset<M: ClampableModel>(model: &mut M, base: &DMat4, offset: f64) {
    let adjusted = *base * DMat4::from_translation(DVec3::new(0.0, 0.0, offset));
    if model.root_transform().is_some() {
        model.set_root_transform(adjusted);
    } else {
        model.set_placement_transform(adjusted);
    }
}
