//! Model abstraction over clampable 3D-tile assets

use std::sync::atomic::{AtomicU64, Ordering};

use glam::{DMat4, DVec3};
use tokio::sync::watch;

use crate::bounds::{BoundingVolume, Sphere};
use crate::tileset::Tileset;

/// Identity of a model within a clamp session table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelId(pub u64);

/// A loaded 3D-tile asset that can be clamped to terrain.
///
/// Bounding data is reported in model-local coordinates; the clamp pipeline
/// transforms it by the model's placement. Transform fields are split into
/// the root input (what a host treats as fixed) and the derived placement
/// output (what a host recomputes every frame): a write that only touches
/// the derived field is overwritten on the next recompute, so writes go to
/// the root field whenever one exists.
#[allow(async_fn_in_trait)]
pub trait ClampableModel {
    fn id(&self) -> ModelId;

    /// Root-node bounding volume, when the asset carries one
    fn root_bounding_volume(&self) -> Option<BoundingVolume>;

    /// The root node's own bounding sphere. Tighter than the whole-asset
    /// sphere, which encloses every tile rather than the visible root
    /// footprint.
    fn root_sphere(&self) -> Option<Sphere>;

    /// Whole-asset bounding sphere; always present once loaded
    fn asset_sphere(&self) -> Sphere;

    /// Root-level transform field, the input a host composes from. Absent
    /// for models that only expose a computed placement.
    fn root_transform(&self) -> Option<DMat4>;
    fn set_root_transform(&mut self, transform: DMat4);

    /// Derived placement transform (recomputed by hosts each frame)
    fn placement_transform(&self) -> DMat4;
    fn set_placement_transform(&mut self, transform: DMat4);

    /// Resolves once the model's initial content has been fetched. May
    /// never resolve in edge cases; callers bound the wait with a timeout.
    async fn ready(&self);
}

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);

/// A clampable model backed by a parsed tileset
#[derive(Debug)]
pub struct TilesetModel {
    id: ModelId,
    tileset: Tileset,
    root_transform: DMat4,
    placement: DMat4,
    loaded_tx: watch::Sender<bool>,
}

impl TilesetModel {
    pub fn new(tileset: Tileset) -> Self {
        let root_transform = tileset.root().transform_matrix();
        let (loaded_tx, _) = watch::channel(false);
        Self {
            id: ModelId(NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed)),
            tileset,
            root_transform,
            placement: root_transform,
            loaded_tx,
        }
    }

    /// Signal that initial tile content has been fetched
    pub fn mark_loaded(&self) {
        self.loaded_tx.send_replace(true);
    }

    pub fn tileset(&self) -> &Tileset {
        &self.tileset
    }
}

impl ClampableModel for TilesetModel {
    fn id(&self) -> ModelId {
        self.id
    }

    fn root_bounding_volume(&self) -> Option<BoundingVolume> {
        Some(self.tileset.root().bounding_volume.clone())
    }

    fn root_sphere(&self) -> Option<Sphere> {
        // The root's own sphere: its declared sphere volume, or the sphere
        // on its content when the tile volume is a box/region
        match &self.tileset.root().bounding_volume {
            BoundingVolume::Sphere(s) => s.parse(),
            _ => self
                .tileset
                .root()
                .content
                .as_ref()
                .and_then(|c| c.bounding_volume.as_ref())
                .and_then(|v| match v {
                    BoundingVolume::Sphere(s) => s.parse(),
                    _ => None,
                }),
        }
    }

    fn asset_sphere(&self) -> Sphere {
        self.tileset
            .root()
            .bounding_volume
            .enclosing_sphere()
            .unwrap_or(Sphere {
                center: DVec3::ZERO,
                radius: 1.0,
            })
    }

    fn root_transform(&self) -> Option<DMat4> {
        Some(self.root_transform)
    }

    fn set_root_transform(&mut self, transform: DMat4) {
        self.root_transform = transform;
        // A host re-derives the placement from the root input
        self.placement = transform;
    }

    fn placement_transform(&self) -> DMat4 {
        self.placement
    }

    fn set_placement_transform(&mut self, transform: DMat4) {
        self.placement = transform;
    }

    async fn ready(&self) {
        let mut rx = self.loaded_tx.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}
