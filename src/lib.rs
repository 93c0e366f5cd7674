//! Terrain clamping for 3D Tiles building models.
//!
//! Given a loaded tileset model and a terrain height provider, compute one
//! rigid vertical adjustment that places the model's geometric base at a
//! requested clearance above the terrain surface. Alignment uses the best
//! bounding data the asset exposes (oriented box or region, the root node's
//! own sphere, or, with a logged accuracy warning, the whole-asset bounding
//! sphere) and degrades tier by tier instead of failing outright.

pub mod bounds;
pub mod clamp;
pub mod error;
pub mod fit;
pub mod footprint;
pub mod geodetic;
pub mod model;
pub mod terrain;
pub mod tileset;

pub use bounds::{
    BoundingBox, BoundingRegion, BoundingSphere, BoundingVolume, Components, OrientedBox,
    RegionBounds, Sphere,
};
pub use clamp::{ClampConfig, ClampReport, Clamper, Fidelity, LoadState};
pub use error::{ClampError, TerrainError, TierError, TilesetError, TilesetResult};
pub use fit::{fit_offset, FittedOffset};
pub use footprint::Footprint;
pub use geodetic::{ecef_to_geodetic, enu_to_ecef, Geodetic, WGS84_A, WGS84_E2};
pub use model::{ClampableModel, ModelId, TilesetModel};
pub use terrain::{sample_footprint, sample_under, HeightGrid, HeightSample, TerrainProvider};
pub use tileset::{Tile, TileContent, Tileset, TilesetAsset, TilesetJson};
