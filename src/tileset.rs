//! Tileset parsing for 3D Tiles

use std::path::{Path, PathBuf};

use glam::DMat4;
use serde::{Deserialize, Serialize};

use crate::bounds::BoundingVolume;
use crate::error::TilesetResult;

/// Asset metadata for the tileset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TilesetAsset {
    /// 3D Tiles version
    pub version: String,
    /// Application-specific version
    #[serde(rename = "tilesetVersion")]
    pub tileset_version: Option<String>,
}

/// Content description for a tile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileContent {
    /// URI to the tile content (b3dm, glb, etc.)
    pub uri: String,
    /// Optional bounding volume for the content (tighter than tile bounds)
    #[serde(rename = "boundingVolume")]
    pub bounding_volume: Option<BoundingVolume>,
}

/// A single tile in the 3D Tiles hierarchy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    /// Bounding volume enclosing the tile
    #[serde(rename = "boundingVolume")]
    pub bounding_volume: BoundingVolume,
    /// Geometric error in meters
    #[serde(rename = "geometricError")]
    pub geometric_error: f64,
    /// Optional content (tile may be empty, containing only children)
    pub content: Option<TileContent>,
    /// Child tiles
    #[serde(default)]
    pub children: Vec<Tile>,
    /// Optional 4x4 transform matrix (column-major)
    #[serde(default)]
    pub transform: Option<[f64; 16]>,
}

impl Tile {
    /// Column-major transform matrix, identity when absent
    pub fn transform_matrix(&self) -> DMat4 {
        self.transform
            .map(|t| DMat4::from_cols_array(&t))
            .unwrap_or(DMat4::IDENTITY)
    }

    /// Check if this tile has renderable content
    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }

    /// Get the content URI if present
    pub fn content_uri(&self) -> Option<&str> {
        self.content.as_ref().map(|c| c.uri.as_str())
    }

    /// Count total tiles in this subtree
    pub fn count_tiles(&self) -> usize {
        1 + self.children.iter().map(|c| c.count_tiles()).sum::<usize>()
    }
}

/// Root tileset.json structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TilesetJson {
    /// Asset metadata
    pub asset: TilesetAsset,
    /// Geometric error of the tileset
    #[serde(rename = "geometricError")]
    pub geometric_error: f64,
    /// Root tile
    pub root: Tile,
}

/// A loaded 3D Tiles tileset
#[derive(Debug, Clone)]
pub struct Tileset {
    /// Base path for resolving relative URIs
    pub base_path: PathBuf,
    /// Parsed tileset.json
    pub json: TilesetJson,
}

impl Tileset {
    /// Load a tileset from a file path
    pub fn load<P: AsRef<Path>>(path: P) -> TilesetResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let json: TilesetJson = serde_json::from_str(&content)?;

        let base_path = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self { base_path, json })
    }

    /// Load a tileset from a JSON string with a base path
    pub fn from_json(json_str: &str, base_path: PathBuf) -> TilesetResult<Self> {
        let json: TilesetJson = serde_json::from_str(json_str)?;
        Ok(Self { base_path, json })
    }

    /// Get the root tile
    pub fn root(&self) -> &Tile {
        &self.json.root
    }

    /// Get the tileset version
    pub fn version(&self) -> &str {
        &self.json.asset.version
    }
}
