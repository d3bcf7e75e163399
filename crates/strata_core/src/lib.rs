//! Strata Core - Owned scene context for the tile renderer.
//!
//! This crate provides:
//!
//! - **Colors**: linear RGB `Color` and sRGB gamma conversion
//! - **Textures**: gamma-encoded pixel storage with bilinear fetches
//! - **Materials**: the closed set of surface kinds and their parameters
//! - **Scene context**: vertices, texture coordinates, polygons, meshes,
//!   materials and textures addressed by stable handles
//!
//! # Example
//!
//! ```
//! use strata_core::{Color, Material, MaterialKind, SceneContext};
//!
//! let mut scene = SceneContext::new();
//! let id = scene.add_material(
//!     Material::new("chrome", Color::new(0.9, 0.9, 0.9), 1.0).with_kind(MaterialKind::Metal),
//! );
//! assert_eq!(scene.material_for_name("chrome"), Some(id));
//! ```

pub mod color;
pub mod material;
pub mod scene;
pub mod texture;

// Re-export commonly used types
pub use color::{from_srgb, linear_to_srgb, srgb_to_linear, to_srgb, Color};
pub use material::{Material, MaterialKind};
pub use scene::{MaterialId, Mesh, MeshId, Polygon, PolygonId, SceneContext, TextureId};
pub use texture::{Texture, TextureError, TextureResult};
