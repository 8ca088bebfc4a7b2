//! The regeneration entry points.
//!
//! The UI/render layer owns its own dirty flag; when parameters change it
//! simply calls [`regenerate`] (or [`regenerate_chunk`]) with a fresh
//! immutable config and swaps the returned arrays into its GPU buffers.
//! The core holds no state between calls: the noise grid is built, used
//! and dropped inside one invocation, and the generator is reseeded from
//! the config so identical inputs give byte-identical outputs.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::chunk::{ChunkMesh, ChunkMeshBuilder, NormalMode};
use crate::config::{ChunkConfig, ConfigError, DisplaceParams, NoiseParams};
use crate::displace::{displace, DisplacedMesh};
use crate::lattice::build_height_grid;

/// Feature switches for one regeneration pass. One parameterized pipeline
/// replaces parallel program variants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineFlags {
    /// Scatter vegetation markers while colorizing.
    pub vegetation: bool,
    /// Normal construction for chunk meshes.
    pub normal_mode: NormalMode,
}

impl Default for PipelineFlags {
    fn default() -> Self {
        Self {
            vegetation: true,
            normal_mode: NormalMode::Smooth,
        }
    }
}

/// Full configuration for the mesh-displacement path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TerrainConfig {
    pub noise: NoiseParams,
    pub displace: DisplaceParams,
    pub flags: PipelineFlags,
}

/// Regenerate displaced terrain for a base mesh.
///
/// Synchronous and single-threaded: runs to completion on the calling
/// thread, which is acceptable because regeneration is user-driven, not
/// per-frame. The height grid is discarded on return; nothing is cached
/// across regenerations.
pub fn regenerate(config: &TerrainConfig, base_mesh: &[Vec3]) -> Result<DisplacedMesh, ConfigError> {
    config.noise.validate()?;

    let mut rng = StdRng::seed_from_u64(config.noise.seed);
    let grid = build_height_grid(&config.noise, &mut rng);

    Ok(displace(base_mesh, &grid, &config.noise, &config.displace))
}

/// Regenerate one map chunk at the given offsets.
pub fn regenerate_chunk(
    config: &ChunkConfig,
    flags: &PipelineFlags,
    x_offset: i32,
    y_offset: i32,
) -> Result<ChunkMesh, ConfigError> {
    config.validate()?;

    let builder = ChunkMeshBuilder::new(config.clone());
    Ok(builder.build(x_offset, y_offset, flags.vegetation, flags.normal_mode))
}

/// Regenerate a whole grid of chunks, row-major. Convenience wrapper for
/// callers that rebuild the full map on a parameter change.
pub fn regenerate_map(
    config: &ChunkConfig,
    flags: &PipelineFlags,
    chunks_x: i32,
    chunks_y: i32,
) -> Result<Vec<ChunkMesh>, ConfigError> {
    config.validate()?;

    let builder = ChunkMeshBuilder::new(config.clone());
    let mut chunks = Vec::with_capacity((chunks_x * chunks_y).max(0) as usize);
    for y in 0..chunks_y {
        for x in 0..chunks_x {
            chunks.push(builder.build(x, y, flags.vegetation, flags.normal_mode));
        }
    }
    Ok(chunks)
}
