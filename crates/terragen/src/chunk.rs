//! Self-contained chunk mesh construction.
//!
//! Unlike the displacement path, a chunk needs no external base mesh: it
//! builds a regular vertex grid, an explicit triangle index buffer, heights
//! from a normalized fractal noise map, per-vertex normals, and biome
//! colors. World offsets are scaled by `(size - 1)` so adjacent chunks
//! sample the same noise along shared edges and stay seamless.

use glam::Vec3;
use noise::{NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::biome::{BiomeColorizer, Plant};
use crate::config::ChunkConfig;

/// How per-vertex normals are produced for a chunk mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalMode {
    /// Accumulate each face normal into its shared vertices, then
    /// renormalize: smooth shading.
    #[default]
    Smooth,
    /// Duplicate vertices so every triangle owns its flat normal; the
    /// index buffer becomes a trivial sequence.
    Faceted,
}

/// GPU-ready arrays for one terrain chunk, all positionally aligned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkMesh {
    pub indices: Vec<u32>,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 3]>,
    /// Vegetation markers spawned while colorizing, handed off once to
    /// the external instancing step.
    pub plants: Vec<Plant>,
}

impl ChunkMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }
}

/// Builds chunk meshes for one fixed configuration. The gradient noise
/// source is seeded once from the config so every chunk of a map samples
/// the same continuous field.
pub struct ChunkMeshBuilder {
    config: ChunkConfig,
    colorizer: BiomeColorizer,
    perlin: Perlin,
}

impl ChunkMeshBuilder {
    pub fn new(config: ChunkConfig) -> Self {
        let colorizer = BiomeColorizer::classic(config.water_height);
        let perlin = Perlin::new(config.seed as u32);
        Self {
            config,
            colorizer,
            perlin,
        }
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Index buffer connecting each interior cell into two triangles.
    /// Cells cannot originate on the final row or column (there is no
    /// "next" vertex), so the buffer holds `(w-1) * (h-1) * 6` entries.
    pub fn generate_indices(&self) -> Vec<u32> {
        let (w, h) = (self.config.width, self.config.height);
        let mut indices = Vec::with_capacity((w - 1) * (h - 1) * 6);

        for y in 0..h {
            for x in 0..w {
                if x == w - 1 || y == h - 1 {
                    continue;
                }
                let pos = (x + y * w) as u32;
                let w = w as u32;
                // Top-left triangle of the cell.
                indices.push(pos + w);
                indices.push(pos);
                indices.push(pos + w + 1);
                // Bottom-right triangle of the cell.
                indices.push(pos + 1);
                indices.push(pos + 1 + w);
                indices.push(pos);
            }
        }

        indices
    }

    /// Normalized fractal noise for one chunk, row-major over the vertex
    /// grid. Octave sums are inverse-lerped by the maximum possible
    /// amplitude so downstream easing works on a known range.
    pub fn generate_noise_map(&self, x_offset: i32, y_offset: i32) -> Vec<f32> {
        let (w, h) = (self.config.width, self.config.height);
        let max_amplitude = self.config.max_amplitude();
        let mut values = Vec::with_capacity(w * h);

        for y in 0..h {
            for x in 0..w {
                let mut amp = 1.0_f32;
                let mut freq = 1.0_f32;
                let mut noise_height = 0.0_f32;

                for _ in 0..self.config.octaves {
                    // Offsets are scaled by (size - 1), not size, so the
                    // last column of one chunk and the first of the next
                    // sample identical coordinates.
                    let xs = (x as f32 + x_offset as f32 * (w - 1) as f32)
                        / self.config.noise_scale
                        * freq;
                    let ys = (y as f32 + y_offset as f32 * (h - 1) as f32)
                        / self.config.noise_scale
                        * freq;

                    let sample = self.perlin.get([xs as f64, ys as f64]) as f32;
                    noise_height += sample * amp;

                    amp *= self.config.persistence;
                    freq *= self.config.lacunarity;
                }

                values.push((noise_height + 1.0) / max_amplitude);
            }
        }

        values
    }

    /// Chunk-local vertex positions: x/z from the grid, y cubic-eased
    /// from the noise map and floored at half the water height so no
    /// terrain pokes through the water plane's underside.
    pub fn generate_vertices(&self, noise_map: &[f32]) -> Vec<[f32; 3]> {
        let (w, h) = (self.config.width, self.config.height);
        let floor = self.config.water_height * 0.5 * self.config.mesh_height;
        let mut positions = Vec::with_capacity(w * h);

        for y in 0..h {
            for x in 0..w {
                let eased = (noise_map[x + y * w] * 1.1).powi(3);
                let height = (eased * self.config.mesh_height).max(floor);
                positions.push([x as f32, height, y as f32]);
            }
        }

        positions
    }

    /// Build the full chunk: indices, displaced vertices, normals, biome
    /// colors, and vegetation markers.
    pub fn build(
        &self,
        x_offset: i32,
        y_offset: i32,
        vegetation: bool,
        normal_mode: NormalMode,
    ) -> ChunkMesh {
        let indices = self.generate_indices();
        let noise_map = self.generate_noise_map(x_offset, y_offset);
        let positions = self.generate_vertices(&noise_map);
        let normals = smooth_normals(&indices, &positions);

        let mut rng = StdRng::seed_from_u64(chunk_seed(self.config.seed, x_offset, y_offset));
        let (colors, plants) = self.colorizer.colorize(
            &positions,
            self.config.mesh_height,
            (x_offset, y_offset),
            vegetation,
            &mut rng,
        );

        let mesh = ChunkMesh {
            indices,
            positions,
            normals,
            colors,
            plants,
        };

        match normal_mode {
            NormalMode::Smooth => mesh,
            NormalMode::Faceted => facet(mesh),
        }
    }
}

/// Derive the per-chunk scatter seed from the map seed and chunk offsets,
/// so plant placement is stable per chunk regardless of build order.
fn chunk_seed(seed: u64, x_offset: i32, y_offset: i32) -> u64 {
    seed.wrapping_add((x_offset as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15))
        .wrapping_add((y_offset as u64).wrapping_mul(0x6c07_8965))
}

/// Accumulate each face normal into its three vertices and renormalize,
/// giving smooth shading across shared vertices.
fn smooth_normals(indices: &[u32], positions: &[[f32; 3]]) -> Vec<[f32; 3]> {
    let mut accumulated = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let v0 = Vec3::from(positions[tri[0] as usize]);
        let v1 = Vec3::from(positions[tri[1] as usize]);
        let v2 = Vec3::from(positions[tri[2] as usize]);

        let n = (v2 - v0).cross(v1 - v0).normalize_or(Vec3::Y);
        for &i in tri {
            accumulated[i as usize] += n;
        }
    }

    accumulated
        .into_iter()
        .map(|n| n.normalize_or(Vec3::Y).to_array())
        .collect()
}

/// Re-expand the mesh so each triangle owns duplicated vertices and one
/// flat normal; avoids index-buffer sharing with inconsistent normals.
fn facet(mesh: ChunkMesh) -> ChunkMesh {
    let triangle_count = mesh.indices.len() / 3;
    let mut positions = Vec::with_capacity(triangle_count * 3);
    let mut normals = Vec::with_capacity(triangle_count * 3);
    let mut colors = Vec::with_capacity(triangle_count * 3);

    for tri in mesh.indices.chunks_exact(3) {
        let v0 = Vec3::from(mesh.positions[tri[0] as usize]);
        let v1 = Vec3::from(mesh.positions[tri[1] as usize]);
        let v2 = Vec3::from(mesh.positions[tri[2] as usize]);
        let n = (v2 - v0).cross(v1 - v0).normalize_or(Vec3::Y).to_array();

        for &i in tri {
            positions.push(mesh.positions[i as usize]);
            normals.push(n);
            colors.push(mesh.colors[i as usize]);
        }
    }

    ChunkMesh {
        indices: (0..(triangle_count * 3) as u32).collect(),
        positions,
        normals,
        colors,
        plants: mesh.plants,
    }
}
